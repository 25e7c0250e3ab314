pub mod pedagogy;
pub mod scene;
pub mod storyboard;
