use serde::{Deserialize, Serialize};

use super::scene::Scene;

/// Module-level summary fields of a storyboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub module_name: String,
    #[serde(default)]
    pub module_type: String,
    /// Targeted seat time in minutes.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Author-set difficulty band, 1 to 4.
    pub module_level: u8,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A generated instructional document: ordered scenes plus module summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storyboard {
    #[serde(flatten)]
    pub summary: ModuleSummary,
    pub scenes: Vec<Scene>,
}

impl Storyboard {
    pub fn new(summary: ModuleSummary, scenes: Vec<Scene>) -> Self {
        Self { summary, scenes }
    }

    /// Look up a scene by its ordinal.
    pub fn scene(&self, scene_number: u32) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.scene_number == scene_number)
    }

    /// True when ordinals run 1, 2, 3, ... in storage order.
    pub fn has_contiguous_ordinals(&self) -> bool {
        self.scenes
            .iter()
            .enumerate()
            .all(|(i, s)| s.scene_number as usize == i + 1)
    }
}
