use serde::{Deserialize, Deserializer, Serialize};

use super::pedagogy::{CognitiveLevel, InstructionalPurpose, LoadTier};

/// Interaction types that mean "no interaction" when a generator fills the
/// field with a placeholder instead of leaving it out.
const PLACEHOLDER_INTERACTIONS: &[&str] = &["", "none", "n/a", "na", "tbd", "-"];

/// Media types a learner perceives visually and which therefore need alt text.
const VISUAL_MEDIA: &[&str] = &[
    "image",
    "video",
    "icon",
    "animation",
    "graphic",
    "illustration",
    "chart",
    "diagram",
    "photo",
    "gif",
];

/// The role a scene plays in the module.
///
/// The `Scenario*` variants are the sub-phases of a branching scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Informative,
    Interactive,
    Assessment,
    ScenarioSetup,
    ScenarioDecision,
    ScenarioConsequence,
    ScenarioDebrief,
}

impl PageType {
    pub const ALL: [PageType; 7] = [
        Self::Informative,
        Self::Interactive,
        Self::Assessment,
        Self::ScenarioSetup,
        Self::ScenarioDecision,
        Self::ScenarioConsequence,
        Self::ScenarioDebrief,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Informative => "informative",
            Self::Interactive => "interactive",
            Self::Assessment => "assessment",
            Self::ScenarioSetup => "scenario_setup",
            Self::ScenarioDecision => "scenario_decision",
            Self::ScenarioConsequence => "scenario_consequence",
            Self::ScenarioDebrief => "scenario_debrief",
        }
    }

    pub fn is_scenario_phase(&self) -> bool {
        matches!(
            self,
            Self::ScenarioSetup
                | Self::ScenarioDecision
                | Self::ScenarioConsequence
                | Self::ScenarioDebrief
        )
    }

    /// Interactive pages and every scenario sub-phase count toward
    /// interaction density.
    pub fn counts_toward_density(&self) -> bool {
        *self == Self::Interactive || self.is_scenario_phase()
    }

    /// Pages that should carry an interactivity archetype.
    pub fn needs_interactivity(&self) -> bool {
        matches!(
            self,
            Self::Interactive | Self::Assessment | Self::ScenarioDecision
        )
    }
}

/// The interaction attached to a scene: a type plus free-form parameters
/// (options, outcomes, branch targets) that this crate does not interpret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl Interaction {
    /// False for empty or placeholder types such as "none" or "TBD".
    pub fn is_present(&self) -> bool {
        let kind = self.kind.trim().to_lowercase();
        !PLACEHOLDER_INTERACTIONS.contains(&kind.as_str())
    }

    /// Type and description, lower-cased, with `_` and `-` folded to spaces
    /// so "drag_and_drop", "Drag-and-Drop" and "drag and drop" all match.
    pub fn search_text(&self) -> String {
        normalize_text(&format!("{} {}", self.kind, self.description))
    }
}

/// Lower-case and fold word separators to single spaces.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub alt_text: String,
}

impl MediaAsset {
    pub fn is_visual(&self) -> bool {
        VISUAL_MEDIA.contains(&self.kind.trim().to_lowercase().as_str())
    }
}

/// Accessibility annotations for a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessibility {
    /// Scene-level alt text. Covers every visual asset lacking its own.
    #[serde(default)]
    pub alt_text: String,
    /// Caption state, e.g. "Captions on by default" or, on a silent page,
    /// "No narration; captions not applicable".
    #[serde(default)]
    pub captions: String,
    /// Keyboard path and focus order, e.g.
    /// "Tab order: Next, Replay. Keyboard: Enter activates, Esc closes."
    #[serde(default)]
    pub keyboard_navigation: String,
}

/// Pedagogical metadata the sequencer needs to pick an interactivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningMeta {
    pub cognitive_level: CognitiveLevel,
    pub instructional_purpose: InstructionalPurpose,
    #[serde(default)]
    pub cognitive_load: Option<LoadTier>,
}

/// One page of a storyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub scene_number: u32,
    pub scene_title: String,
    pub page_type: PageType,
    #[serde(default)]
    pub body_text: String,
    #[serde(default, deserialize_with = "text_or_lines")]
    pub on_screen_text: String,
    /// Narration script.
    #[serde(default)]
    pub voiceover: String,
    #[serde(default)]
    pub interactivity: Option<Interaction>,
    #[serde(default)]
    pub media_assets: Vec<MediaAsset>,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub learning: Option<LearningMeta>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

impl Scene {
    /// A bare scene of the given type; fields are public for everything else.
    pub fn new(scene_number: u32, scene_title: &str, page_type: PageType) -> Self {
        Self {
            scene_number,
            scene_title: scene_title.to_string(),
            page_type,
            body_text: String::new(),
            on_screen_text: String::new(),
            voiceover: String::new(),
            interactivity: None,
            media_assets: Vec::new(),
            accessibility: Accessibility::default(),
            learning: None,
            duration_seconds: None,
        }
    }

    /// The interaction, if one is attached and is not a placeholder.
    pub fn interaction(&self) -> Option<&Interaction> {
        self.interactivity.as_ref().filter(|i| i.is_present())
    }

    /// True when some visual asset has neither its own alt text nor the
    /// scene-level fallback.
    pub fn lacks_alt_text(&self) -> bool {
        if !self.accessibility.alt_text.trim().is_empty() {
            return false;
        }
        self.media_assets
            .iter()
            .any(|asset| asset.is_visual() && asset.alt_text.trim().is_empty())
    }

    pub fn on_screen_word_count(&self) -> usize {
        self.on_screen_text.split_whitespace().count()
    }
}

/// Generators emit on-screen text either as one string or as an array of
/// blocks (heading, body, instructions). Arrays are joined line by line.
fn text_or_lines<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrLines {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match TextOrLines::deserialize(deserializer)? {
        TextOrLines::Text(text) => text,
        TextOrLines::Lines(lines) => lines.join("\n"),
    })
}
