//! WASM bindings for storyboard-qc — powers the author UI's review panel.

use wasm_bindgen::prelude::*;

use storyboard_qc::core::catalog::catalog;
use storyboard_qc::core::config::PipelineConfig;
use storyboard_qc::core::enforcer::{FailureDiagnostics, NoRegeneration};
use storyboard_qc::core::pipeline::{PipelineError, ReviewedStoryboard, StoryboardReviewer};
use storyboard_qc::core::sequencer::{select_interactivity_for_scene, SceneMeta};
use storyboard_qc::schema::pedagogy::{CognitiveLevel, InstructionalPurpose, LoadTier};

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneMetaInput {
    ordinal: u32,
    cognitive_level: CognitiveLevel,
    instructional_purpose: InstructionalPurpose,
    module_level: u8,
    #[serde(default)]
    preceding_choices: Vec<String>,
    #[serde(default)]
    cognitive_load_hint: Option<LoadTier>,
}

#[derive(serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReviewResponse {
    Reviewed { review: ReviewedStoryboard },
    Rejected { diagnostics: FailureDiagnostics },
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// ReviewDesk — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct ReviewDesk {
    reviewer: StoryboardReviewer,
}

#[wasm_bindgen]
impl ReviewDesk {
    /// Create a desk with the default configuration, or with the given
    /// RON configuration text.
    #[wasm_bindgen(constructor)]
    pub fn new(config_ron: Option<String>) -> Result<ReviewDesk, JsError> {
        let config = match config_ron {
            Some(ref text) => PipelineConfig::parse_ron(text)
                .map_err(|e| JsError::new(&format!("Config error: {e}")))?,
            None => PipelineConfig::default(),
        };
        let reviewer = StoryboardReviewer::builder()
            .with_config(config)
            .build()
            .map_err(|e| JsError::new(&format!("Reviewer build error: {e}")))?;
        Ok(ReviewDesk { reviewer })
    }

    /// Review a generated storyboard. The browser has no generation
    /// delegate, so a candidate that fails validation comes back as
    /// `{"status": "rejected", "diagnostics": ...}` after one attempt.
    pub fn review(&self, storyboard_json: &str) -> Result<String, JsError> {
        let response = match self.reviewer.review(storyboard_json, &mut NoRegeneration) {
            Ok(review) => ReviewResponse::Reviewed { review },
            Err(PipelineError::ExhaustedRetries(diagnostics)) => ReviewResponse::Rejected {
                diagnostics: *diagnostics,
            },
            Err(e) => return Err(JsError::new(&format!("Review error: {e}"))),
        };
        to_json(&response)
    }

    /// Choose an interactivity for one scene.
    ///
    /// Expected JSON shape:
    /// ```json
    /// {
    ///   "ordinal": 4,
    ///   "cognitiveLevel": "apply",
    ///   "instructionalPurpose": "practice",
    ///   "moduleLevel": 3,
    ///   "precedingChoices": ["drag_and_drop"],
    ///   "cognitiveLoadHint": "medium"
    /// }
    /// ```
    pub fn select_interactivity(&self, meta_json: &str) -> Result<String, JsError> {
        let input: SceneMetaInput = serde_json::from_str(meta_json)
            .map_err(|e| JsError::new(&format!("Invalid scene JSON: {e}")))?;
        let meta = SceneMeta {
            ordinal: input.ordinal,
            cognitive_level: input.cognitive_level,
            instructional_purpose: input.instructional_purpose,
            module_level: input.module_level,
            preceding_choices: &input.preceding_choices,
            cognitive_load_hint: input.cognitive_load_hint,
        };
        let decision = select_interactivity_for_scene(&meta, &self.reviewer.config().sequencer)
            .map_err(|e| JsError::new(&format!("Sequencer error: {e}")))?;
        to_json(&decision)
    }

    /// Return the audit trail as a JSON array, oldest first.
    pub fn audit_log(&self) -> Result<String, JsError> {
        to_json(&self.reviewer.audit().entries())
    }

    /// Return the interactivity catalog as a JSON array.
    pub fn catalog() -> Result<String, JsError> {
        to_json(&catalog())
    }

    /// Return JSON array of cognitive level names, lowest first.
    pub fn cognitive_levels() -> String {
        let names: Vec<&str> = CognitiveLevel::ALL.iter().map(|l| l.name()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of instructional purpose names.
    pub fn instructional_purposes() -> String {
        let names: Vec<&str> = InstructionalPurpose::ALL.iter().map(|p| p.name()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }
}
