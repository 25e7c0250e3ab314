/// The review pipeline: raw candidate → reviewed storyboard.
///
/// Wires together validation with bounded regeneration, complexity
/// classification, linting, and per-scene interactivity sequencing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::core::classifier::{classify, Classification};
use crate::core::config::{ConfigError, PipelineConfig};
use crate::core::contract::{ContractError, StructuralContract};
use crate::core::enforcer::{
    AuditLog, EnforcerStats, FailureDiagnostics, Regenerator, ValidationEnforcer,
    ValidationOutcome,
};
use crate::core::lint::{lint_storyboard, LintCode, LintReport, Severity};
use crate::core::sequencer::{
    select_interactivity_for_scene, SceneMeta, SequencerError, SequencingDecision,
};
use crate::schema::storyboard::Storyboard;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "validation failed after {} attempts with {} distinct failures",
        .0.attempts,
        .0.failures.len()
    )]
    ExhaustedRetries(Box<FailureDiagnostics>),
    #[error("validated payload does not match the storyboard model: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("sequencer error: {0}")]
    Sequencer(#[from] SequencerError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
}

/// How the accepted candidate got through validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub attempts: u32,
    pub checksum: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything the author UI needs to display and gate a storyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewedStoryboard {
    pub storyboard: Storyboard,
    pub validation: ValidationSummary,
    pub classification: Classification,
    pub lint: LintReport,
    /// One decision per scene that needed and could get an interactivity.
    pub sequencing: Vec<SequencingDecision>,
    pub publishable: bool,
}

impl ReviewedStoryboard {
    pub fn decision_for(&self, scene_number: u32) -> Option<&SequencingDecision> {
        self.sequencing.iter().find(|d| d.scene == scene_number)
    }
}

/// The top-level reviewer. Built via `StoryboardReviewer::builder()`.
///
/// `review` takes `&self`; one reviewer can serve concurrent requests and
/// shares its audit log and counters between them.
pub struct StoryboardReviewer {
    config: PipelineConfig,
    contract: StructuralContract,
    enforcer: ValidationEnforcer,
}

/// Builder for constructing a `StoryboardReviewer`.
#[derive(Default)]
pub struct StoryboardReviewerBuilder {
    config_path: Option<String>,
    contract_path: Option<String>,
    /// Directly provided config (for testing without files).
    config: Option<PipelineConfig>,
    /// Directly provided contract (for testing without files).
    contract: Option<StructuralContract>,
}

impl StoryboardReviewer {
    pub fn builder() -> StoryboardReviewerBuilder {
        StoryboardReviewerBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn contract(&self) -> &StructuralContract {
        &self.contract
    }

    pub fn audit(&self) -> &AuditLog {
        self.enforcer.audit()
    }

    pub fn stats(&self) -> EnforcerStats {
        self.enforcer.stats()
    }

    /// Validate, classify, lint, and sequence one raw candidate.
    ///
    /// A candidate must pass the contract and deserialize into a
    /// [`Storyboard`] to be accepted; either failure costs an attempt.
    /// Exhausted retries are terminal and come back as
    /// [`PipelineError::ExhaustedRetries`] with full diagnostics.
    pub fn review(
        &self,
        raw: &str,
        regenerator: &mut dyn Regenerator,
    ) -> Result<ReviewedStoryboard, PipelineError> {
        let (payload, validation) =
            match self
                .enforcer
                .validate_as::<Storyboard>(raw, &self.contract, regenerator)
            {
                ValidationOutcome::Validated {
                    payload,
                    attempts,
                    checksum,
                    timestamp,
                } => (
                    payload,
                    ValidationSummary {
                        attempts,
                        checksum,
                        timestamp,
                    },
                ),
                ValidationOutcome::Failed(diagnostics) => {
                    return Err(PipelineError::ExhaustedRetries(Box::new(diagnostics)));
                }
            };

        let storyboard: Storyboard = serde_json::from_value(payload)?;
        self.assess(storyboard, validation)
    }

    /// Classify, lint, and sequence a storyboard that already passed
    /// validation.
    pub fn assess(
        &self,
        storyboard: Storyboard,
        validation: ValidationSummary,
    ) -> Result<ReviewedStoryboard, PipelineError> {
        let classification = classify(&storyboard, &self.config.classifier);
        let mut lint = lint_storyboard(&storyboard, &self.config);
        let sequencing = self.sequence(&storyboard, &mut lint)?;
        let publishable = lint.is_publishable();

        info!(
            module = %storyboard.summary.module_name,
            level = classification.level.name(),
            errors = lint.errors().count(),
            warnings = lint.warnings().count(),
            sequenced = sequencing.len(),
            publishable,
            "storyboard reviewed"
        );

        Ok(ReviewedStoryboard {
            storyboard,
            validation,
            classification,
            lint,
            sequencing,
            publishable,
        })
    }

    fn sequence(
        &self,
        storyboard: &Storyboard,
        lint: &mut LintReport,
    ) -> Result<Vec<SequencingDecision>, PipelineError> {
        // Request-scoped: never shared between reviews.
        let mut history: Vec<String> = Vec::new();
        let mut decisions = Vec::new();

        for scene in &storyboard.scenes {
            if !scene.page_type.needs_interactivity() {
                continue;
            }
            let Some(learning) = scene.learning else {
                lint.push(
                    Some(scene.scene_number),
                    Severity::Warning,
                    LintCode::MissingLearningMeta,
                    format!(
                        "{} scene has no learning metadata; interactivity not sequenced",
                        scene.page_type.name()
                    ),
                );
                continue;
            };

            let meta = SceneMeta {
                ordinal: scene.scene_number,
                cognitive_level: learning.cognitive_level,
                instructional_purpose: learning.instructional_purpose,
                module_level: storyboard.summary.module_level,
                preceding_choices: &history,
                cognitive_load_hint: learning.cognitive_load,
            };
            let decision = select_interactivity_for_scene(&meta, &self.config.sequencer)?;
            history.push(decision.archetype_id.clone());
            decisions.push(decision);
        }

        Ok(decisions)
    }
}

impl StoryboardReviewerBuilder {
    pub fn config_file(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn contract_file(mut self, path: &str) -> Self {
        self.contract_path = Some(path.to_string());
        self
    }

    /// Provide config directly (for testing without files).
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide a contract directly (for testing without files).
    pub fn with_contract(mut self, contract: StructuralContract) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn build(self) -> Result<StoryboardReviewer, PipelineError> {
        // A config file overrides a directly provided config.
        let config = match self.config_path {
            Some(ref path) => PipelineConfig::load_from_ron(Path::new(path))?,
            None => self.config.unwrap_or_default(),
        };
        config.validate()?;

        let contract = match (self.contract_path, self.contract) {
            (Some(ref path), _) => StructuralContract::load_from_ron(Path::new(path))?,
            (None, Some(contract)) => contract,
            (None, None) => StructuralContract::for_storyboards(&config),
        };

        let enforcer = ValidationEnforcer::new(&config.enforcer);
        Ok(StoryboardReviewer {
            config,
            contract,
            enforcer,
        })
    }
}
