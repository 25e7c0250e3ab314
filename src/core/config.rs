//! Pipeline configuration, loadable from RON.
//!
//! Every section falls back to its defaults, so a file only needs to name
//! what it changes:
//!
//! ```ron
//! (
//!     density: (default_limits: (floor: 2, ceiling: 6)),
//!     enforcer: (max_attempts: 5),
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::classifier::ClassifierConfig;
use crate::core::enforcer::EnforcerConfig;
use crate::core::lint::{AccessibilityMarkers, DensityConfig};
use crate::core::sequencer::SequencerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Storyboard-wide bounds shared by the contract and the linter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryboardLimits {
    pub min_scenes: usize,
    pub max_scenes: usize,
    pub max_on_screen_words: usize,
}

impl Default for StoryboardLimits {
    fn default() -> Self {
        Self {
            min_scenes: 3,
            max_scenes: 40,
            max_on_screen_words: 70,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub storyboard: StoryboardLimits,
    pub classifier: ClassifierConfig,
    pub density: DensityConfig,
    pub accessibility: AccessibilityMarkers,
    pub sequencer: SequencerConfig,
    pub enforcer: EnforcerConfig,
}

const WEIGHT_TOLERANCE: f64 = 1e-6;

impl PipelineConfig {
    /// Load and validate a configuration file.
    pub fn load_from_ron(path: &Path) -> Result<PipelineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate configuration from a RON string.
    pub fn parse_ron(input: &str) -> Result<PipelineConfig, ConfigError> {
        let config: PipelineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.storyboard;
        if limits.min_scenes > limits.max_scenes {
            return Err(ConfigError::Invalid(format!(
                "min_scenes {} exceeds max_scenes {}",
                limits.min_scenes, limits.max_scenes
            )));
        }

        let density = &self.density;
        if density.default_limits.floor > density.default_limits.ceiling {
            return Err(ConfigError::Invalid(format!(
                "density floor {} exceeds ceiling {}",
                density.default_limits.floor, density.default_limits.ceiling
            )));
        }
        for band in &density.bands {
            if band.floor > band.ceiling {
                return Err(ConfigError::Invalid(format!(
                    "density band up to {:?} minutes has floor {} above ceiling {}",
                    band.up_to_minutes, band.floor, band.ceiling
                )));
            }
        }

        let sum = self.sequencer.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::Invalid(format!(
                "sequencer weights sum to {sum}, expected 1"
            )));
        }
        let w = &self.sequencer.weights;
        if [w.purpose, w.load, w.novelty, w.module_level]
            .iter()
            .any(|weight| *weight < 0.0)
        {
            return Err(ConfigError::Invalid(
                "sequencer weights must not be negative".to_string(),
            ));
        }
        if self.sequencer.novelty_lookback == 0 {
            return Err(ConfigError::Invalid(
                "novelty_lookback must be at least 1".to_string(),
            ));
        }

        if self.enforcer.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.enforcer.audit_retention == 0 {
            return Err(ConfigError::Invalid(
                "audit_retention must be at least 1".to_string(),
            ));
        }

        let markers = &self.accessibility;
        if markers.tab_order_marker.trim().is_empty()
            || markers.keyboard_section_marker.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "accessibility markers must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
