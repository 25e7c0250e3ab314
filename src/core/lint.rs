//! Interaction-density and accessibility linting.
//!
//! The linters report; they never repair. Accessibility text is
//! learner-facing, so a failing scene goes back to a human or to the
//! generator with an itemized, scene-addressed issue list.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::config::PipelineConfig;
use crate::schema::scene::Scene;
use crate::schema::storyboard::Storyboard;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DensityError {
    #[error("too few interactions: {found} interactive scenes, floor is {floor}")]
    TooFew { found: usize, floor: usize },
    #[error("too many interactions: {found} interactive scenes, ceiling is {ceiling}")]
    TooMany { found: usize, ceiling: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityIssue {
    MissingAltText,
    MissingKeyboardMap,
    MissingCaptionState,
}

impl fmt::Display for AccessibilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingAltText => "missing alt text",
            Self::MissingKeyboardMap => "missing keyboard navigation map",
            Self::MissingCaptionState => "missing caption state",
        })
    }
}

/// Every accessibility issue found on one scene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scene {scene}: {}", join_issues(.issues))]
pub struct AccessibilityError {
    pub scene: u32,
    pub issues: Vec<AccessibilityIssue>,
}

fn join_issues(issues: &[AccessibilityIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inclusive floor and ceiling on interactive scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityLimits {
    pub floor: usize,
    pub ceiling: usize,
}

/// Limits for modules up to a given length. `None` means no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityBand {
    pub up_to_minutes: Option<u32>,
    pub floor: usize,
    pub ceiling: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Used when the module declares no duration.
    pub default_limits: DensityLimits,
    /// Checked in order; the first band long enough wins.
    pub bands: Vec<DensityBand>,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            default_limits: DensityLimits {
                floor: 8,
                ceiling: 12,
            },
            bands: vec![
                DensityBand {
                    up_to_minutes: Some(15),
                    floor: 4,
                    ceiling: 8,
                },
                DensityBand {
                    up_to_minutes: Some(45),
                    floor: 8,
                    ceiling: 12,
                },
                DensityBand {
                    up_to_minutes: None,
                    floor: 12,
                    ceiling: 20,
                },
            ],
        }
    }
}

impl DensityConfig {
    pub fn limits_for(&self, duration_minutes: Option<u32>) -> DensityLimits {
        let Some(minutes) = duration_minutes else {
            return self.default_limits;
        };
        self.bands
            .iter()
            .find(|band| band.up_to_minutes.map_or(true, |max| minutes <= max))
            .map(|band| DensityLimits {
                floor: band.floor,
                ceiling: band.ceiling,
            })
            .unwrap_or(self.default_limits)
    }
}

/// Marker tokens the keyboard-navigation annotation must contain,
/// matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilityMarkers {
    pub tab_order_marker: String,
    pub keyboard_section_marker: String,
}

impl Default for AccessibilityMarkers {
    fn default() -> Self {
        Self {
            tab_order_marker: "tab order".to_string(),
            keyboard_section_marker: "keyboard:".to_string(),
        }
    }
}

/// Check the number of interactive scenes against `limits`.
///
/// Interactive pages and every scenario sub-phase count.
pub fn lint_density(scenes: &[Scene], limits: DensityLimits) -> Result<(), DensityError> {
    let found = scenes
        .iter()
        .filter(|s| s.page_type.counts_toward_density())
        .count();
    if found < limits.floor {
        return Err(DensityError::TooFew {
            found,
            floor: limits.floor,
        });
    }
    if found > limits.ceiling {
        return Err(DensityError::TooMany {
            found,
            ceiling: limits.ceiling,
        });
    }
    Ok(())
}

/// Check one scene's accessibility annotations.
///
/// A keyboard map needs both the tab-order marker and the keyboard-section
/// marker; missing either is the same failure. Caption state is required on
/// every scene, narrated or not, so a silent page still says so.
pub fn lint_accessibility(
    scene: &Scene,
    markers: &AccessibilityMarkers,
) -> Result<(), AccessibilityError> {
    let mut issues = Vec::new();

    if scene.lacks_alt_text() {
        issues.push(AccessibilityIssue::MissingAltText);
    }

    let navigation = scene.accessibility.keyboard_navigation.to_lowercase();
    let has_tab_order = navigation.contains(&markers.tab_order_marker.to_lowercase());
    let has_keyboard_section = navigation.contains(&markers.keyboard_section_marker.to_lowercase());
    if !(has_tab_order && has_keyboard_section) {
        issues.push(AccessibilityIssue::MissingKeyboardMap);
    }

    if scene.accessibility.captions.trim().is_empty() {
        issues.push(AccessibilityIssue::MissingCaptionState);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AccessibilityError {
            scene: scene.scene_number,
            issues,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LintCode {
    TooFewInteractions,
    TooManyInteractions,
    MissingAltText,
    MissingKeyboardMap,
    MissingCaptionState,
    OnScreenTextTooLong,
    NonContiguousOrdinals,
    SceneCountOutOfBand,
    MissingLearningMeta,
}

impl From<AccessibilityIssue> for LintCode {
    fn from(issue: AccessibilityIssue) -> Self {
        match issue {
            AccessibilityIssue::MissingAltText => Self::MissingAltText,
            AccessibilityIssue::MissingKeyboardMap => Self::MissingKeyboardMap,
            AccessibilityIssue::MissingCaptionState => Self::MissingCaptionState,
        }
    }
}

/// One finding, addressed to a scene when it concerns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintIssue {
    pub scene: Option<u32>,
    pub severity: Severity,
    pub code: LintCode,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        match self.scene {
            Some(scene) => write!(f, "{severity}: scene {scene}: {}", self.message),
            None => write!(f, "{severity}: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub issues: Vec<LintIssue>,
}

impl LintReport {
    pub fn push(&mut self, scene: Option<u32>, severity: Severity, code: LintCode, message: String) {
        self.issues.push(LintIssue {
            scene,
            severity,
            code,
            message,
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &LintIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LintIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn for_scene(&self, scene: u32) -> impl Iterator<Item = &LintIssue> {
        self.issues.iter().filter(move |i| i.scene == Some(scene))
    }

    pub fn with_code(&self, code: LintCode) -> impl Iterator<Item = &LintIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    /// A storyboard with any unresolved error must not be published.
    pub fn is_publishable(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Run every storyboard-level and scene-level check and collect the
/// findings into one report.
pub fn lint_storyboard(storyboard: &Storyboard, config: &PipelineConfig) -> LintReport {
    let mut report = LintReport::default();
    let limits = &config.storyboard;

    let scene_count = storyboard.scenes.len();
    if scene_count < limits.min_scenes || scene_count > limits.max_scenes {
        report.push(
            None,
            Severity::Error,
            LintCode::SceneCountOutOfBand,
            format!(
                "{scene_count} scenes outside allowed range {}..={}",
                limits.min_scenes, limits.max_scenes
            ),
        );
    }

    if !storyboard.has_contiguous_ordinals() {
        report.push(
            None,
            Severity::Error,
            LintCode::NonContiguousOrdinals,
            "scene numbers must run contiguously from 1".to_string(),
        );
    }

    let density_limits = config
        .density
        .limits_for(storyboard.summary.duration_minutes);
    if let Err(err) = lint_density(&storyboard.scenes, density_limits) {
        let code = match err {
            DensityError::TooFew { .. } => LintCode::TooFewInteractions,
            DensityError::TooMany { .. } => LintCode::TooManyInteractions,
        };
        report.push(None, Severity::Error, code, err.to_string());
    }

    for scene in &storyboard.scenes {
        let words = scene.on_screen_word_count();
        if words > limits.max_on_screen_words {
            report.push(
                Some(scene.scene_number),
                Severity::Error,
                LintCode::OnScreenTextTooLong,
                format!(
                    "on-screen text has {words} words, limit is {}",
                    limits.max_on_screen_words
                ),
            );
        }

        if let Err(err) = lint_accessibility(scene, &config.accessibility) {
            for issue in err.issues {
                report.push(
                    Some(err.scene),
                    Severity::Error,
                    issue.into(),
                    issue.to_string(),
                );
            }
        }
    }

    report
}
