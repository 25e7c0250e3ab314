//! Heuristic complexity classification of a candidate storyboard.
//!
//! Keyword vocabularies and thresholds live in [`ClassifierConfig`] so they
//! can be tuned from configuration without touching the scan.

use serde::{Deserialize, Serialize};

use crate::schema::scene::normalize_text;
use crate::schema::storyboard::Storyboard;

/// The three complexity tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedLevel {
    Basic,
    Intermediate,
    Advanced,
}

impl DetectedLevel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

/// Snapshot of what the scan counted. Recomputed on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub interaction_count: usize,
    pub knowledge_check_count: usize,
    pub branching_count: usize,
    pub complex_interaction_count: usize,
    pub simple_interaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedThresholds {
    pub min_interactions: usize,
    pub min_complex: usize,
    pub min_knowledge_checks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntermediateThresholds {
    pub min_interactions: usize,
    pub max_interactions: usize,
    pub min_knowledge_checks: usize,
}

/// Vocabulary and thresholds for [`classify`].
///
/// The defaults were picked empirically; treat them as starting points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub simple_keywords: Vec<String>,
    pub complex_keywords: Vec<String>,
    pub knowledge_check_keywords: Vec<String>,
    /// Whole words (or multi-word phrases) that mark branching.
    pub branching_tokens: Vec<String>,
    pub advanced: AdvancedThresholds,
    pub intermediate: IntermediateThresholds,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            simple_keywords: strings(&[
                "click to reveal",
                "reveal",
                "tabs",
                "accordion",
                "flip card",
                "flashcard",
                "hotspot",
                "carousel",
                "timeline",
                "video",
            ]),
            complex_keywords: strings(&[
                "drag",
                "drop",
                "branch",
                "simulation",
                "scenario",
                "sorting",
                "matching",
                "role play",
                "game",
            ]),
            knowledge_check_keywords: strings(&[
                "quiz",
                "question",
                "mcq",
                "multiple choice",
                "knowledge check",
                "true or false",
                "true/false",
                "fill in the blank",
                "assessment",
            ]),
            branching_tokens: strings(&[
                "branch", "branches", "branching", "branched", "path", "paths", "pathway",
                "pathways",
            ]),
            advanced: AdvancedThresholds {
                min_interactions: 5,
                min_complex: 1,
                min_knowledge_checks: 4,
            },
            intermediate: IntermediateThresholds {
                min_interactions: 3,
                max_interactions: 6,
                min_knowledge_checks: 2,
            },
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The result of [`classify`]: tier, counts, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub level: DetectedLevel,
    pub metrics: ComplexityMetrics,
    pub reasons: Vec<String>,
}

/// Classify a storyboard into a complexity tier.
///
/// Any scene whose interaction text carries a branching token forces
/// [`DetectedLevel::Advanced`] whatever the other counts are. Metrics are
/// still counted over every scene so callers see the full picture.
pub fn classify(storyboard: &Storyboard, config: &ClassifierConfig) -> Classification {
    let simple = normalized(&config.simple_keywords);
    let complex = normalized(&config.complex_keywords);
    let knowledge = normalized(&config.knowledge_check_keywords);
    let branching = normalized(&config.branching_tokens);

    let mut metrics = ComplexityMetrics::default();
    let mut first_branch: Option<(u32, String)> = None;

    for scene in &storyboard.scenes {
        let Some(interaction) = scene.interaction() else {
            continue;
        };
        let text = interaction.search_text();
        metrics.interaction_count += 1;

        if matches_any(&text, &simple) {
            metrics.simple_interaction_count += 1;
        }
        if matches_any(&text, &complex) {
            metrics.complex_interaction_count += 1;
        }
        if matches_any(&text, &knowledge) {
            metrics.knowledge_check_count += 1;
        }
        if let Some(token) = branching_token(&text, &branching) {
            metrics.branching_count += 1;
            if first_branch.is_none() {
                first_branch = Some((scene.scene_number, token.to_string()));
            }
        }
    }

    let (level, reasons) = match first_branch {
        Some((scene_number, token)) => (
            DetectedLevel::Advanced,
            vec![format!(
                "scene {scene_number} interaction mentions '{token}'; branching forces advanced"
            )],
        ),
        None => level_from_counts(&metrics, config),
    };

    tracing::debug!(
        level = level.name(),
        interactions = metrics.interaction_count,
        knowledge_checks = metrics.knowledge_check_count,
        complex = metrics.complex_interaction_count,
        branching = metrics.branching_count,
        "classified storyboard"
    );

    Classification {
        level,
        metrics,
        reasons,
    }
}

fn level_from_counts(
    metrics: &ComplexityMetrics,
    config: &ClassifierConfig,
) -> (DetectedLevel, Vec<String>) {
    let adv = &config.advanced;
    let mid = &config.intermediate;
    let interactions = metrics.interaction_count;
    let checks = metrics.knowledge_check_count;
    let complex = metrics.complex_interaction_count;

    if interactions >= adv.min_interactions
        && complex >= adv.min_complex
        && checks >= adv.min_knowledge_checks
    {
        return (
            DetectedLevel::Advanced,
            vec![
                format!("{interactions} interactions (advanced minimum {})", adv.min_interactions),
                format!("{complex} complex interactions (advanced minimum {})", adv.min_complex),
                format!("{checks} knowledge checks (advanced minimum {})", adv.min_knowledge_checks),
            ],
        );
    }

    if (mid.min_interactions..=mid.max_interactions).contains(&interactions)
        && checks >= mid.min_knowledge_checks
    {
        return (
            DetectedLevel::Intermediate,
            vec![
                format!(
                    "{interactions} interactions within intermediate range {}..={}",
                    mid.min_interactions, mid.max_interactions
                ),
                format!(
                    "{checks} knowledge checks (intermediate minimum {})",
                    mid.min_knowledge_checks
                ),
            ],
        );
    }

    let mut reasons = Vec::new();
    if interactions < mid.min_interactions {
        reasons.push(format!(
            "{interactions} interactions below intermediate minimum {}",
            mid.min_interactions
        ));
    } else if interactions > mid.max_interactions {
        reasons.push(format!(
            "{interactions} interactions above intermediate range but advanced criteria unmet"
        ));
    }
    if checks < mid.min_knowledge_checks {
        reasons.push(format!(
            "{checks} knowledge checks below intermediate minimum {}",
            mid.min_knowledge_checks
        ));
    }
    if reasons.is_empty() {
        reasons.push("no tier criteria met".to_string());
    }
    (DetectedLevel::Basic, reasons)
}

fn normalized(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| normalize_text(k))
        .filter(|k| !k.is_empty())
        .collect()
}

fn matches_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

/// Single-word tokens must match a whole word; phrases match as substrings.
fn branching_token<'a>(text: &str, tokens: &'a [String]) -> Option<&'a str> {
    tokens
        .iter()
        .find(|token| {
            if token.contains(' ') {
                text.contains(token.as_str())
            } else {
                text.split(|c: char| !c.is_alphanumeric())
                    .any(|word| word == token.as_str())
            }
        })
        .map(String::as_str)
}
