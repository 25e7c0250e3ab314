use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Valid author-set module levels. Level 1 is the lightest, level 4 the
/// most interaction-rich.
pub const MODULE_LEVELS: RangeInclusive<u8> = 1..=4;

/// Six-point ordered classification of learning depth.
///
/// Ordering follows the enum declaration, so `Remember < Create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl CognitiveLevel {
    pub const ALL: [CognitiveLevel; 6] = [
        Self::Remember,
        Self::Understand,
        Self::Apply,
        Self::Analyze,
        Self::Evaluate,
        Self::Create,
    ];

    /// Wire name, e.g. "analyze".
    pub fn name(&self) -> &'static str {
        match self {
            Self::Remember => "remember",
            Self::Understand => "understand",
            Self::Apply => "apply",
            Self::Analyze => "analyze",
            Self::Evaluate => "evaluate",
            Self::Create => "create",
        }
    }
}

/// Cognitive-load tier, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadTier {
    Low,
    Medium,
    High,
}

impl LoadTier {
    pub const ALL: [LoadTier; 3] = [Self::Low, Self::Medium, Self::High];

    /// Position on the tier scale: 0, 1 or 2.
    pub fn index(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// The tier a module level implies on its own.
    pub fn for_module_level(level: u8) -> LoadTier {
        match level {
            0 | 1 => Self::Low,
            2 | 3 => Self::Medium,
            _ => Self::High,
        }
    }
}

/// What a scene is trying to achieve pedagogically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionalPurpose {
    Introduce,
    Explain,
    Demonstrate,
    Practice,
    Apply,
    Assess,
    Reflect,
    Summarize,
}

/// Coarse grouping of purposes. Two purposes in the same family are
/// "related" for partial-credit scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurposeFamily {
    Presentation,
    Practice,
    Evaluation,
}

impl InstructionalPurpose {
    pub const ALL: [InstructionalPurpose; 8] = [
        Self::Introduce,
        Self::Explain,
        Self::Demonstrate,
        Self::Practice,
        Self::Apply,
        Self::Assess,
        Self::Reflect,
        Self::Summarize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Introduce => "introduce",
            Self::Explain => "explain",
            Self::Demonstrate => "demonstrate",
            Self::Practice => "practice",
            Self::Apply => "apply",
            Self::Assess => "assess",
            Self::Reflect => "reflect",
            Self::Summarize => "summarize",
        }
    }

    pub fn family(&self) -> PurposeFamily {
        match self {
            Self::Introduce | Self::Explain | Self::Demonstrate | Self::Summarize => {
                PurposeFamily::Presentation
            }
            Self::Practice | Self::Apply => PurposeFamily::Practice,
            Self::Assess | Self::Reflect => PurposeFamily::Evaluation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cognitive_levels_are_ordered() {
        assert!(CognitiveLevel::Remember < CognitiveLevel::Understand);
        assert!(CognitiveLevel::Evaluate < CognitiveLevel::Create);
        let mut sorted = CognitiveLevel::ALL;
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted, CognitiveLevel::ALL);
    }

    #[test]
    fn load_tier_for_module_level() {
        assert_eq!(LoadTier::for_module_level(1), LoadTier::Low);
        assert_eq!(LoadTier::for_module_level(2), LoadTier::Medium);
        assert_eq!(LoadTier::for_module_level(3), LoadTier::Medium);
        assert_eq!(LoadTier::for_module_level(4), LoadTier::High);
    }

    #[test]
    fn wire_names_match_serde() {
        for level in CognitiveLevel::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.name()));
        }
        for purpose in InstructionalPurpose::ALL {
            let json = serde_json::to_string(&purpose).unwrap();
            assert_eq!(json, format!("\"{}\"", purpose.name()));
        }
    }

    #[test]
    fn purpose_families() {
        assert_eq!(
            InstructionalPurpose::Practice.family(),
            InstructionalPurpose::Apply.family()
        );
        assert_ne!(
            InstructionalPurpose::Explain.family(),
            InstructionalPurpose::Assess.family()
        );
    }
}
