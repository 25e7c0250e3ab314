//! Interactivity catalog: the static reference table of interactivity
//! archetypes and what each one is compatible with.
//!
//! The table is built once on first access and only ever handed out by
//! shared reference. Declaration order is significant: the sequencer breaks
//! score ties in favour of the entry listed first.

use serde::Serialize;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use crate::schema::pedagogy::{CognitiveLevel, InstructionalPurpose, LoadTier};

use CognitiveLevel::*;
use InstructionalPurpose as P;

/// One interactivity type with its declared compatibility metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractivityArchetype {
    pub id: &'static str,
    pub cognitive_levels: &'static [CognitiveLevel],
    pub module_levels: RangeInclusive<u8>,
    pub load_tier: LoadTier,
    pub purposes: &'static [InstructionalPurpose],
    pub description: &'static str,
}

impl InteractivityArchetype {
    pub fn supports_cognitive_level(&self, level: CognitiveLevel) -> bool {
        self.cognitive_levels.contains(&level)
    }

    pub fn supports_module_level(&self, module_level: u8) -> bool {
        self.module_levels.contains(&module_level)
    }

    /// Hard compatibility: both the cognitive level and the module level
    /// must be supported.
    pub fn is_compatible(&self, level: CognitiveLevel, module_level: u8) -> bool {
        self.supports_cognitive_level(level) && self.supports_module_level(module_level)
    }
}

static CATALOG: LazyLock<Vec<InteractivityArchetype>> = LazyLock::new(build_catalog);

/// Every archetype in declaration order.
pub fn catalog() -> &'static [InteractivityArchetype] {
    &CATALOG
}

/// Look up an archetype by id.
pub fn find_archetype(id: &str) -> Option<&'static InteractivityArchetype> {
    CATALOG.iter().find(|a| a.id == id)
}

/// Archetypes compatible with a cognitive level and module level, paired
/// with their declaration index.
pub fn compatible_with(
    level: CognitiveLevel,
    module_level: u8,
) -> impl Iterator<Item = (usize, &'static InteractivityArchetype)> {
    CATALOG
        .iter()
        .enumerate()
        .filter(move |(_, a)| a.is_compatible(level, module_level))
}

fn build_catalog() -> Vec<InteractivityArchetype> {
    vec![
        InteractivityArchetype {
            id: "click_to_reveal",
            cognitive_levels: &[Remember, Understand],
            module_levels: 1..=3,
            load_tier: LoadTier::Low,
            purposes: &[P::Introduce, P::Explain],
            description: "Learner selects labelled items to reveal supporting content.",
        },
        InteractivityArchetype {
            id: "tabs_accordion",
            cognitive_levels: &[Remember, Understand],
            module_levels: 1..=2,
            load_tier: LoadTier::Low,
            purposes: &[P::Explain, P::Summarize],
            description: "Content chunked into tabs or collapsible panels.",
        },
        InteractivityArchetype {
            id: "multiple_choice_quiz",
            cognitive_levels: &[Remember, Understand, Apply],
            module_levels: 1..=4,
            load_tier: LoadTier::Low,
            purposes: &[P::Assess, P::Practice],
            description: "Single or multiple answer question with feedback per option.",
        },
        InteractivityArchetype {
            id: "flashcards",
            cognitive_levels: &[Remember],
            module_levels: 1..=2,
            load_tier: LoadTier::Low,
            purposes: &[P::Practice, P::Summarize],
            description: "Flip cards pairing a term with its definition.",
        },
        InteractivityArchetype {
            id: "hotspot_exploration",
            cognitive_levels: &[Remember, Understand, Analyze],
            module_levels: 1..=3,
            load_tier: LoadTier::Low,
            purposes: &[P::Explain, P::Demonstrate],
            description: "Learner explores regions of an image to surface details.",
        },
        InteractivityArchetype {
            id: "video_with_checkpoints",
            cognitive_levels: &[Remember, Understand],
            module_levels: 1..=3,
            load_tier: LoadTier::Medium,
            purposes: &[P::Demonstrate, P::Explain],
            description: "Video paused at checkpoints that ask a short question.",
        },
        InteractivityArchetype {
            id: "timeline_sequencing",
            cognitive_levels: &[Understand, Apply, Analyze],
            module_levels: 2..=3,
            load_tier: LoadTier::Medium,
            purposes: &[P::Practice, P::Explain],
            description: "Learner orders steps or events along a timeline.",
        },
        InteractivityArchetype {
            id: "drag_and_drop",
            cognitive_levels: &[Understand, Apply, Analyze],
            module_levels: 2..=4,
            load_tier: LoadTier::Medium,
            purposes: &[P::Practice, P::Apply],
            description: "Learner sorts or matches items into target zones.",
        },
        InteractivityArchetype {
            id: "reflection_prompt",
            cognitive_levels: &[Understand, Evaluate, Create],
            module_levels: 1..=4,
            load_tier: LoadTier::Low,
            purposes: &[P::Reflect, P::Summarize],
            description: "Open response prompt connecting content to the learner's context.",
        },
        InteractivityArchetype {
            id: "case_study_analysis",
            cognitive_levels: &[Analyze, Evaluate],
            module_levels: 3..=4,
            load_tier: LoadTier::High,
            purposes: &[P::Apply, P::Reflect],
            description: "Learner works through a realistic case and justifies a judgement.",
        },
        InteractivityArchetype {
            id: "branching_scenario",
            cognitive_levels: &[Apply, Analyze, Evaluate, Create],
            module_levels: 3..=4,
            load_tier: LoadTier::High,
            purposes: &[P::Apply, P::Assess],
            description: "Decisions route the learner through consequences and a debrief.",
        },
        InteractivityArchetype {
            id: "simulation",
            cognitive_levels: &[Apply, Analyze, Create],
            module_levels: 3..=4,
            load_tier: LoadTier::High,
            purposes: &[P::Practice, P::Apply],
            description: "Hands-on replica of a tool or process with guided tasks.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn catalog_ids_are_unique() {
        let ids: FxHashSet<&str> = catalog().iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn catalog_entries_are_well_formed() {
        for archetype in catalog() {
            assert!(!archetype.cognitive_levels.is_empty(), "{}", archetype.id);
            assert!(!archetype.purposes.is_empty(), "{}", archetype.id);
            assert!(*archetype.module_levels.start() >= 1, "{}", archetype.id);
            assert!(*archetype.module_levels.end() <= 4, "{}", archetype.id);
        }
    }

    #[test]
    fn every_cognitive_level_has_a_compatible_archetype() {
        for level in CognitiveLevel::ALL {
            for module_level in 3..=4 {
                assert!(
                    compatible_with(level, module_level).next().is_some(),
                    "no archetype for {:?} at module level {}",
                    level,
                    module_level
                );
            }
        }
    }

    #[test]
    fn compatible_with_filters_both_dimensions() {
        let ids: Vec<&str> = compatible_with(Evaluate, 2).map(|(_, a)| a.id).collect();
        assert_eq!(ids, vec!["reflection_prompt"]);

        let ids: Vec<&str> = compatible_with(Remember, 1).map(|(_, a)| a.id).collect();
        assert!(ids.contains(&"flashcards"));
        assert!(!ids.contains(&"drag_and_drop"));
    }

    #[test]
    fn compatible_with_preserves_declaration_index() {
        for (index, archetype) in compatible_with(Apply, 4) {
            assert_eq!(catalog()[index].id, archetype.id);
        }
    }

    #[test]
    fn find_archetype_by_id() {
        let branching = find_archetype("branching_scenario").unwrap();
        assert_eq!(branching.load_tier, LoadTier::High);
        assert!(find_archetype("interpretive_dance").is_none());
    }

    #[test]
    fn catalog_is_shared_not_copied() {
        assert!(std::ptr::eq(catalog(), catalog()));
    }
}
