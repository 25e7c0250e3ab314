/// Classifier property tests — tier thresholds and the branching override.

use proptest::prelude::*;
use storyboard_qc::core::classifier::{classify, ClassifierConfig, DetectedLevel};
use storyboard_qc::schema::scene::{Interaction, PageType, Scene};
use storyboard_qc::schema::storyboard::{ModuleSummary, Storyboard};

const SIMPLE_KINDS: [&str; 4] = ["click_to_reveal", "tabs", "hotspot", "flashcards"];
const KNOWLEDGE_CHECK: &str = "multiple_choice_quiz";
const BRANCHING: &str = "branching decision";

fn interactive(n: u32, kind: &str) -> Scene {
    let mut scene = Scene::new(n, "Activity", PageType::Interactive);
    scene.interactivity = Some(Interaction {
        kind: kind.to_string(),
        ..Interaction::default()
    });
    scene
}

fn storyboard(kinds: &[&str]) -> Storyboard {
    let mut scenes = vec![Scene::new(1, "Intro", PageType::Informative)];
    for (i, kind) in kinds.iter().enumerate() {
        scenes.push(interactive(i as u32 + 2, kind));
    }
    Storyboard::new(
        ModuleSummary {
            module_name: "Property module".to_string(),
            module_level: 2,
            ..ModuleSummary::default()
        },
        scenes,
    )
}

fn mixed_kinds(simple: usize, checks: usize) -> Vec<&'static str> {
    let mut kinds: Vec<&'static str> = (0..simple).map(|i| SIMPLE_KINDS[i % SIMPLE_KINDS.len()]).collect();
    kinds.extend(std::iter::repeat(KNOWLEDGE_CHECK).take(checks));
    kinds
}

#[test]
fn three_interactions_with_two_checks_is_not_basic() {
    let result = classify(&storyboard(&mixed_kinds(1, 2)), &ClassifierConfig::default());
    assert_eq!(result.metrics.interaction_count, 3);
    assert_eq!(result.metrics.knowledge_check_count, 2);
    assert_ne!(result.level, DetectedLevel::Basic);
    assert_eq!(result.level, DetectedLevel::Intermediate);
}

#[test]
fn branching_with_no_other_interactions() {
    let result = classify(&storyboard(&[BRANCHING]), &ClassifierConfig::default());
    assert_eq!(result.level, DetectedLevel::Advanced);
    assert_eq!(result.metrics.branching_count, 1);
}

#[test]
fn placeholder_interactions_are_not_counted() {
    let result = classify(&storyboard(&["none", "TBD", ""]), &ClassifierConfig::default());
    assert_eq!(result.metrics.interaction_count, 0);
    assert_eq!(result.level, DetectedLevel::Basic);
}

proptest! {
    #[test]
    fn prop_few_interactions_and_checks_is_basic(
        total in 0usize..3,
        checks in 0usize..2,
    ) {
        let checks = checks.min(total);
        let result = classify(
            &storyboard(&mixed_kinds(total - checks, checks)),
            &ClassifierConfig::default(),
        );
        prop_assert_eq!(result.metrics.interaction_count, total);
        prop_assert_eq!(result.level, DetectedLevel::Basic);
        prop_assert!(!result.reasons.is_empty());
    }

    #[test]
    fn prop_branching_forces_advanced(
        simple in 0usize..6,
        checks in 0usize..6,
        position in 0usize..12,
    ) {
        let mut kinds = mixed_kinds(simple, checks);
        let at = position % (kinds.len() + 1);
        kinds.insert(at, BRANCHING);

        let result = classify(&storyboard(&kinds), &ClassifierConfig::default());
        prop_assert_eq!(result.level, DetectedLevel::Advanced);
        prop_assert_eq!(result.metrics.branching_count, 1);
        // Metrics are still counted over every scene.
        prop_assert_eq!(result.metrics.interaction_count, simple + checks + 1);
        prop_assert_eq!(result.metrics.knowledge_check_count, checks);
    }

    #[test]
    fn prop_classification_does_not_mutate_input(
        simple in 0usize..5,
        checks in 0usize..5,
    ) {
        let board = storyboard(&mixed_kinds(simple, checks));
        let before = board.clone();
        let first = classify(&board, &ClassifierConfig::default());
        let second = classify(&board, &ClassifierConfig::default());
        prop_assert_eq!(&board, &before);
        prop_assert_eq!(first, second);
    }
}
