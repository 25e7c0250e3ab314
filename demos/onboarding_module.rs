/// Onboarding Module example — drives the full review with a scripted generator.
///
/// The first candidate is chatty prose, the second breaks the contract, the
/// third is the onboarding fixture wrapped in a code fence.
///
/// Run with: cargo run --example onboarding_module

use storyboard_qc::core::enforcer::RegenerationError;
use storyboard_qc::core::pipeline::StoryboardReviewer;

const GOOD_CANDIDATE: &str = include_str!("../tests/fixtures/onboarding_module.json");

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let reviewer = StoryboardReviewer::builder()
        .build()
        .expect("Failed to build reviewer");

    // --- Scripted generator: each call returns the next canned reply ---
    let mut replies = vec![
        r#"{"moduleName": "Welcome to the Support Team", "moduleLevel": 9, "scenes": []}"#
            .to_string(),
        format!("```json\n{GOOD_CANDIDATE}\n```"),
    ]
    .into_iter();

    let mut generator = |feedback: &[String]| {
        println!("\n[generator] asked to fix {} issue(s):", feedback.len());
        for item in feedback {
            println!("  - {}", item);
        }
        replies
            .next()
            .ok_or_else(|| RegenerationError::Failed("no more canned replies".to_string()))
    };

    let first_candidate = "Sure! Here's a storyboard for your onboarding module.";
    let reviewed = match reviewer.review(first_candidate, &mut generator) {
        Ok(reviewed) => reviewed,
        Err(e) => {
            eprintln!("Review failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n=== {} ===", reviewed.storyboard.summary.module_name);
    println!(
        "Validated after {} attempt(s); complexity {}",
        reviewed.validation.attempts,
        reviewed.classification.level.name()
    );
    for reason in &reviewed.classification.reasons {
        println!("  - {}", reason);
    }

    println!("\n--- Interactivity plan ---");
    for decision in &reviewed.sequencing {
        let title = reviewed
            .storyboard
            .scene(decision.scene)
            .map(|s| s.scene_title.as_str())
            .unwrap_or("?");
        println!(
            "Scene {} ({}): {} [{:.2}]",
            decision.scene, title, decision.archetype_id, decision.score
        );
        println!("    {}", decision.justification);
        if let Some(runner_up) = decision.alternatives.first() {
            println!("    next best: {} ({})", runner_up.archetype_id, runner_up.rationale);
        }
    }

    println!("\n--- Lint ---");
    if reviewed.lint.issues.is_empty() {
        println!("No issues.");
    }
    for issue in &reviewed.lint.issues {
        println!("{}", issue);
    }
    println!(
        "\nPublishable: {}",
        if reviewed.publishable { "yes" } else { "no" }
    );

    println!("\n--- Audit trail ---");
    for entry in reviewer.audit().entries() {
        println!(
            "#{} {} {} {}",
            entry.attempt,
            if entry.passed { "PASS" } else { "FAIL" },
            &entry.checksum[..12],
            entry.summary
        );
    }
}
