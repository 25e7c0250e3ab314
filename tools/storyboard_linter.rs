/// Storyboard Linter — runs the full review over a candidate storyboard.
///
/// Usage: storyboard_linter <storyboard.json> [--config <file.ron>] [--contract <file.ron>] [--json]
///
/// No regeneration is attempted: a candidate that fails validation is
/// reported with its failures. Exits 1 unless the storyboard is publishable.

use std::process;
use storyboard_qc::core::enforcer::NoRegeneration;
use storyboard_qc::core::pipeline::{PipelineError, ReviewedStoryboard, StoryboardReviewer};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        process::exit(0);
    }

    let storyboard_path = &args[1];
    let mut config_path = None;
    let mut contract_path = None;
    let mut json_output = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--contract" if i + 1 < args.len() => {
                i += 1;
                contract_path = Some(args[i].clone());
            }
            "--json" => json_output = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let raw = match std::fs::read_to_string(storyboard_path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("ERROR: Failed to read '{}': {}", storyboard_path, e);
            process::exit(1);
        }
    };

    let mut builder = StoryboardReviewer::builder();
    if let Some(ref path) = config_path {
        builder = builder.config_file(path);
    }
    if let Some(ref path) = contract_path {
        builder = builder.contract_file(path);
    }
    let reviewer = match builder.build() {
        Ok(reviewer) => reviewer,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    match reviewer.review(&raw, &mut NoRegeneration) {
        Ok(reviewed) => {
            if json_output {
                match serde_json::to_string_pretty(&reviewed) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("ERROR: Failed to serialize report: {}", e);
                        process::exit(1);
                    }
                }
            } else {
                print_report(&reviewed);
            }
            process::exit(if reviewed.publishable { 0 } else { 1 });
        }
        Err(PipelineError::ExhaustedRetries(diagnostics)) => {
            println!("\n=== Validation Failed ===\n");
            for failure in &diagnostics.failures {
                println!("ERROR: {}", failure);
            }
            println!("\nChecksum: {}", diagnostics.checksum);
            println!("{}", diagnostics.guidance);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        "Usage: storyboard_linter <storyboard.json> [--config <file.ron>] [--contract <file.ron>] [--json]"
    );
}

fn print_report(reviewed: &ReviewedStoryboard) {
    let summary = &reviewed.storyboard.summary;
    println!(
        "Module: {} (level {}, {} scenes)",
        summary.module_name,
        summary.module_level,
        reviewed.storyboard.scenes.len()
    );
    println!(
        "Validated in {} attempt(s), checksum {}",
        reviewed.validation.attempts, reviewed.validation.checksum
    );

    println!(
        "\n=== Complexity: {} ===\n",
        reviewed.classification.level.name()
    );
    for reason in &reviewed.classification.reasons {
        println!("  - {}", reason);
    }

    println!("\n=== Lint Report ===\n");
    if reviewed.lint.issues.is_empty() {
        println!("All checks passed!");
    }
    for issue in &reviewed.lint.issues {
        println!("{}", issue);
    }

    println!("\n=== Interactivity ===\n");
    for decision in &reviewed.sequencing {
        println!(
            "  scene {:>3}: {:<24} {:.3}  {}",
            decision.scene, decision.archetype_id, decision.score, decision.justification
        );
    }

    println!(
        "\nSummary: {} errors, {} warnings, {}",
        reviewed.lint.errors().count(),
        reviewed.lint.warnings().count(),
        if reviewed.publishable {
            "publishable"
        } else {
            "NOT publishable"
        }
    );
}
