/// Sequence Preview — shows how interactivity was chosen for each scene.
///
/// Usage: sequence_preview <storyboard.json> [--config <file.ron>] [--scene <n>]
///
/// Prints the winner, its signal breakdown and the runner-ups for every
/// scene that needs an interactivity.

use std::process;
use storyboard_qc::core::enforcer::NoRegeneration;
use storyboard_qc::core::pipeline::StoryboardReviewer;
use storyboard_qc::core::sequencer::{SequencingDecision, SignalScores};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let storyboard_path = &args[1];
    let mut config_path = None;
    let mut only_scene: Option<u32> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--scene" if i + 1 < args.len() => {
                i += 1;
                only_scene = match args[i].parse() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        eprintln!("Invalid scene number: {}", args[i]);
                        process::exit(1);
                    }
                };
            }
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
    let reviewer = match builder.build() {
        Ok(reviewer) => reviewer,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let reviewed = match reviewer.review(&raw, &mut NoRegeneration) {
        Ok(reviewed) => reviewed,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let weights = &reviewer.config().sequencer.weights;
    println!(
        "Weights: purpose {:.2}, load {:.2}, novelty {:.2}, module {:.2}",
        weights.purpose, weights.load, weights.novelty, weights.module_level
    );

    let mut shown = 0;
    for decision in &reviewed.sequencing {
        if only_scene.is_some_and(|n| n != decision.scene) {
            continue;
        }
        print_decision(decision);
        shown += 1;
    }

    if shown == 0 {
        println!("\nNo sequenced scenes to show.");
    }
    for issue in reviewed.lint.with_code(
        storyboard_qc::core::lint::LintCode::MissingLearningMeta,
    ) {
        println!("{}", issue);
    }
}

fn print_usage() {
    println!("Usage: sequence_preview <storyboard.json> [--config <file.ron>] [--scene <n>]");
}

fn print_decision(decision: &SequencingDecision) {
    println!("\n--- Scene {} ---", decision.scene);
    println!(
        "  winner: {} ({:.3})  {}",
        decision.archetype_id,
        decision.score,
        format_signals(&decision.signals)
    );
    println!("  {}", decision.justification);
    for (rank, alt) in decision.alternatives.iter().enumerate() {
        println!(
            "  #{} {} ({:.3})  {}",
            rank + 2,
            alt.archetype_id,
            alt.score,
            format_signals(&alt.signals)
        );
        println!("     {}", alt.rationale);
    }
    println!("  checksum: {}", decision.checksum);
}

fn format_signals(signals: &SignalScores) -> String {
    format!(
        "[purpose {:.2} | load {:.2} | novelty {:.2} | module {:.2}]",
        signals.purpose, signals.load, signals.novelty, signals.module_level
    )
}
