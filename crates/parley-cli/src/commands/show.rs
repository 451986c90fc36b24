//! Print a protocol and a witness history.

use anyhow::{Context, Result};
use colored::Colorize;
use parley_core::engine;
use parley_core::protocol::Protocol;
use parley_core::types::TurnPattern;
use std::path::Path;

pub fn run(path: &str) -> Result<()> {
    let protocol = Protocol::load(Path::new(path))
        .with_context(|| format!("Failed to load protocol: {}", path))?;

    println!("{} {}", "Protocol".bold(), protocol.name().cyan());
    println!(
        "  Vocabulary: {}",
        protocol
            .vocabulary()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Rules:");
    for rule in protocol.rules() {
        let mark = if rule.is_monotonic() { "~".yellow() } else { "•".normal() };
        println!("    {} {}", mark, rule);
    }

    let pattern = TurnPattern::alternating(protocol.vocabulary().len() + 2)?;
    println!();
    match engine::find_completion(&protocol, &[], &pattern) {
        Some(history) => {
            println!("{} Satisfiable along {} alternating turns:", "✓".green(), pattern.len());
            for event in history {
                println!("    {}", event);
            }
        }
        None => {
            println!("{} No satisfying history of {} alternating turns found", "✗".red(), pattern.len());
        }
    }
    Ok(())
}
