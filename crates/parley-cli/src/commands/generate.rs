//! Generate a protocol corpus.

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use parley_runtime::corpus::{save_corpus, ProtocolGenerator};
use std::path::Path;

use crate::config::Config;

pub fn run(count: usize, out: &str, seed: Option<u64>) -> Result<()> {
    let config = Config::load()?;
    let experiment = &config.experiment;
    let pattern = parley_core::types::TurnPattern::alternating(experiment.bound())?;
    let mut generator = ProtocolGenerator::new(
        experiment.vocabulary.clone(),
        pattern,
        config.generator.clone(),
        seed.or(experiment.seed),
    )?;

    println!(
        "{} Generating {} protocols of {} rules over {} symbols...",
        "→".blue(),
        count.to_string().cyan(),
        config.generator.size.to_string().cyan(),
        experiment.vocabulary.len().to_string().cyan()
    );

    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} protocols")?
            .progress_chars("#>-"),
    );

    let prefix = format!("p{}-{}-", experiment.vocabulary.len(), config.generator.size);
    let mut protocols = Vec::with_capacity(count);
    for i in 0..count {
        let protocol = generator
            .generate(format!("{}{}", prefix, i))
            .with_context(|| format!("Failed to generate protocol {}", i))?;
        protocols.push(protocol);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let written = save_corpus(Path::new(out), &protocols)
        .with_context(|| format!("Failed to write corpus to {}", out))?;
    println!(
        "{} Wrote {} protocols to {}",
        "✓".green().bold(),
        written.len().to_string().cyan(),
        out
    );
    Ok(())
}
