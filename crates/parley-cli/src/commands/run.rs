//! Run an alignment experiment.

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use parley_agents::agent::AgentKind;
use parley_core::types::AgentId;
use parley_runtime::corpus::load_corpus;
use parley_runtime::exchange::Exchange;
use parley_runtime::experiment::{Experiment, ExperimentReport};
use parley_runtime::interaction::{InteractionEvent, InteractionObserver};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;

/// Command-line values that take precedence over parley.toml.
#[derive(Debug, Default)]
pub struct Overrides {
    pub agent: Option<AgentKind>,
    pub interactions: Option<usize>,
    pub repetitions: Option<usize>,
    pub seed: Option<u64>,
}

/// Advances the bar once per finished interaction.
struct Progress {
    bar: ProgressBar,
    verbose: bool,
}

impl InteractionObserver for Progress {
    fn observe(&self, event: &InteractionEvent) {
        match event {
            InteractionEvent::Finished { agent, outcome } => {
                if *agent == AgentId::FIRST {
                    self.bar.inc(1);
                }
                if self.verbose {
                    self.bar.println(format!("  agent {}: {}", agent, outcome));
                }
            }
            InteractionEvent::Failed { agent, turn, cause } if self.verbose => {
                self.bar.println(format!("  agent {} failed at turn {}: {}", agent, turn, cause));
            }
            _ => {}
        }
    }
}

pub fn run(overrides: Overrides, corpus: Option<&str>, out: Option<&str>, verbose: bool) -> Result<()> {
    let mut config = Config::load()?;
    let experiment = &mut config.experiment;
    if let Some(agent) = overrides.agent {
        experiment.agent = agent;
    }
    if let Some(n) = overrides.interactions {
        experiment.interactions = n;
    }
    if let Some(n) = overrides.repetitions {
        experiment.repetitions = n;
    }
    if overrides.seed.is_some() {
        experiment.seed = overrides.seed;
    }
    config.validate()?;
    debug!(?config, "Effective configuration");

    let total = (config.experiment.interactions * config.experiment.repetitions) as u64;
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} interactions")?
            .progress_chars("#>-"),
    );
    let exchange = Exchange::new(config.exchange.clone()).with_observer(Arc::new(Progress {
        bar: bar.clone(),
        verbose,
    }));

    let mut runner = Experiment::new(config.experiment.clone())
        .with_learning(config.learning.clone())
        .with_generator(config.generator.clone())
        .with_exchange(exchange);
    if let Some(dir) = corpus {
        let protocols = load_corpus(Path::new(dir))
            .with_context(|| format!("Failed to load corpus from {}", dir))?;
        println!("{} Loaded {} protocols from {}", "→".blue(), protocols.len().to_string().cyan(), dir);
        runner = runner.with_corpus(protocols);
    }

    println!(
        "{} Running {} x {} interactions with {} agents...",
        "→".blue(),
        config.experiment.repetitions.to_string().cyan(),
        config.experiment.interactions.to_string().cyan(),
        config.experiment.agent.to_string().cyan()
    );

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(runner.run())?;
    bar.finish_and_clear();

    print_summary(&report);

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report: {}", path))?;
        println!("  {} Report written to {}", "✓".green(), path);
    }
    Ok(())
}

fn print_summary(report: &ExperimentReport) {
    println!();
    println!("{} Experiment {} complete", "✓".green().bold(), report.run_id.to_string().dimmed());
    println!("  Strategy:         {}", report.label.cyan());
    println!("  Final F-score:    {}", format!("{:.3}", report.final_f_score()).green());
    let converged = report.convergence.iter().filter(|&&c| c < report.f_scores.len()).count();
    println!(
        "  Converged:        {}/{} (mean point {:.1})",
        converged,
        report.convergence.len(),
        report.mean_convergence
    );
    for (i, successes) in report.successes.iter().enumerate() {
        let total: usize = successes.iter().sum();
        println!("  Agent {} successes: {}", i, total);
    }
    println!("  Mean exchange:    {:.2} ms", report.mean_exchange_ms);
}
