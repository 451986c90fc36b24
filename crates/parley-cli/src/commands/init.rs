//! Initialize a new Parley project.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE};

pub fn run(path: Option<String>) -> Result<()> {
    let base_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing Parley project...", "→".blue());

    for dir in ["corpus", "results"] {
        let dir = base_path.join(dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        println!("  {} Created {}", "✓".green(), dir.display());
    }

    let config_path = base_path.join(CONFIG_FILE);
    if !config_path.exists() {
        Config::default().save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    println!();
    println!("{} Parley project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} parley generate --out corpus", "1.".blue());
    println!("  {} parley run --corpus corpus --out results/report.json", "2.".blue());

    Ok(())
}
