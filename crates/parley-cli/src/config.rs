//! Configuration management for the Parley CLI.

use anyhow::{Context, Result};
use parley_agents::config::LearningConfig;
use parley_runtime::corpus::GeneratorConfig;
use parley_runtime::exchange::ExchangeConfig;
use parley_runtime::experiment::ExperimentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "parley.toml";

/// Parley project configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub learning: LearningConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
}

impl Config {
    /// Load config from parley.toml in the current or parent directories.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = Self::to_toml(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> Result<()> {
        self.experiment.validate()?;
        self.learning.validate()?;
        self.generator.validate()?;
        self.exchange.validate()?;
        Ok(())
    }
}

/// Find parley.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_agents::agent::AgentKind;

    #[test]
    fn default_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.experiment.agent = AgentKind::Reasoner;
        config.experiment.seed = Some(17);
        config.save(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config: Config = toml::from_str("[experiment]\nagent = \"logical\"\ninteractions = 10\n").unwrap();
        assert_eq!(config.experiment.agent, AgentKind::Logical);
        assert_eq!(config.experiment.interactions, 10);
        assert_eq!(config.experiment.repetitions, 5);
        assert_eq!(config.learning, LearningConfig::default());
    }

    #[test]
    fn invalid_values_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[learning]\npunish_rate = 1.5\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("punish_rate"));
    }
}
