//! Learning parameters shared by the weighted strategies.

use parley_core::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};

/// Tunable rates for reinforcement, causal tracing and monotonic handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Fraction removed from an illegal candidate's score (default: 0.3).
    pub punish_rate: f64,
    /// Fraction added to a legal candidate's score by frequency learners
    /// (default: 0.3).
    pub reward_rate: f64,
    /// Fraction added to a legal candidate's score by causal reasoners
    /// (default: 0.6).
    pub reasoner_reward_rate: f64,
    /// Flat decay for an illegal candidate with no traced cause (default: 0.6).
    pub reasoner_decay: f64,
    /// Multiplier applied to a traced commitment's own score (default: 2.0).
    pub causal_factor: f64,
    /// Ceiling of the traced discount fraction (default: 0.9).
    pub causal_cap: f64,
    /// Bonus when an interpretation newly satisfies a monotonic rule (default: 0.05).
    pub monotonic_reward: f64,
    /// Fraction removed from commitments behind unmet monotonic rules (default: 0.3).
    pub monotonic_penalty: f64,
    /// Extra initial weight for pairs found in a prior alignment (default: 0.1).
    pub prior_boost: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            punish_rate: 0.3,
            reward_rate: 0.3,
            reasoner_reward_rate: 0.6,
            reasoner_decay: 0.6,
            causal_factor: 2.0,
            causal_cap: 0.9,
            monotonic_reward: 0.05,
            monotonic_penalty: 0.3,
            prior_boost: 0.1,
        }
    }
}

impl LearningConfig {
    pub fn validate(&self) -> Result<()> {
        ParleyError::check_unit("punish_rate", self.punish_rate)?;
        ParleyError::check_unit("reward_rate", self.reward_rate)?;
        ParleyError::check_unit("reasoner_reward_rate", self.reasoner_reward_rate)?;
        ParleyError::check_unit("reasoner_decay", self.reasoner_decay)?;
        ParleyError::check_unit("causal_cap", self.causal_cap)?;
        ParleyError::check_unit("monotonic_reward", self.monotonic_reward)?;
        ParleyError::check_unit("monotonic_penalty", self.monotonic_penalty)?;
        if self.causal_factor.is_nan() || self.causal_factor < 0.0 {
            return Err(ParleyError::invalid_config(
                "causal_factor",
                self.causal_factor.to_string(),
                "must be non-negative",
            ));
        }
        if self.prior_boost.is_nan() || self.prior_boost < 0.0 {
            return Err(ParleyError::invalid_config(
                "prior_boost",
                self.prior_boost.to_string(),
                "must be non-negative",
            ));
        }
        Ok(())
    }
}
