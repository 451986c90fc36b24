//! Error types for Parley operations.
//!
//! Illegal choices during an interaction are not errors: they end the
//! interaction with a failed [`Outcome`](crate::types::Outcome). The errors
//! here cover translation, persistence and configuration.

use thiserror::Error;

/// Result type for Parley operations.
pub type Result<T> = std::result::Result<T, ParleyError>;

/// Errors that can occur in Parley operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParleyError {
    /// A translation referenced a symbol the mapping does not cover.
    #[error("Incomplete alignment: no mapping for symbol '{symbol}'")]
    IncompleteAlignment { symbol: String },

    /// A translation would read two distinct symbols as the same one.
    #[error("Ambiguous alignment: '{first}' and '{second}' both map to '{target}'")]
    AmbiguousAlignment {
        first: String,
        second: String,
        target: String,
    },

    /// A persisted rule record matched no known rule shape.
    #[error("Malformed rule: {0}")]
    MalformedRule(String),

    /// A turn pattern was empty or named an unknown agent.
    #[error("Invalid turn pattern: {0}")]
    InvalidPattern(String),

    /// A configuration value was rejected.
    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O errors (wrapped).
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(e: serde_json::Error) -> Self {
        ParleyError::Serialization(e.to_string())
    }
}

// Convenience constructors
impl ParleyError {
    pub fn incomplete_alignment(symbol: impl Into<String>) -> Self {
        ParleyError::IncompleteAlignment {
            symbol: symbol.into(),
        }
    }

    pub fn ambiguous_alignment(
        first: impl Into<String>,
        second: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        ParleyError::AmbiguousAlignment {
            first: first.into(),
            second: second.into(),
            target: target.into(),
        }
    }

    pub fn invalid_config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ParleyError::InvalidConfig {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check that a rate lies in `[0, 1]`.
    pub fn check_unit(field: &str, value: f64) -> Result<()> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(Self::invalid_config(field, value.to_string(), "must be within 0.0-1.0"))
        }
    }
}
