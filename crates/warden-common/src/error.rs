//! Error types for Project Warden.

use thiserror::Error;

/// Top-level error type for Warden operations.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Simulation contract violations (bad transition, unknown actor)
    #[error("Simulation error: {0}")]
    Simulation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
///
/// These are raised before a simulation starts; an actor or scenario
/// carrying one of them is refused rather than patched up.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A tunable is outside its accepted range
    #[error("Invalid value for `{field}`: {value} ({reason})")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f32,
        /// Human readable constraint
        reason: &'static str,
    },

    /// A referenced name does not exist
    #[error("Unknown {kind} `{name}`")]
    UnknownReference {
        /// What kind of thing was referenced
        kind: &'static str,
        /// The name that failed to resolve
        name: String,
    },

    /// The file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// The file could not be read or written
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Checks that `value` is strictly positive.
    pub fn require_positive(field: &'static str, value: f32) -> Result<(), Self> {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                reason: "must be positive",
            })
        }
    }

    /// Checks that `value` is zero or positive.
    pub fn require_non_negative(field: &'static str, value: f32) -> Result<(), Self> {
        if value >= 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                reason: "must not be negative",
            })
        }
    }
}

/// Result type alias for Warden operations.
pub type WardenResult<T> = Result<T, WardenError>;
