//! Error types for the duel agent core.
//!
//! The per-tick path never fails: degenerate inputs are sanitized in place.
//! Errors only surface when loading or validating configuration and when
//! encoding or decoding agent snapshots.

use thiserror::Error;

/// Result type alias using [`DuelError`].
pub type Result<T> = std::result::Result<T, DuelError>;

/// Top-level error type for the duel agent core.
#[derive(Debug, Error)]
pub enum DuelError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigIo {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// A configuration value is out of its valid range.
    #[error("Invalid config value for '{field}': {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Snapshot encoding or decoding failed.
    #[error("Invalid agent snapshot: {0}")]
    Snapshot(String),
}

impl DuelError {
    /// Shorthand for an [`DuelError::InvalidConfig`] error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
