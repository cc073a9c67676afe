//! Unified error types for the EVE evidence pipeline
//!
//! This module provides a common error type [`EveError`] that can represent
//! failures from any part of the system. Domain-specific failures convert
//! into `EveError` for uniform handling at API boundaries; only top-level
//! entry points format errors for users.

use thiserror::Error;

/// Unified error type for all EVE operations.
#[derive(Error, Debug)]
pub enum EveError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors (unknown zone, registry mismatch, missing lock file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resolution mismatch after alignment
    #[error("Resolution mismatch: {0}")]
    Alignment(String),

    /// Existing vault entry with a different root hash and no force-reseal
    #[error(
        "Vault conflict for {dataset_eve_id}: sealed root hash {sealed} != computed {computed} \
         (pass force_reseal to supersede)"
    )]
    VaultConflict {
        dataset_eve_id: String,
        sealed: String,
        computed: String,
    },

    /// Chain record whose hashes do not verify
    #[error("Chain integrity violation at event {index}: {detail}")]
    ChainBreak { index: u64, detail: String },

    /// A query window that matched zero rows
    #[error("no data for zone {zone} between {from} and {to}")]
    NoData {
        zone: String,
        from: String,
        to: String,
    },

    /// No FX rate for the requested month
    #[error("no FX rate for {month}; table covers {covered}")]
    FxMissing { month: String, covered: String },

    /// LP solver errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using EveError.
pub type EveResult<T> = Result<T, EveError>;

impl From<anyhow::Error> for EveError {
    fn from(err: anyhow::Error) -> Self {
        EveError::Other(err.to_string())
    }
}

impl From<String> for EveError {
    fn from(s: String) -> Self {
        EveError::Other(s)
    }
}

impl From<&str> for EveError {
    fn from(s: &str) -> Self {
        EveError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for EveError {
    fn from(err: serde_json::Error) -> Self {
        EveError::Parse(err.to_string())
    }
}
