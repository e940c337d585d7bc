//! Error types for vitalog-core

use thiserror::Error;

/// Main error type for the vitalog-core library
///
/// Store failures propagate to the caller untouched (no local retry); a
/// missing merge target is not an error but a normal branch, so it is
/// modeled with `Option`/`MergeOutcome` rather than a variant here.
#[derive(Error, Debug)]
pub enum Error {
    /// Event store error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Input contract violation (e.g. an empty merge batch)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Poller error (API failure surfaced by a poller implementation)
    #[error("poller error: {0}")]
    Poller(String),
}

/// Result type alias for vitalog-core
pub type Result<T> = std::result::Result<T, Error>;
