//! Error types for the heap lifecycle checker.
//!
//! Analysis findings (double free, leak, ...) are never represented as
//! `Result::Err` — they are [`crate::domain::bug::BugReport`]s returned
//! alongside a state. This type only covers failures that are not analysis
//! outcomes: a malformed configuration, or an internal invariant violation
//! surfaced for defensive logging.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("state (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckerError>;
