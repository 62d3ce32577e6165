//! Error types for the sealing engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by sealing, verification and history access.
#[derive(Debug, Error)]
pub enum SealError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt history in {store:?}: {reason}")]
    CorruptHistory { store: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("verification failed: {mismatches} mismatched, {missing} missing")]
    VerificationFailed { mismatches: usize, missing: usize },

    #[error("seal cancelled")]
    Cancelled,
}

impl SealError {
    /// Attach a path to a raw I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SealError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(store: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SealError::CorruptHistory {
            store: store.into(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for SealError {
    fn from(err: config::ConfigError) -> Self {
        SealError::Config(err.to_string())
    }
}
