use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures reported by retrieval, embedding or generation backends.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("generation timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("generation failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },

    #[error("failed to load corpus from {path}: {reason}")]
    Corpus { path: PathBuf, reason: String },
}

pub type BackendResult<T> = Result<T, BackendError>;
