use thiserror::Error;

use crate::backend::BackendError;
use crate::gate::GateError;

/// Why a single query did not produce a direct answer.
///
/// Never returned from the engine's public surface: [`QueryEngine`](super::QueryEngine)
/// folds every variant into a [`QueryResult`](super::QueryResult).
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("generator returned an empty answer")]
    EmptyAnswer,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("query task failed: {0}")]
    TaskFailed(String),
}

pub type QueryOutcome<T> = Result<T, QueryError>;
