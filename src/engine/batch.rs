//! Fan-out of many questions through one engine.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, instrument};

use super::QueryEngine;
use super::error::QueryError;
use super::types::QueryResult;

/// Runs a batch of questions concurrently under the engine's gate.
///
/// Each question runs in its own task, so a failure (or panic) in one item is
/// reported at its position and never disturbs its siblings. Results are joined
/// positionally: output order is input order, whatever order tasks finish in.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    engine: Arc<QueryEngine>,
}

impl BatchRunner {
    pub fn new(engine: Arc<QueryEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<QueryEngine> {
        &self.engine
    }

    #[instrument(skip_all, fields(batch_size = tracing::field::Empty))]
    pub async fn run<I, S>(&self, questions: I) -> Vec<QueryResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handles: Vec<_> = questions
            .into_iter()
            .map(|question| {
                let engine = Arc::clone(&self.engine);
                let question: String = question.into();
                tokio::spawn(async move { engine.ask(&question).await })
            })
            .collect();

        tracing::Span::current().record("batch_size", handles.len());
        debug!("Batch fanned out");

        join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| match joined {
                Ok(result) => result,
                Err(e) => self.engine.fail(
                    QueryError::TaskFailed(format!("batch item {index}: {e}")),
                    Duration::ZERO,
                ),
            })
            .collect()
    }
}
