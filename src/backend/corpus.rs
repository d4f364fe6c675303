//! In-memory passage corpus.
//!
//! Passages are ranked by how many distinct lower-cased query tokens they contain;
//! ties keep corpus order. Passages sharing no token with the query are not returned.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use super::error::{BackendError, BackendResult};
use super::types::Passage;
use super::Retriever;
use crate::constants::DEFAULT_RETRIEVE_K;

#[derive(Debug, Clone)]
pub struct CorpusRetriever {
    passages: Vec<Passage>,
    top_k: usize,
}

impl CorpusRetriever {
    pub fn new(passages: Vec<Passage>, top_k: usize) -> Self {
        Self { passages, top_k }
    }

    /// A retriever with no passages; every query retrieves nothing.
    pub fn empty() -> Self {
        Self::new(Vec::new(), DEFAULT_RETRIEVE_K)
    }

    /// Loads a JSON array of `{"content": "..."}` objects.
    pub async fn load(path: &Path, top_k: usize) -> BackendResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BackendError::Corpus {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let passages: Vec<Passage> =
            serde_json::from_str(&raw).map_err(|e| BackendError::Corpus {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(path = %path.display(), passages = passages.len(), "Loaded passage corpus");
        Ok(Self::new(passages, top_k))
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    fn rank(&self, question: &str) -> Vec<Passage> {
        let lowered = question.to_lowercase();
        let query_tokens: HashSet<&str> = lowered.split_whitespace().collect();
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, usize)> = self
            .passages
            .iter()
            .enumerate()
            .filter_map(|(idx, passage)| {
                let content = passage.content.to_lowercase();
                let hits = query_tokens
                    .iter()
                    .filter(|token| content.contains(**token))
                    .count();
                (hits > 0).then_some((idx, hits))
            })
            .collect();

        // Stable sort keeps corpus order among equal scores.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(idx, _)| self.passages[idx].clone())
            .collect()
    }
}

#[async_trait]
impl Retriever for CorpusRetriever {
    async fn retrieve(&self, question: &str) -> BackendResult<Vec<Passage>> {
        let ranked = self.rank(question);
        debug!(retrieved = ranked.len(), "Corpus retrieval complete");
        Ok(ranked)
    }
}
