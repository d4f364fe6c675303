//! Deterministic embedder for deployments without an embedding model.
//!
//! The vector is seeded from the BLAKE3 digest of the text, so identical text maps
//! to an identical unit vector across processes and platforms.

use async_trait::async_trait;

use super::error::{BackendError, BackendResult};
use super::Embedder;
use crate::constants::DEFAULT_EMBEDDING_DIM;

#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed_sync(&self, text: &str) -> BackendResult<Vec<f32>> {
        if self.dim == 0 {
            return Err(BackendError::Embedding(
                "embedding dimension must be non-zero".to_string(),
            ));
        }

        let digest = blake3::hash(text.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest.as_bytes()[..8]);
        let mut state = u64::from_le_bytes(seed);

        let mut embedding = Vec::with_capacity(self.dim);
        for _ in 0..self.dim {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        Ok(embedding)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> BackendResult<Vec<f32>> {
        self.embed_sync(text)
    }
}
