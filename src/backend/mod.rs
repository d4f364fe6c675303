//! Collaborator contracts consumed by the query engine.
//!
//! The engine never probes a collaborator for optional behavior: retrieval,
//! embedding and generation are explicit traits injected at construction.
//!
//! - [`corpus::CorpusRetriever`] serves passages from an in-memory corpus.
//! - [`hashing::HashEmbedder`] produces deterministic unit vectors.
//! - [`llm::LlmGenerator`] calls a chat model with timeout and bounded retries.
//! - [`template::TemplateGenerator`] renders answers locally (no provider).

pub mod corpus;
pub mod error;
pub mod hashing;
pub mod llm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod template;
pub mod types;


pub use corpus::CorpusRetriever;
pub use error::{BackendError, BackendResult};
pub use hashing::HashEmbedder;
pub use llm::{LlmGenerator, RetryPolicy};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockEmbedder, MockGenerator, MockRetriever};
pub use template::TemplateGenerator;
pub use types::{Generation, Passage};

use async_trait::async_trait;

#[async_trait]
/// Returns ranked passages for a question, best first.
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> BackendResult<Vec<Passage>>;
}

#[async_trait]
/// Maps text to a fixed-size vector.
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> BackendResult<Vec<f32>>;
}

#[async_trait]
/// Produces an answer for a question given assembled context.
///
/// Implementations own their timeout and retry policy; a returned error means the
/// backend gave up.
pub trait Generator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> BackendResult<Generation>;
}
