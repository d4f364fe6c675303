//! Heuristic answer-quality and passage-relevance scoring.
//!
//! [`QualityScorer`] turns a generated answer into three 0–1 metrics that decide
//! whether the answer is worth caching (see [`QualityGate`]). [`passage_relevance`]
//! scores a retrieved passage against the question during context assembly.
//!
//! Both are pure functions of their input text and a [`Vocabulary`]; the default
//! vocabulary targets Korean home-cooking content.

pub mod quality;
pub mod relevance;
pub mod types;
pub mod vocabulary;


pub use quality::QualityScorer;
pub use relevance::passage_relevance;
pub use types::{QualityGate, QualityMetrics};
pub use vocabulary::{ContentSection, Vocabulary};
