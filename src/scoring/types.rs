use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MIN_COMPLETENESS, DEFAULT_MIN_RELEVANCE};

/// Quality of a generated answer. Every field is in `[0, 1]`, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Share of required content sections the answer touches.
    pub completeness: f32,
    /// Average weight of the domain terms the answer uses, boosted by 1.2.
    pub relevance: f32,
    /// Bonuses for numbered lists, bullets and paragraphing.
    pub structure: f32,
}

impl QualityMetrics {
    pub const ZERO: Self = Self {
        completeness: 0.0,
        relevance: 0.0,
        structure: 0.0,
    };

    pub fn new(completeness: f32, relevance: f32, structure: f32) -> Self {
        Self {
            completeness,
            relevance,
            structure,
        }
    }
}

/// Minimum completeness and relevance an answer needs before it is cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityGate {
    pub min_completeness: f32,
    pub min_relevance: f32,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            min_completeness: DEFAULT_MIN_COMPLETENESS,
            min_relevance: DEFAULT_MIN_RELEVANCE,
        }
    }
}

impl QualityGate {
    /// Returns `true` if both thresholds are met (inclusive).
    #[inline]
    pub fn admits(&self, metrics: &QualityMetrics) -> bool {
        metrics.completeness >= self.min_completeness && metrics.relevance >= self.min_relevance
    }
}
