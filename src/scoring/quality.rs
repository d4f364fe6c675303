use std::sync::LazyLock;

use regex::Regex;

use super::types::QualityMetrics;
use super::vocabulary::Vocabulary;

static ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.|\d+\)").expect("static regex"));
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-•*]").expect("static regex"));

const ENUMERATION_BONUS: f32 = 0.4;
const BULLET_BONUS: f32 = 0.3;
const PARAGRAPH_BONUS: f32 = 0.3;
const MIN_PARAGRAPHS: usize = 3;
const RELEVANCE_BOOST: f32 = 1.2;

/// Scores generated answers. Stateless apart from its vocabulary.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    vocabulary: Vocabulary,
}

impl QualityScorer {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Computes completeness, relevance and structure for `answer`.
    ///
    /// Empty text scores zero on every metric.
    pub fn score(&self, answer: &str) -> QualityMetrics {
        if answer.trim().is_empty() {
            return QualityMetrics::ZERO;
        }
        let lowered = answer.to_lowercase();

        QualityMetrics {
            completeness: round2(self.completeness(&lowered)),
            relevance: round2((self.relevance(&lowered) * RELEVANCE_BOOST).min(1.0)),
            structure: round2(structure(&lowered).min(1.0)),
        }
    }

    fn completeness(&self, lowered: &str) -> f32 {
        let sections = &self.vocabulary.sections;
        if sections.is_empty() {
            return 0.0;
        }
        let covered = sections.iter().filter(|s| s.is_covered_by(lowered)).count();
        covered as f32 / sections.len() as f32
    }

    /// Mean weight of the matched terms; unmatched terms do not dilute it.
    fn relevance(&self, lowered: &str) -> f32 {
        let (sum, hits) = self
            .vocabulary
            .answer_terms
            .iter()
            .filter(|(term, _)| lowered.contains(term.as_str()))
            .fold((0.0f32, 0usize), |(sum, hits), (_, weight)| {
                (sum + weight, hits + 1)
            });
        if hits == 0 { 0.0 } else { sum / hits as f32 }
    }
}

fn structure(text: &str) -> f32 {
    let mut points = 0.0;
    if ENUMERATION.is_match(text) {
        points += ENUMERATION_BONUS;
    }
    if BULLET.is_match(text) {
        points += BULLET_BONUS;
    }
    if text.split("\n\n").count() >= MIN_PARAGRAPHS {
        points += PARAGRAPH_BONUS;
    }
    points
}

#[inline]
fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
