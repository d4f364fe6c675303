use std::collections::HashSet;

use super::vocabulary::Vocabulary;

const KEYWORD_SHARE: f32 = 0.7;
const OVERLAP_SHARE: f32 = 0.3;

/// Scores how useful `passage` is as context for `query`, in `[0, 1]`.
///
/// Blends the normalized weight of domain keywords present as whole tokens in the
/// passage (70%) with the fraction of query tokens the passage shares (30%).
/// Tokens are lower-cased and split on whitespace.
pub fn passage_relevance(passage: &str, query: &str, vocabulary: &Vocabulary) -> f32 {
    let passage_lowered = passage.to_lowercase();
    let query_lowered = query.to_lowercase();
    let passage_words: HashSet<&str> = passage_lowered.split_whitespace().collect();
    let query_words: HashSet<&str> = query_lowered.split_whitespace().collect();

    let terms = &vocabulary.passage_terms;
    let max_keyword_score: f32 = terms.iter().map(|(_, w)| w).sum();
    let keyword_score: f32 = terms
        .iter()
        .filter(|(term, _)| passage_words.contains(term.as_str()))
        .map(|(_, w)| w)
        .sum();
    let keyword_part = if max_keyword_score > 0.0 {
        keyword_score / max_keyword_score
    } else {
        0.0
    };

    let overlap_part = if query_words.is_empty() {
        0.0
    } else {
        query_words.intersection(&passage_words).count() as f32 / query_words.len() as f32
    };

    (keyword_part * KEYWORD_SHARE + overlap_part * OVERLAP_SHARE).min(1.0)
}
