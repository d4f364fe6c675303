//! Question normalization and cache-key fingerprints.
//!
//! All keys are hex-encoded BLAKE3 digests of the normalized text, prefixed by the
//! cache namespace they belong to. Two questions that differ only in surrounding or
//! repeated whitespace share a fingerprint; anything else (including case) does not.

/// Trims the question and collapses every internal whitespace run into one space.
pub fn normalize_question(question: &str) -> String {
    question.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hex BLAKE3 digest of the normalized question.
#[inline]
pub fn fingerprint(question: &str) -> String {
    blake3::hash(normalize_question(question).as_bytes())
        .to_hex()
        .to_string()
}

#[inline]
pub fn answer_key(question: &str) -> String {
    format!("answer:{}", fingerprint(question))
}

#[inline]
pub fn context_key(question: &str) -> String {
    format!("context:{}", fingerprint(question))
}

#[inline]
pub fn embedding_key(question: &str) -> String {
    format!("embedding:{}", fingerprint(question))
}

/// Memo key for a (passage, query) relevance score.
///
/// The passage is length-prefixed so no split of the same bytes collides.
pub fn relevance_key(passage: &str, query: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(passage.len() as u64).to_le_bytes());
    hasher.update(passage.as_bytes());
    hasher.update(query.as_bytes());
    format!("relevance:{}", hasher.finalize().to_hex())
}
