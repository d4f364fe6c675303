//! Keyword tables behind the scoring heuristics.

/// A content category an answer is expected to cover, detected by any keyword hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSection {
    pub name: String,
    pub keywords: Vec<String>,
}

impl ContentSection {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Substring match against already lower-cased text.
    pub fn is_covered_by(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Keyword tables for answer quality and passage relevance.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    /// Sections counted by completeness, each worth `1 / sections.len()`.
    pub sections: Vec<ContentSection>,
    /// Weighted domain terms for answer relevance (substring match).
    pub answer_terms: Vec<(String, f32)>,
    /// Weighted domain terms for passage relevance (whole-token match).
    pub passage_terms: Vec<(String, f32)>,
}

fn weighted(terms: &[(&str, f32)]) -> Vec<(String, f32)> {
    terms.iter().map(|(t, w)| (t.to_string(), *w)).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            sections: vec![
                // ingredients
                ContentSection::new("재료", &["재료", "준비물", "필요한", "있어야"]),
                // procedure
                ContentSection::new("조리", &["조리", "만들기", "요리", "방법", "과정"]),
                // tips
                ContentSection::new("팁", &["팁", "주의", "포인트", "중요", "비법"]),
            ],
            answer_terms: weighted(&[
                ("요리", 1.0),
                ("레시피", 1.0),
                ("만들기", 0.9),
                ("조리법", 0.9),
                ("끓이기", 0.8),
                ("볶기", 0.8),
                ("굽기", 0.8),
                ("재료", 0.8),
                ("양념", 0.8),
                ("간", 0.7),
                ("맛", 0.7),
                ("음식", 0.7),
            ]),
            passage_terms: weighted(&[
                ("레시피", 1.0),
                ("요리", 1.0),
                ("만들기", 0.8),
                ("재료", 0.9),
                ("조리", 0.9),
                ("끓이기", 0.7),
                ("볶기", 0.7),
                ("굽기", 0.7),
                ("찌기", 0.7),
                ("양념", 0.8),
                ("간", 0.6),
                ("맛", 0.6),
            ]),
        }
    }
}
