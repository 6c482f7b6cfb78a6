// Bounded keyword-overlap scoring.
// Per-corpus document frequencies and IDF weights, built once. The score is a
// length-normalized IDF sum over shared tokens, capped so it can only nudge
// vector similarity, never outweigh it.

use crate::corpus::Corpus;
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;

/// Upper bound on any lexical score
pub const LEXICAL_SCORE_CAP: f64 = 0.2;

/// Query tokens, sorted and de-duplicated so sums are order-stable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTokens(Vec<String>);

impl QueryTokens {
    pub fn new(text: &str) -> Self {
        Self(LexicalIndex::tokenize(text).into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    // term -> number of entries containing it
    doc_freqs: AHashMap<String, u32>,
    // term -> smoothed inverse document frequency
    idf: AHashMap<String, f64>,
    // ordinal -> distinct tokens of that entry
    doc_tokens: Vec<AHashSet<String>>,
    total_docs: usize,
}

impl LexicalIndex {
    /// Lowercase ASCII-alphanumeric runs
    pub fn tokenize(text: &str) -> BTreeSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn build(corpus: &Corpus) -> Self {
        let doc_tokens: Vec<AHashSet<String>> = corpus
            .entries()
            .iter()
            .map(|entry| Self::tokenize(&entry.lexical_text()).into_iter().collect())
            .collect();

        let mut doc_freqs: AHashMap<String, u32> = AHashMap::new();
        for tokens in &doc_tokens {
            for token in tokens {
                *doc_freqs.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let total_docs = doc_tokens.len();
        let idf = doc_freqs
            .iter()
            .map(|(term, &df)| (term.clone(), Self::smoothed_idf(total_docs, df)))
            .collect();

        Self {
            doc_freqs,
            idf,
            doc_tokens,
            total_docs,
        }
    }

    /// `ln((1 + N) / (1 + df)) + 1`, strictly positive
    fn smoothed_idf(total_docs: usize, df: u32) -> f64 {
        ((1.0 + total_docs as f64) / (1.0 + df as f64)).ln() + 1.0
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.doc_freqs.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.total_docs
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_docs == 0
    }

    /// Score one entry against a query, in `[0, LEXICAL_SCORE_CAP]`
    pub fn score(&self, query: &QueryTokens, ordinal: usize) -> f64 {
        let Some(tokens) = self.doc_tokens.get(ordinal) else {
            return 0.0;
        };
        if tokens.is_empty() || query.is_empty() {
            return 0.0;
        }

        let overlap: f64 = query
            .iter()
            .filter(|t| tokens.contains(*t))
            .map(|t| self.idf(t).unwrap_or(0.0))
            .sum();

        let length_norm = 1.0 + (1.0 + tokens.len() as f64).ln();
        (overlap / length_norm).clamp(0.0, LEXICAL_SCORE_CAP)
    }
}
