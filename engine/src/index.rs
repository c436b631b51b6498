use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-term postings: document id to occurrence count. An entry is present
/// iff the term occurred at least once in that document after normalization.
pub type Postings = HashMap<String, u32>;

/// Tokenized form of one corpus document, produced once at build time.
#[derive(Debug, Clone)]
pub struct TokenizedDoc {
    pub id: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, Postings>,
}

impl InvertedIndex {
    /// Build the index from every document's token sequence.
    ///
    /// Documents are counted independently (parallel map) and merged by
    /// summation, so the result is identical regardless of processing
    /// order; each (term, doc) cell is produced by exactly one document.
    pub fn build(docs: &[TokenizedDoc]) -> Self {
        let per_doc: Vec<(&str, HashMap<&str, u32>)> = docs
            .par_iter()
            .map(|doc| {
                let mut counts: HashMap<&str, u32> = HashMap::new();
                for token in &doc.tokens {
                    *counts.entry(token.as_str()).or_insert(0) += 1;
                }
                (doc.id.as_str(), counts)
            })
            .collect();

        let mut postings: HashMap<String, Postings> = HashMap::new();
        for (doc_id, counts) in per_doc {
            for (term, count) in counts {
                *postings
                    .entry(term.to_string())
                    .or_default()
                    .entry(doc_id.to_string())
                    .or_insert(0) += count;
            }
        }
        Self { postings }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Iterator over every distinct vocabulary term.
    pub fn terms(&self) -> impl Iterator<Item = &String> {
        self.postings.keys()
    }

    pub fn postings_for(&self, term: &str) -> Option<&Postings> {
        self.postings.get(term)
    }

    /// Occurrence count of `term` in `doc_id`; 0 when absent.
    pub fn occurrences(&self, term: &str, doc_id: &str) -> u32 {
        self.postings
            .get(term)
            .and_then(|p| p.get(doc_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }
}
