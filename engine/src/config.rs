use std::collections::HashSet;
use std::time::Duration;

use crate::tokenizer;

/// Knobs for building and querying a corpus snapshot.
///
/// Defaults reproduce the shipped configuration: tokens of at least three
/// letters, a 10% Jaccard threshold, a 50k-token cap per document, and the
/// standard PageRank parameters (damping 0.85, L1 tolerance 1e-6, at most
/// 100 iterations).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum token length in characters, measured after normalization.
    pub min_token_len: usize,
    /// Tokens dropped during normalization. Entries must themselves be
    /// normalized (lowercase, accents folded).
    pub stopwords: HashSet<String>,
    /// Minimum Jaccard coefficient for a similarity edge.
    pub jaccard_threshold: f64,
    /// Cap on a document's token set before pairwise comparison; `None`
    /// compares full sets. Truncation is deterministic (sorted prefix).
    pub token_cap: Option<usize>,
    /// Documents larger than this are skipped at build time with a
    /// `ResourceLimit` record. `None` accepts any size.
    pub max_doc_bytes: Option<u64>,
    /// PageRank damping factor.
    pub damping: f64,
    /// L1 convergence tolerance for the authority iteration.
    pub tolerance: f64,
    /// Iteration cap for the authority computation.
    pub max_iterations: usize,
    /// Amplification constant W in the hybrid score
    /// `occurrences * (1 + authority * W)`.
    pub hybrid_weight: f64,
    /// Wall-clock budget for evaluating one pattern over the vocabulary.
    pub pattern_budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_token_len: 3,
            stopwords: tokenizer::default_stopwords(),
            jaccard_threshold: 0.1,
            token_cap: Some(50_000),
            max_doc_bytes: None,
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
            hybrid_weight: 10.0,
            pattern_budget: Duration::from_secs(2),
        }
    }
}
