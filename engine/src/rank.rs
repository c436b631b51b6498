use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::index::InvertedIndex;
use crate::pagerank::AuthorityScores;

/// How query results are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    Occurrences,
    Authority,
    #[default]
    Hybrid,
}

impl RankingMode {
    /// Parse a caller-supplied mode string; anything unrecognized falls
    /// back to hybrid, the default mode.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "occurrences" => Self::Occurrences,
            "authority" => Self::Authority,
            _ => Self::Hybrid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Occurrences => "occurrences",
            Self::Authority => "authority",
            Self::Hybrid => "hybrid",
        }
    }
}

/// One ranked hit: derived at query time, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub doc_id: String,
    pub occurrences: u32,
    pub authority: f64,
    pub score: f64,
}

/// Rank every document carrying at least one of `terms`.
///
/// A document's occurrence count is the sum of its counts across all the
/// given vocabulary terms; its authority score is independent of the term
/// count. The hybrid score is `occurrences * (1 + authority * weight)`,
/// monotone in both inputs. Results sort descending by score with ties
/// broken ascending by document id, so output order is deterministic.
pub fn rank(
    index: &InvertedIndex,
    authority: &AuthorityScores,
    terms: &[String],
    mode: RankingMode,
    weight: f64,
) -> Vec<RankedResult> {
    let mut occurrences: HashMap<&str, u32> = HashMap::new();
    for term in terms {
        if let Some(postings) = index.postings_for(term) {
            for (doc_id, count) in postings {
                *occurrences.entry(doc_id.as_str()).or_insert(0) += count;
            }
        }
    }

    let mut results: Vec<RankedResult> = occurrences
        .into_iter()
        .map(|(doc_id, occ)| {
            let auth = authority.score(doc_id);
            let score = match mode {
                RankingMode::Occurrences => occ as f64,
                RankingMode::Authority => auth,
                RankingMode::Hybrid => occ as f64 * (1.0 + auth * weight),
            };
            RankedResult {
                doc_id: doc_id.to_string(),
                occurrences: occ,
                authority: auth,
                score,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    results
}
