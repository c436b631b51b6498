use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::graph::SimilarityGraph;
use crate::pagerank::AuthorityScores;
use crate::rank::RankedResult;

/// A document related to the top query results through the similarity
/// graph. `similarity` is the edge weight to the highest-ranked top result
/// the document is adjacent to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub doc_id: String,
    pub authority: f64,
    pub similarity: f64,
}

/// Collect graph neighbors of the top-ranked documents as suggestions.
///
/// Documents already among `top_results` are excluded. When a candidate
/// neighbors several top documents, the reported similarity is its edge to
/// the highest-ranked one, a fixed rule so output never depends on
/// iteration order. Suggestions sort by authority descending, ties
/// ascending by id, truncated to `top_n`.
pub fn neighbor_suggestions(
    graph: &SimilarityGraph,
    authority: &AuthorityScores,
    top_results: &[RankedResult],
    top_n: usize,
) -> Vec<Suggestion> {
    let top_ids: HashSet<&str> = top_results.iter().map(|r| r.doc_id.as_str()).collect();

    // Walk top results in rank order; first insertion wins, pinning each
    // candidate's similarity to its best-ranked reference.
    let mut candidates: HashMap<&str, f64> = HashMap::new();
    for result in top_results {
        for (neighbor, weight) in graph.neighbors(&result.doc_id) {
            if top_ids.contains(neighbor) {
                continue;
            }
            candidates.entry(neighbor).or_insert(weight);
        }
    }

    let mut suggestions: Vec<Suggestion> = candidates
        .into_iter()
        .map(|(doc_id, similarity)| Suggestion {
            doc_id: doc_id.to_string(),
            authority: authority.score(doc_id),
            similarity,
        })
        .collect();
    suggestions.sort_by(|a, b| {
        b.authority
            .partial_cmp(&a.authority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    suggestions.truncate(top_n);
    suggestions
}
