use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::graph::SimilarityGraph;

/// How the fixed-point loop ended. Both outcomes are acceptable results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Termination {
    Converged { iterations: usize, delta: f64 },
    MaxIterations { delta: f64 },
}

/// Stationary probability per document from the random walk over the
/// similarity graph. Scores sum to 1 across the full node set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityScores {
    scores: HashMap<String, f64>,
    pub termination: Termination,
}

impl AuthorityScores {
    pub fn from_parts(scores: HashMap<String, f64>, termination: Termination) -> Self {
        Self { scores, termination }
    }

    /// Score for `doc_id`; 0 for documents with no entry (e.g. not a graph
    /// node).
    pub fn score(&self, doc_id: &str) -> f64 {
        self.scores.get(doc_id).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.scores.iter()
    }

    /// The `k` highest-scoring documents, ties broken ascending by id.
    pub fn top(&self, k: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .scores
            .iter()
            .map(|(id, s)| (id.clone(), *s))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(k);
        ranked
    }
}

/// Iterative PageRank over the weighted undirected graph.
///
/// Each node's outgoing mass is split across its neighbors in proportion to
/// edge weight (weights are normalized so every node's outgoing
/// probabilities sum to 1). Dangling nodes redistribute their mass
/// uniformly over all nodes each iteration, so no probability is lost. The
/// loop applies a pure transition over an explicit score vector indexed by
/// the graph's node order and stops when the L1 delta drops below the
/// tolerance or the iteration cap is reached.
pub fn compute_authority(graph: &SimilarityGraph, config: &EngineConfig) -> AuthorityScores {
    let n = graph.node_count();
    if n == 0 {
        return AuthorityScores::from_parts(
            HashMap::new(),
            Termination::Converged {
                iterations: 0,
                delta: 0.0,
            },
        );
    }

    let out_weight: Vec<f64> = (0..n)
        .map(|i| graph.adjacency_at(i).iter().map(|&(_, w)| w).sum())
        .collect();
    let dangling: Vec<usize> = (0..n).filter(|&i| out_weight[i] == 0.0).collect();

    let damping = config.damping;
    let uniform = 1.0 / n as f64;
    let base = (1.0 - damping) * uniform;

    let mut prev = vec![uniform; n];
    let mut termination = Termination::MaxIterations { delta: f64::INFINITY };

    for iteration in 1..=config.max_iterations {
        let dangling_mass: f64 = dangling.iter().map(|&i| prev[i]).sum();
        let shared = damping * dangling_mass * uniform;

        let next: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| {
                let incoming: f64 = graph
                    .adjacency_at(i)
                    .iter()
                    .filter(|&&(_, w)| w > 0.0)
                    .map(|&(j, w)| prev[j] * w / out_weight[j])
                    .sum();
                base + shared + damping * incoming
            })
            .collect();

        let delta: f64 = next
            .iter()
            .zip(prev.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        prev = next;

        if delta < config.tolerance {
            termination = Termination::Converged {
                iterations: iteration,
                delta,
            };
            break;
        }
        termination = Termination::MaxIterations { delta };
    }

    let scores = graph
        .nodes()
        .iter()
        .cloned()
        .zip(prev.iter().copied())
        .collect();
    AuthorityScores::from_parts(scores, termination)
}
