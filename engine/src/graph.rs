use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::config::EngineConfig;

/// Jaccard coefficient of two token sets, in [0, 1].
///
/// Defined as exactly 0 when the union is empty, so two empty sets are not
/// similar and no division by zero occurs.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Produces the weighted edge list over unordered node pairs.
///
/// Swapping in an approximate strategy (min-hash pruning, nearest-neighbor
/// candidates) must not change the graph data model, only which pairs get
/// compared.
pub trait SimilarityStrategy: Sync {
    fn edges(&self, sets: &[HashSet<String>], threshold: f64) -> Vec<(u32, u32, f64)>;
}

/// Exact O(D^2) pairwise comparison.
///
/// The pair space is partitioned by lower index: each worker owns a
/// disjoint range of i and computes every (i, j) with j > i, so the merge
/// is a plain concatenation with no duplicate edges by construction.
pub struct ExactPairwise;

impl SimilarityStrategy for ExactPairwise {
    fn edges(&self, sets: &[HashSet<String>], threshold: f64) -> Vec<(u32, u32, f64)> {
        (0..sets.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                let si = &sets[i];
                (i + 1..sets.len()).filter_map(move |j| {
                    let weight = jaccard(si, &sets[j]);
                    (weight >= threshold).then_some((i as u32, j as u32, weight))
                })
            })
            .collect()
    }
}

/// Undirected weighted document-similarity graph.
///
/// The node set is exactly the corpus document id list, including isolated
/// nodes; node indices are stable and shared with the authority score
/// vector.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    nodes: Vec<String>,
    node_index: HashMap<String, usize>,
    edges: Vec<(u32, u32, f64)>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl SimilarityGraph {
    /// Build the graph over per-document token sets.
    ///
    /// `docs` must be ordered consistently with the corpus document list;
    /// that order defines node indices. Sets larger than the configured cap
    /// are truncated to their sorted prefix before comparison, a
    /// deterministic policy that bounds memory on very large documents.
    pub fn build(
        docs: &[(String, HashSet<String>)],
        strategy: &dyn SimilarityStrategy,
        config: &EngineConfig,
    ) -> Self {
        let sets: Vec<HashSet<String>> = docs
            .par_iter()
            .map(|(_, set)| match config.token_cap {
                Some(cap) if set.len() > cap => {
                    let mut sorted: Vec<&String> = set.iter().collect();
                    sorted.sort();
                    sorted.truncate(cap);
                    sorted.into_iter().cloned().collect()
                }
                _ => set.clone(),
            })
            .collect();

        let edges = strategy.edges(&sets, config.jaccard_threshold);
        let nodes: Vec<String> = docs.iter().map(|(id, _)| id.clone()).collect();
        Self::from_parts(nodes, edges)
    }

    /// Assemble a graph from its persisted logical shape: the full node id
    /// list plus the `(i, j, weight)` edge list over node indices.
    pub fn from_parts(nodes: Vec<String>, edges: Vec<(u32, u32, f64)>) -> Self {
        let node_index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nodes.len()];
        for &(i, j, w) in &edges {
            adjacency[i as usize].push((j as usize, w));
            adjacency[j as usize].push((i as usize, w));
        }
        Self {
            nodes,
            node_index,
            edges,
            adjacency,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(u32, u32, f64)] {
        &self.edges
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Stable index of `id` in the node list, shared with the authority
    /// score vector.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn degree(&self, id: &str) -> usize {
        self.node_index
            .get(id)
            .map(|&i| self.adjacency[i].len())
            .unwrap_or(0)
    }

    /// Neighbor ids of `id` with edge weights; empty for isolated or
    /// unknown nodes.
    pub fn neighbors(&self, id: &str) -> Vec<(&str, f64)> {
        match self.node_index.get(id) {
            Some(&i) => self.adjacency[i]
                .iter()
                .map(|&(j, w)| (self.nodes[j].as_str(), w))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let ia = *self.node_index.get(a)?;
        let ib = *self.node_index.get(b)?;
        self.adjacency[ia]
            .iter()
            .find(|&&(j, _)| j == ib)
            .map(|&(_, w)| w)
    }

    /// Adjacency of the node at `index`, for iteration over the score
    /// vector's index space.
    pub fn adjacency_at(&self, index: usize) -> &[(usize, f64)] {
        &self.adjacency[index]
    }

    /// Fraction of possible edges present: 2E / (N (N - 1)); 0 for fewer
    /// than two nodes.
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        (2 * self.edges.len()) as f64 / (n * (n - 1)) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn build(docs: Vec<(&str, &[&str])>, threshold: f64) -> SimilarityGraph {
        let docs: Vec<(String, HashSet<String>)> = docs
            .into_iter()
            .map(|(id, words)| (id.to_string(), set(words)))
            .collect();
        let config = EngineConfig {
            jaccard_threshold: threshold,
            ..EngineConfig::default()
        };
        SimilarityGraph::build(&docs, &ExactPairwise, &config)
    }

    #[test]
    fn jaccard_is_symmetric() {
        let a = set(&["cat", "sat"]);
        let b = set(&["cat", "ran"]);
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
    }

    #[test]
    fn jaccard_identity_and_empty() {
        let a = set(&["cat", "sat"]);
        let empty = HashSet::new();
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&empty, &empty), 0.0);
        assert_eq!(jaccard(&a, &empty), 0.0);
    }

    #[test]
    fn jaccard_partial_overlap() {
        let a = set(&["cat", "sat"]);
        let b = set(&["cat", "ran"]);
        let w = jaccard(&a, &b);
        assert!((w - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn edges_respect_threshold_and_isolated_nodes_remain() {
        let g = build(
            vec![
                ("a", &["cat", "sat"] as &[&str]),
                ("b", &["cat", "ran"]),
                ("c", &["dogs", "bark"]),
            ],
            0.1,
        );
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 1);
        let w = g.edge_weight("a", "b").unwrap();
        assert!((w - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(g.edge_weight("a", "c"), None);
        assert!(g.contains("c"));
        assert_eq!(g.degree("c"), 0);
    }

    #[test]
    fn no_self_edges_and_weight_symmetric() {
        let g = build(
            vec![("a", &["x", "y"] as &[&str]), ("b", &["x", "y"])],
            0.1,
        );
        assert_eq!(g.edge_weight("a", "a"), None);
        assert_eq!(g.edge_weight("a", "b"), g.edge_weight("b", "a"));
        assert_eq!(g.edge_weight("a", "b"), Some(1.0));
    }

    #[test]
    fn token_cap_truncates_deterministically() {
        let big: Vec<String> = (0..100).map(|i| format!("w{i:03}")).collect();
        let docs = vec![
            ("a".to_string(), big.iter().cloned().collect::<HashSet<_>>()),
            ("b".to_string(), big.iter().cloned().collect::<HashSet<_>>()),
        ];
        let config = EngineConfig {
            token_cap: Some(10),
            jaccard_threshold: 0.1,
            ..EngineConfig::default()
        };
        let g1 = SimilarityGraph::build(&docs, &ExactPairwise, &config);
        let g2 = SimilarityGraph::build(&docs, &ExactPairwise, &config);
        // Identical sorted prefixes keep the pair at weight 1 on every run.
        assert_eq!(g1.edge_weight("a", "b"), Some(1.0));
        assert_eq!(g1.edge_weight("a", "b"), g2.edge_weight("a", "b"));
    }

    #[test]
    fn round_trips_through_parts() {
        let g = build(
            vec![
                ("a", &["cat", "sat"] as &[&str]),
                ("b", &["cat", "ran"]),
                ("c", &["dogs"]),
            ],
            0.1,
        );
        let rebuilt =
            SimilarityGraph::from_parts(g.nodes().to_vec(), g.edges().to_vec());
        assert_eq!(rebuilt.node_count(), g.node_count());
        assert_eq!(rebuilt.edge_count(), g.edge_count());
        assert_eq!(rebuilt.edge_weight("a", "b"), g.edge_weight("a", "b"));
        assert_eq!(rebuilt.degree("c"), 0);
    }

    #[test]
    fn density_matches_definition() {
        let g = build(
            vec![
                ("a", &["x"] as &[&str]),
                ("b", &["x"]),
                ("c", &["y"]),
            ],
            0.1,
        );
        // One edge out of three possible pairs.
        assert!((g.density() - 1.0 / 3.0).abs() < 1e-12);
    }
}
