use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::graph::{ExactPairwise, SimilarityGraph, SimilarityStrategy};
use crate::index::{InvertedIndex, TokenizedDoc};
use crate::matcher;
use crate::pagerank::{self, AuthorityScores};
use crate::rank::{self, RankedResult, RankingMode};
use crate::suggest::{self, Suggestion};
use crate::tokenizer;

/// Matched vocabulary terms shown back to advanced-search callers.
const MATCH_PREVIEW: usize = 20;

/// Ranked hits considered when collecting neighbor suggestions.
const SUGGESTION_TOP_K: usize = 3;

/// One source document handed to the build. Content is consumed during
/// tokenization and not retained afterwards.
#[derive(Debug, Clone)]
pub struct CorpusDoc {
    pub id: String,
    pub text: String,
}

/// A document excluded from the build, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDoc {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub corpus_size: usize,
    pub vocabulary_size: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedSearch {
    pub matched_terms: Vec<String>,
    pub matched_term_count: usize,
    pub results: Vec<RankedResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionReport {
    pub top_results: Vec<RankedResult>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub doc_id: String,
    pub authority: f64,
    pub graph_degree: usize,
    pub in_graph: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub corpus_size: usize,
    pub vocabulary_size: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub graph_density: f64,
    pub top_authority: Vec<(String, f64)>,
}

/// The immutable artifact set for one corpus snapshot.
///
/// Built once (offline) and shared by reference with every query; no query
/// mutates it. A rebuild constructs a brand-new context that callers swap
/// in atomically, so readers of the old set are never interleaved with a
/// partial build.
pub struct SearchContext {
    pub config: EngineConfig,
    pub documents: Vec<String>,
    pub skipped: Vec<SkippedDoc>,
    pub index: InvertedIndex,
    pub graph: SimilarityGraph,
    pub authority: AuthorityScores,
}

impl SearchContext {
    /// Build all three artifacts from an in-memory corpus with the exact
    /// pairwise similarity strategy.
    pub fn build(corpus: Vec<CorpusDoc>, skipped: Vec<SkippedDoc>, config: EngineConfig) -> Self {
        Self::build_with_strategy(corpus, skipped, config, &ExactPairwise)
    }

    pub fn build_with_strategy(
        corpus: Vec<CorpusDoc>,
        skipped: Vec<SkippedDoc>,
        config: EngineConfig,
        strategy: &dyn SimilarityStrategy,
    ) -> Self {
        let mut corpus = corpus;
        corpus.sort_by(|a, b| a.id.cmp(&b.id));

        let tokenized: Vec<TokenizedDoc> = corpus
            .par_iter()
            .map(|doc| TokenizedDoc {
                id: doc.id.clone(),
                tokens: tokenizer::tokenize(&doc.text, &config),
            })
            .collect();
        drop(corpus);

        let index = InvertedIndex::build(&tokenized);
        tracing::info!(
            documents = tokenized.len(),
            vocabulary = index.vocabulary_size(),
            "inverted index built"
        );

        let sets: Vec<(String, HashSet<String>)> = tokenized
            .iter()
            .map(|doc| (doc.id.clone(), tokenizer::token_set(&doc.tokens)))
            .collect();
        let graph = SimilarityGraph::build(&sets, strategy, &config);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "similarity graph built"
        );

        let authority = pagerank::compute_authority(&graph, &config);
        tracing::info!(termination = ?authority.termination, "authority scores computed");

        let documents = tokenized.into_iter().map(|doc| doc.id).collect();
        Self {
            config,
            documents,
            skipped,
            index,
            graph,
            authority,
        }
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            corpus_size: self.documents.len(),
            vocabulary_size: self.index.vocabulary_size(),
            graph_nodes: self.graph.node_count(),
            graph_edges: self.graph.edge_count(),
        }
    }

    /// Keyword search for a single term.
    ///
    /// The term is normalized the way corpus text was; an empty query is an
    /// error, an unknown term is an empty result.
    pub fn search(&self, term: &str, mode: RankingMode) -> Result<Vec<RankedResult>, EngineError> {
        let normalized = self.normalize_query(term)?;
        let Some(normalized) = normalized else {
            return Ok(Vec::new());
        };
        Ok(self.rank_terms(&[normalized], mode))
    }

    /// Pattern search over the vocabulary.
    ///
    /// Candidate documents are the union of postings across every matching
    /// term; occurrence counts feeding the ranking are summed across those
    /// terms. The matched-term preview is capped at 20 entries.
    pub fn advanced_search(
        &self,
        pattern: &str,
        mode: RankingMode,
    ) -> Result<AdvancedSearch, EngineError> {
        if pattern.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }
        let matched =
            matcher::match_vocabulary(&self.index, pattern, self.config.pattern_budget)?;
        let results = self.rank_terms(&matched, mode);
        let matched_term_count = matched.len();
        let mut matched_terms = matched;
        matched_terms.truncate(MATCH_PREVIEW);
        Ok(AdvancedSearch {
            matched_terms,
            matched_term_count,
            results,
        })
    }

    /// Top results for `term` plus graph-neighbor suggestions around them.
    /// An unknown term yields an empty report, not an error.
    pub fn suggestions(&self, term: &str, top_n: usize) -> Result<SuggestionReport, EngineError> {
        let normalized = self.normalize_query(term)?;
        let Some(normalized) = normalized else {
            return Ok(SuggestionReport {
                top_results: Vec::new(),
                suggestions: Vec::new(),
            });
        };
        let mut top_results = self.rank_terms(&[normalized], RankingMode::Hybrid);
        top_results.truncate(SUGGESTION_TOP_K);
        let suggestions =
            suggest::neighbor_suggestions(&self.graph, &self.authority, &top_results, top_n);
        Ok(SuggestionReport {
            top_results,
            suggestions,
        })
    }

    pub fn document_info(&self, doc_id: &str) -> Result<DocumentInfo, EngineError> {
        if !self.documents.iter().any(|d| d == doc_id) {
            return Err(EngineError::NotFound(doc_id.to_string()));
        }
        Ok(DocumentInfo {
            doc_id: doc_id.to_string(),
            authority: self.authority.score(doc_id),
            graph_degree: self.graph.degree(doc_id),
            in_graph: self.graph.contains(doc_id),
        })
    }

    pub fn stats(&self) -> StatsReport {
        StatsReport {
            corpus_size: self.documents.len(),
            vocabulary_size: self.index.vocabulary_size(),
            graph_nodes: self.graph.node_count(),
            graph_edges: self.graph.edge_count(),
            graph_density: self.graph.density(),
            top_authority: self.authority.top(10),
        }
    }

    fn normalize_query(&self, term: &str) -> Result<Option<String>, EngineError> {
        if term.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }
        Ok(tokenizer::normalize_term(term))
    }

    fn rank_terms(&self, terms: &[String], mode: RankingMode) -> Vec<RankedResult> {
        rank::rank(
            &self.index,
            &self.authority,
            terms,
            mode,
            self.config.hybrid_weight,
        )
    }
}
