pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod index;
pub mod matcher;
pub mod pagerank;
pub mod persist;
pub mod rank;
pub mod suggest;
pub mod tokenizer;

pub use config::EngineConfig;
pub use context::{CorpusDoc, SearchContext, SkippedDoc};
pub use error::EngineError;
pub use graph::SimilarityGraph;
pub use index::InvertedIndex;
pub use pagerank::AuthorityScores;
pub use rank::{RankedResult, RankingMode};
