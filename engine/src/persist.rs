use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::context::{SearchContext, SkippedDoc};
use crate::error::EngineError;
use crate::graph::SimilarityGraph;
use crate::index::InvertedIndex;
use crate::pagerank::AuthorityScores;

pub const ARTIFACT_VERSION: u32 = 1;

/// File layout of one artifact set under a root directory.
pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    fn index(&self) -> PathBuf {
        self.root.join("index.bin")
    }
    fn graph(&self) -> PathBuf {
        self.root.join("graph.bin")
    }
    fn authority(&self) -> PathBuf {
        self.root.join("authority.bin")
    }
    fn documents(&self) -> PathBuf {
        self.root.join("documents.bin")
    }
    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

/// Graph artifact in its logical shape: the full node id list plus the
/// `(i, j, weight)` edge list over node indices.
#[derive(Serialize, Deserialize)]
struct GraphArtifact {
    nodes: Vec<String>,
    edges: Vec<(u32, u32, f64)>,
}

#[derive(Serialize, Deserialize)]
struct DocumentsArtifact {
    documents: Vec<String>,
    skipped: Vec<SkippedDoc>,
}

/// Human-readable build manifest, written alongside the binary artifacts.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub created_at: String,
    pub corpus_size: usize,
    pub vocabulary_size: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub skipped_documents: usize,
    pub min_token_len: usize,
    pub jaccard_threshold: f64,
    pub token_cap: Option<usize>,
    pub damping: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub hybrid_weight: f64,
}

fn integrity<E: std::fmt::Display>(path: &Path, err: E) -> EngineError {
    EngineError::DataIntegrity(format!("{}: {}", path.display(), err))
}

fn save_bincode<T: Serialize>(path: &Path, value: &T) -> Result<(), EngineError> {
    let file = File::create(path).map_err(|e| integrity(path, e))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value).map_err(|e| integrity(path, e))?;
    writer.flush().map_err(|e| integrity(path, e))
}

fn load_bincode<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, EngineError> {
    let file = File::open(path).map_err(|e| integrity(path, e))?;
    bincode::deserialize_from(BufReader::new(file)).map_err(|e| integrity(path, e))
}

/// Persist a built context as a complete artifact set.
pub fn save_context(
    paths: &ArtifactPaths,
    context: &SearchContext,
    created_at: String,
) -> Result<(), EngineError> {
    create_dir_all(&paths.root).map_err(|e| integrity(&paths.root, e))?;

    save_bincode(&paths.index(), &context.index)?;
    save_bincode(
        &paths.graph(),
        &GraphArtifact {
            nodes: context.graph.nodes().to_vec(),
            edges: context.graph.edges().to_vec(),
        },
    )?;
    save_bincode(&paths.authority(), &context.authority)?;
    save_bincode(
        &paths.documents(),
        &DocumentsArtifact {
            documents: context.documents.clone(),
            skipped: context.skipped.clone(),
        },
    )?;

    let manifest = Manifest {
        version: ARTIFACT_VERSION,
        created_at,
        corpus_size: context.documents.len(),
        vocabulary_size: context.index.vocabulary_size(),
        graph_nodes: context.graph.node_count(),
        graph_edges: context.graph.edge_count(),
        skipped_documents: context.skipped.len(),
        min_token_len: context.config.min_token_len,
        jaccard_threshold: context.config.jaccard_threshold,
        token_cap: context.config.token_cap,
        damping: context.config.damping,
        tolerance: context.config.tolerance,
        max_iterations: context.config.max_iterations,
        hybrid_weight: context.config.hybrid_weight,
    };
    let meta_path = paths.meta();
    let json =
        serde_json::to_string_pretty(&manifest).map_err(|e| integrity(&meta_path, e))?;
    let mut file = File::create(&meta_path).map_err(|e| integrity(&meta_path, e))?;
    file.write_all(json.as_bytes())
        .map_err(|e| integrity(&meta_path, e))
}

pub fn load_manifest(paths: &ArtifactPaths) -> Result<Manifest, EngineError> {
    let path = paths.meta();
    let file = File::open(&path).map_err(|e| integrity(&path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| integrity(&path, e))
}

/// Load a complete artifact set back into an immutable context.
///
/// Scalar config fields come from the manifest so query-time behavior (the
/// hybrid weight above all) matches the build; the stopword set is not
/// persisted because query normalization does not consult it.
pub fn load_context(paths: &ArtifactPaths) -> Result<SearchContext, EngineError> {
    let manifest = load_manifest(paths)?;
    if manifest.version != ARTIFACT_VERSION {
        return Err(EngineError::DataIntegrity(format!(
            "{}: unsupported artifact version {}",
            paths.meta().display(),
            manifest.version
        )));
    }

    let index: InvertedIndex = load_bincode(&paths.index())?;
    let graph_artifact: GraphArtifact = load_bincode(&paths.graph())?;
    let authority: AuthorityScores = load_bincode(&paths.authority())?;
    let documents_artifact: DocumentsArtifact = load_bincode(&paths.documents())?;

    let node_count = graph_artifact.nodes.len() as u32;
    if graph_artifact
        .edges
        .iter()
        .any(|&(i, j, _)| i >= node_count || j >= node_count)
    {
        return Err(EngineError::DataIntegrity(format!(
            "{}: edge references a node outside the node list",
            paths.graph().display()
        )));
    }

    let config = EngineConfig {
        min_token_len: manifest.min_token_len,
        jaccard_threshold: manifest.jaccard_threshold,
        token_cap: manifest.token_cap,
        damping: manifest.damping,
        tolerance: manifest.tolerance,
        max_iterations: manifest.max_iterations,
        hybrid_weight: manifest.hybrid_weight,
        ..EngineConfig::default()
    };

    Ok(SearchContext {
        config,
        documents: documents_artifact.documents,
        skipped: documents_artifact.skipped,
        index,
        graph: SimilarityGraph::from_parts(graph_artifact.nodes, graph_artifact.edges),
        authority,
    })
}
