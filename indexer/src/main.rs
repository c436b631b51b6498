use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use engine::persist::{load_manifest, save_context, ArtifactPaths};
use engine::{CorpusDoc, EngineConfig, EngineError, SearchContext, SkippedDoc};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build corpus search artifacts: inverted index, similarity graph, authority scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the artifact set from a directory of plain-text documents
    Build {
        /// Corpus directory containing .txt files
        #[arg(long)]
        corpus: String,
        /// Output artifact directory
        #[arg(long)]
        output: String,
        /// Minimum Jaccard coefficient for a similarity edge
        #[arg(long, default_value_t = 0.1)]
        threshold: f64,
        /// Minimum token length in characters
        #[arg(long, default_value_t = 3)]
        min_token_len: usize,
        /// Cap on a document's token set before pairwise comparison (0 = uncapped)
        #[arg(long, default_value_t = 50_000)]
        token_cap: usize,
        /// Skip documents larger than this many bytes (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_doc_bytes: u64,
        /// PageRank damping factor
        #[arg(long, default_value_t = 0.85)]
        damping: f64,
        /// L1 convergence tolerance for the authority iteration
        #[arg(long, default_value_t = 1e-6)]
        tolerance: f64,
        /// Iteration cap for the authority computation
        #[arg(long, default_value_t = 100)]
        max_iterations: usize,
    },
    /// Print the manifest of an existing artifact set
    Inspect {
        /// Artifact directory
        #[arg(long)]
        artifacts: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            corpus,
            output,
            threshold,
            min_token_len,
            token_cap,
            max_doc_bytes,
            damping,
            tolerance,
            max_iterations,
        } => {
            let config = EngineConfig {
                min_token_len,
                jaccard_threshold: threshold,
                token_cap: (token_cap > 0).then_some(token_cap),
                max_doc_bytes: (max_doc_bytes > 0).then_some(max_doc_bytes),
                damping,
                tolerance,
                max_iterations,
                ..EngineConfig::default()
            };
            build(&corpus, &output, config)
        }
        Commands::Inspect { artifacts } => inspect(&artifacts),
    }
}

fn build(corpus_dir: &str, output: &str, config: EngineConfig) -> Result<()> {
    let corpus_path = Path::new(corpus_dir);
    if !corpus_path.is_dir() {
        bail!("corpus directory not found: {corpus_dir}");
    }

    let started = Instant::now();
    let (corpus, skipped) = read_corpus(corpus_path, &config);
    if corpus.is_empty() {
        bail!("no readable documents under {corpus_dir}");
    }
    tracing::info!(
        documents = corpus.len(),
        skipped = skipped.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "corpus loaded"
    );

    let build_started = Instant::now();
    let context = SearchContext::build(corpus, skipped, config);
    tracing::info!(
        elapsed_s = build_started.elapsed().as_secs_f64(),
        "artifacts built"
    );

    let paths = ArtifactPaths::new(output);
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    save_context(&paths, &context, created_at)?;

    let health = context.health();
    tracing::info!(
        output,
        corpus_size = health.corpus_size,
        vocabulary = health.vocabulary_size,
        graph_nodes = health.graph_nodes,
        graph_edges = health.graph_edges,
        total_s = started.elapsed().as_secs_f64(),
        "build complete"
    );
    Ok(())
}

/// Read every .txt document under the corpus root, id'd by file name.
///
/// Decoding is lenient (invalid UTF-8 is replaced) and per-document
/// failures are recorded and skipped; one unreadable or oversized file
/// never aborts the build.
fn read_corpus(root: &Path, config: &EngineConfig) -> (Vec<CorpusDoc>, Vec<SkippedDoc>) {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path().is_file()
                && e.path()
                    .extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext == "txt")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    let mut corpus = Vec::new();
    let mut skipped = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for path in files {
        let id = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        // Document ids are file names; a second file with the same name
        // would double-count occurrences, so only the first wins.
        if !seen.insert(id.clone()) {
            tracing::warn!(%id, path = %path.display(), "duplicate document id, skipping");
            skipped.push(SkippedDoc {
                id,
                reason: "duplicate document id".to_string(),
            });
            continue;
        }

        if let Some(limit) = config.max_doc_bytes {
            match fs::metadata(&path) {
                Ok(meta) if meta.len() > limit => {
                    let err = EngineError::ResourceLimit(format!(
                        "{} bytes over cap {limit}",
                        meta.len()
                    ));
                    tracing::warn!(%id, error = %err, "skipping document");
                    skipped.push(SkippedDoc {
                        id,
                        reason: err.to_string(),
                    });
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    let err = EngineError::DataIntegrity(e.to_string());
                    tracing::warn!(%id, error = %err, "skipping document");
                    skipped.push(SkippedDoc {
                        id,
                        reason: err.to_string(),
                    });
                    continue;
                }
            }
        }

        match fs::read(&path) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                corpus.push(CorpusDoc { id, text });
            }
            Err(e) => {
                let err = EngineError::DataIntegrity(e.to_string());
                tracing::warn!(%id, error = %err, "skipping document");
                skipped.push(SkippedDoc {
                    id,
                    reason: err.to_string(),
                });
            }
        }
    }
    (corpus, skipped)
}

fn inspect(artifacts: &str) -> Result<()> {
    let manifest = load_manifest(&ArtifactPaths::new(artifacts))?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}
