//! classify - Benchmark tool for consistent classification.
//!
//! Runs a dataset through the classifier (or straight through the LLM as a
//! baseline) and writes per-item results plus aggregate metrics as JSON.

mod dataset;
mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use conclass_classifier::{Classifier, ClassifierConfig};
use conclass_dsu::{DEFAULT_STATE_PATH, FilePersistence};
use conclass_embed::{Embedder, InputType, OpenAI, Voyage};
use conclass_labeler::{Labeler, OpenAILabeler, OpenAILabelerConfig, normalize_label};
use conclass_vecstore::{MemoryIndex, Pinecone, PineconeConfig, VecIndex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::dataset::DatasetItem;
use crate::report::{CaseResult, RunMetrics};

const SMOKE_TEST_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Semantic cache plus label clustering.
    Vectorize,
    /// Call the LLM for every item.
    Llm,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Vectorize => "vectorize",
            Mode::Llm => "llm",
        }
    }
}

/// Benchmark tool for consistent classification.
#[derive(Parser, Debug)]
#[command(name = "classify")]
#[command(about = "Benchmark tool for consistent classification")]
struct Args {
    /// Dataset file (JSON Lines with `text` and optional `category`)
    dataset: PathBuf,

    /// Treat the dataset as plain text, one item per line
    #[arg(long)]
    lines: bool,

    /// Maximum number of items to classify
    #[arg(long, default_value_t = 500)]
    limit: usize,

    /// Classify only the first 10 items
    #[arg(long)]
    smoke_test: bool,

    #[arg(long, value_enum, default_value_t = Mode::Vectorize)]
    mode: Mode,

    /// Directory for results and metrics files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Cluster state file
    #[arg(long, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,

    /// Content similarity threshold (0 = default 0.80)
    #[arg(long, default_value_t = 0.0)]
    content_threshold: f32,

    /// Label similarity threshold (0 = default 0.80)
    #[arg(long, default_value_t = 0.0)]
    label_threshold: f32,

    /// Chat model used for labeling
    #[arg(long)]
    model: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// Embed with Voyage instead of OpenAI when set
    #[arg(long, env = "VOYAGE_API_KEY", hide_env_values = true)]
    voyage_api_key: Option<String>,

    /// Use Pinecone instead of in-process indexes when set with --pinecone-host
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pinecone_api_key: Option<String>,

    #[arg(long, env = "PINECONE_HOST")]
    pinecone_host: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let limit = if args.smoke_test {
        SMOKE_TEST_SIZE
    } else {
        args.limit
    };
    let items = dataset::load(&args.dataset, args.lines, limit)?;
    info!(
        "loaded {} items from {} (mode {})",
        items.len(),
        args.dataset.display(),
        args.mode.as_str()
    );

    let labeler = Arc::new(OpenAILabeler::new(OpenAILabelerConfig {
        api_key: args.openai_api_key.clone(),
        model: args
            .model
            .clone()
            .unwrap_or_else(|| OpenAILabelerConfig::default().model),
        ..Default::default()
    }));

    let start = Instant::now();
    let (cases, unique_labels, clusters) = match args.mode {
        Mode::Vectorize => run_vectorize(&args, labeler, &items).await?,
        Mode::Llm => run_llm(labeler.as_ref(), &items).await,
    };
    let metrics = RunMetrics::from_cases(
        args.mode.as_str(),
        &cases,
        unique_labels,
        clusters,
        start.elapsed(),
    );

    let (results_path, metrics_path) = report::write(&args.out_dir, &cases, &metrics)?;
    info!(
        "done: {} items, {} hits ({:.1}%), {} labels in {} clusters, p50 {:.0}ms, p95 {:.0}ms",
        metrics.total,
        metrics.cache_hits,
        metrics.hit_rate * 100.0,
        metrics.unique_labels,
        metrics.clusters,
        metrics.user_facing_p50_ms,
        metrics.user_facing_p95_ms
    );
    info!(
        "wrote {} and {}",
        results_path.display(),
        metrics_path.display()
    );
    Ok(())
}

async fn run_vectorize(
    args: &Args,
    labeler: Arc<dyn Labeler>,
    items: &[DatasetItem],
) -> Result<(Vec<CaseResult>, usize, usize)> {
    let (content_index, label_index) = indexes(args);
    let classifier = Classifier::new(
        ClassifierConfig::new(
            embedder(args),
            content_index,
            label_index,
            labeler,
            Arc::new(FilePersistence::new(&args.state)),
        )
        .with_content_threshold(args.content_threshold)
        .with_label_threshold(args.label_threshold),
    )
    .context("failed to start classifier")?;

    let mut cases = Vec::with_capacity(items.len());
    let progress = (items.len() / 20).max(5);
    for (i, item) in items.iter().enumerate() {
        if i % progress == 0 {
            info!("classifying {}/{}", i, items.len());
        }
        let case = match classifier.classify(&item.text).await {
            Ok(r) => CaseResult {
                text: item.text.clone(),
                expected: item.category.clone(),
                label: Some(r.label),
                cache_hit: r.cache_hit,
                confidence: r.confidence,
                user_facing_ms: report::millis(r.user_facing_latency),
                background_ms: report::millis(r.background_latency),
                error: None,
            },
            Err(e) => {
                warn!("item {i}: {e}");
                failed(item, e.to_string())
            }
        };
        cases.push(case);
    }

    let engine = classifier.metrics();
    classifier
        .shutdown()
        .await
        .with_context(|| format!("failed to save cluster state to {}", args.state.display()))?;
    Ok((cases, engine.unique_labels, engine.clusters))
}

async fn run_llm(labeler: &dyn Labeler, items: &[DatasetItem]) -> (Vec<CaseResult>, usize, usize) {
    let mut cases = Vec::with_capacity(items.len());
    let mut labels = std::collections::BTreeSet::new();
    for (i, item) in items.iter().enumerate() {
        let start = Instant::now();
        let case = match labeler.label(&item.text).await {
            Ok(raw) => {
                let label = normalize_label(&raw);
                labels.insert(label.clone());
                CaseResult {
                    text: item.text.clone(),
                    expected: item.category.clone(),
                    label: Some(label),
                    cache_hit: false,
                    confidence: None,
                    user_facing_ms: report::millis(start.elapsed()),
                    background_ms: 0.0,
                    error: None,
                }
            }
            Err(e) => {
                warn!("item {i}: {e}");
                failed(item, e.to_string())
            }
        };
        cases.push(case);
    }
    let unique = labels.len();
    (cases, unique, unique)
}

fn failed(item: &DatasetItem, error: String) -> CaseResult {
    CaseResult {
        text: item.text.clone(),
        expected: item.category.clone(),
        label: None,
        cache_hit: false,
        confidence: None,
        user_facing_ms: 0.0,
        background_ms: 0.0,
        error: Some(error),
    }
}

fn embedder(args: &Args) -> Arc<dyn Embedder> {
    match &args.voyage_api_key {
        Some(key) if !key.is_empty() => {
            info!("embedding with Voyage");
            Arc::new(Voyage::new(key).with_input_type(InputType::Document))
        }
        _ => {
            info!("embedding with OpenAI");
            Arc::new(OpenAI::new(&args.openai_api_key))
        }
    }
}

fn indexes(args: &Args) -> (Arc<dyn VecIndex>, Arc<dyn VecIndex>) {
    match (&args.pinecone_api_key, &args.pinecone_host) {
        (Some(key), Some(host)) if !key.is_empty() && !host.is_empty() => {
            info!("using Pinecone index at {host}");
            let index = |namespace: &str| -> Arc<dyn VecIndex> {
                Arc::new(Pinecone::new(PineconeConfig {
                    api_key: key.clone(),
                    host: host.clone(),
                    namespace: namespace.to_string(),
                }))
            };
            (index("content"), index("label"))
        }
        _ => {
            info!("using in-process indexes (cache is not kept across runs)");
            (Arc::new(MemoryIndex::new()), Arc::new(MemoryIndex::new()))
        }
    }
}
