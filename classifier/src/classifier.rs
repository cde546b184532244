use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use conclass_dsu::{ClusterPersistence, LabelClusters, PersistError};
use conclass_embed::Embedder;
use conclass_labeler::{Labeler, normalize_label};
use conclass_vecstore::VecIndex;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClassifierConfig;
use crate::entry::ContentEntry;
use crate::error::ClassifierError;
use crate::gate::Gate;
use crate::maintenance::Maintenance;
use crate::types::{Classification, EngineMetrics};

/// Classifies text consistently, reusing earlier answers for similar
/// inputs and clustering near-duplicate labels.
///
/// Safe for concurrent use; share it behind an `Arc`.
pub struct Classifier {
    embedder: Arc<dyn Embedder>,
    content_index: Arc<dyn VecIndex>,
    label_index: Arc<dyn VecIndex>,
    labeler: Arc<dyn Labeler>,
    persistence: Arc<dyn ClusterPersistence>,
    clusters: Arc<LabelClusters>,
    content_threshold: f32,
    label_threshold: f32,

    gate: Gate,
    shutdown: OnceCell<Result<(), PersistError>>,

    total: AtomicU64,
    hits: AtomicU64,
}

impl Classifier {
    /// Validates thresholds and loads cluster state from persistence.
    pub fn new(cfg: ClassifierConfig) -> Result<Self, ClassifierError> {
        let cfg = cfg.with_defaults();
        cfg.validate()?;

        let clusters = cfg.persistence.load()?;
        info!(
            "classifier: loaded {} labels in {} clusters",
            clusters.len(),
            clusters.count_sets()
        );

        Ok(Self {
            embedder: cfg.embedder,
            content_index: cfg.content_index,
            label_index: cfg.label_index,
            labeler: cfg.labeler,
            persistence: cfg.persistence,
            clusters: Arc::new(clusters),
            content_threshold: cfg.content_threshold,
            label_threshold: cfg.label_threshold,
            gate: Gate::new(),
            shutdown: OnceCell::new(),
            total: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        })
    }

    /// Classifies `text`. See [`classify_with_cancel`](Self::classify_with_cancel).
    pub async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        self.classify_with_cancel(text, &CancellationToken::new())
            .await
    }

    /// Classifies `text`, aborting outstanding I/O once `cancel` fires.
    ///
    /// A cache miss also runs maintenance before returning; its failures
    /// are logged and do not fail the call.
    pub async fn classify_with_cancel(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Classification, ClassifierError> {
        let _pass = self.gate.admit().ok_or(ClassifierError::ShuttingDown)?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ClassifierError::InvalidInput);
        }
        let start = Instant::now();

        let vector = guarded(cancel, self.embedder.embed(text))
            .await
            .ok_or(ClassifierError::Cancelled)??;
        let matches = guarded(cancel, self.content_index.search(&vector, 1))
            .await
            .ok_or(ClassifierError::Cancelled)??;

        if let Some(best) = matches.first().filter(|m| m.score >= self.content_threshold) {
            let entry = ContentEntry::from_match(best)?;
            let label = self.clusters.root_label(&entry.label);
            self.record(true);
            debug!(
                "classifier: hit {:?} -> {label:?} (score {:.3})",
                entry.label, best.score
            );
            return Ok(Classification {
                label,
                cache_hit: true,
                confidence: Some(best.score),
                user_facing_latency: start.elapsed(),
                background_latency: Duration::ZERO,
            });
        }

        let raw = guarded(cancel, self.labeler.label(text))
            .await
            .ok_or(ClassifierError::Cancelled)??;
        let label = normalize_label(&raw);
        if label.is_empty() {
            return Err(ClassifierError::EmptyLabel);
        }
        let user_facing_latency = start.elapsed();

        self.record(false);

        let maintenance_start = Instant::now();
        let maintenance = Maintenance {
            embedder: self.embedder.as_ref(),
            content_index: self.content_index.as_ref(),
            label_index: self.label_index.as_ref(),
            clusters: &self.clusters,
            label_threshold: self.label_threshold,
        };
        if let Err(e) = maintenance.run(text, &vector, &label, cancel).await {
            warn!("classifier: maintenance for {label:?} incomplete: {e}");
        }
        let background_latency = maintenance_start.elapsed();

        debug!("classifier: miss -> {label:?}");
        Ok(Classification {
            label,
            cache_hit: false,
            confidence: None,
            user_facing_latency,
            background_latency,
        })
    }

    /// Persists cluster state once every live call has finished.
    /// Does not stop new calls.
    pub async fn save(&self) -> Result<(), ClassifierError> {
        self.gate.drained().await;
        Ok(self.persist()?)
    }

    /// Stops accepting calls, waits for live ones, then persists cluster
    /// state. Later calls wait for and return the first outcome.
    pub async fn shutdown(&self) -> Result<(), ClassifierError> {
        let outcome = self
            .shutdown
            .get_or_init(|| async move {
                self.gate.close();
                info!(
                    "classifier: shutting down, draining {} calls",
                    self.gate.in_flight()
                );
                self.gate.drained().await;
                self.persist()
            })
            .await;
        outcome.clone().map_err(ClassifierError::Persist)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.gate.is_closing()
    }

    pub fn metrics(&self) -> EngineMetrics {
        let total = self.total.load(Ordering::SeqCst);
        let hits = self.hits.load(Ordering::SeqCst);
        EngineMetrics {
            total_classifications: total,
            cache_hits: hits,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            unique_labels: self.clusters.len(),
            clusters: self.clusters.count_sets(),
        }
    }

    /// The label clusters, for inspection.
    pub fn clusters(&self) -> Arc<LabelClusters> {
        Arc::clone(&self.clusters)
    }

    fn record(&self, hit: bool) {
        self.total.fetch_add(1, Ordering::SeqCst);
        if hit {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn persist(&self) -> Result<(), PersistError> {
        self.persistence.save(&self.clusters)?;
        info!(
            "classifier: saved {} labels in {} clusters",
            self.clusters.len(),
            self.clusters.count_sets()
        );
        Ok(())
    }
}

/// Runs `fut` unless `cancel` fires first, in which case `fut` is dropped.
pub(crate) async fn guarded<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}
