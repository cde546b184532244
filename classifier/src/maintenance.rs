//! Work done after a cache miss.
//!
//! Three independent jobs run concurrently: merging the new label into the
//! clusters, caching the text vector, and caching the label vector. A job
//! failure is reported but never undoes the jobs that succeeded.

use conclass_dsu::LabelClusters;
use conclass_embed::Embedder;
use conclass_vecstore::VecIndex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::classifier::guarded;
use crate::entry::{ContentEntry, LabelEntry};
use crate::error::{MaintenanceError, MaintenanceJob};

pub(crate) struct Maintenance<'a> {
    pub embedder: &'a dyn Embedder,
    pub content_index: &'a dyn VecIndex,
    pub label_index: &'a dyn VecIndex,
    pub clusters: &'a LabelClusters,
    pub label_threshold: f32,
}

impl Maintenance<'_> {
    /// Runs all jobs and returns the first failure, if any.
    pub async fn run(
        &self,
        text: &str,
        text_vector: &[f32],
        label: &str,
        cancel: &CancellationToken,
    ) -> Result<(), MaintenanceError> {
        let (clusters, content, labels) = tokio::join!(
            self.update_clusters(label, cancel),
            self.write_content(text, text_vector, label, cancel),
            self.write_label(label, cancel),
        );
        let mut first = None;
        for err in [clusters, content, labels].into_iter().filter_map(Result::err) {
            debug!("maintenance: {err}");
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }

    /// Merges `label` into the cluster of the most similar known label, or
    /// makes it its own root.
    pub async fn update_clusters(
        &self,
        label: &str,
        cancel: &CancellationToken,
    ) -> Result<(), MaintenanceError> {
        let job = MaintenanceJob::ClusterUpdate;
        if cancel.is_cancelled() {
            return Err(MaintenanceError::Cancelled(job));
        }
        if label.trim().is_empty() {
            return Ok(());
        }

        let vector = self.embed(job, label, cancel).await?;
        let matches = guarded(cancel, self.label_index.search(&vector, 1))
            .await
            .ok_or(MaintenanceError::Cancelled(job))?
            .map_err(|source| MaintenanceError::Index { job, source })?;

        let similar = match matches.first() {
            Some(m) if m.score >= self.label_threshold => LabelEntry::from_match(m)?.root,
            _ => None,
        };
        let root = similar.unwrap_or_else(|| label.to_string());

        if self.clusters.union_labels(&root, label) {
            debug!("maintenance: merged {label:?} into cluster {root:?}");
        }
        Ok(())
    }

    /// Caches the text vector under a fresh id, tagged with its label.
    pub async fn write_content(
        &self,
        text: &str,
        text_vector: &[f32],
        label: &str,
        cancel: &CancellationToken,
    ) -> Result<(), MaintenanceError> {
        let job = MaintenanceJob::ContentCache;
        if cancel.is_cancelled() {
            return Err(MaintenanceError::Cancelled(job));
        }

        let id = Uuid::new_v4().to_string();
        let metadata = ContentEntry {
            vector_text: text.to_string(),
            label: label.to_string(),
        }
        .to_metadata();
        guarded(cancel, self.content_index.upsert(&id, text_vector, &metadata))
            .await
            .ok_or(MaintenanceError::Cancelled(job))?
            .map_err(|source| MaintenanceError::Index { job, source })
    }

    /// Caches the label vector keyed by the label, tagged with its current
    /// root.
    pub async fn write_label(
        &self,
        label: &str,
        cancel: &CancellationToken,
    ) -> Result<(), MaintenanceError> {
        let job = MaintenanceJob::LabelCache;
        if cancel.is_cancelled() {
            return Err(MaintenanceError::Cancelled(job));
        }
        if label.trim().is_empty() {
            return Ok(());
        }

        let vector = self.embed(job, label, cancel).await?;
        let metadata = LabelEntry {
            vector_text: label.to_string(),
            label: label.to_string(),
            root: Some(self.clusters.root_label(label)),
        }
        .to_metadata();
        guarded(cancel, self.label_index.upsert(label, &vector, &metadata))
            .await
            .ok_or(MaintenanceError::Cancelled(job))?
            .map_err(|source| MaintenanceError::Index { job, source })
    }

    async fn embed(
        &self,
        job: MaintenanceJob,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<f32>, MaintenanceError> {
        guarded(cancel, self.embedder.embed(text))
            .await
            .ok_or(MaintenanceError::Cancelled(job))?
            .map_err(|source| MaintenanceError::Embedding { job, source })
    }
}
