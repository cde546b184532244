use std::fmt;

use conclass_dsu::PersistError;
use conclass_embed::EmbedError;
use conclass_labeler::LabelerError;
use conclass_vecstore::VecError;
use thiserror::Error;

use crate::entry::CorruptEntry;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier: shutting down")]
    ShuttingDown,

    #[error("classifier: input text is empty")]
    InvalidInput,

    #[error("classifier: embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("classifier: search failed: {0}")]
    Search(#[from] VecError),

    #[error("classifier: oracle failed: {0}")]
    Llm(#[from] LabelerError),

    #[error("classifier: oracle returned an empty label")]
    EmptyLabel,

    #[error("classifier: corrupt cache entry: {0}")]
    CorruptCacheEntry(String),

    #[error("classifier: {0}")]
    Persist(#[from] PersistError),

    #[error("classifier: cancelled")]
    Cancelled,

    #[error("classifier: invalid config: {0}")]
    InvalidConfig(String),
}

impl From<CorruptEntry> for ClassifierError {
    fn from(e: CorruptEntry) -> Self {
        Self::CorruptCacheEntry(e.to_string())
    }
}

/// One of the jobs run after a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceJob {
    ClusterUpdate,
    ContentCache,
    LabelCache,
}

impl fmt::Display for MaintenanceJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ClusterUpdate => "cluster update",
            Self::ContentCache => "content cache write",
            Self::LabelCache => "label cache write",
        })
    }
}

/// Failure of a single maintenance job. Logged, never returned to callers
/// of `classify`.
#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("maintenance: {0} cancelled")]
    Cancelled(MaintenanceJob),

    #[error("maintenance: {job}: embedding failed: {source}")]
    Embedding {
        job: MaintenanceJob,
        source: EmbedError,
    },

    #[error("maintenance: {job}: index failed: {source}")]
    Index {
        job: MaintenanceJob,
        source: VecError,
    },

    #[error("maintenance: {0}")]
    CorruptEntry(#[from] CorruptEntry),
}

impl MaintenanceError {
    /// The job that failed. Corrupt entries are only read by the cluster
    /// update.
    pub fn job(&self) -> MaintenanceJob {
        match self {
            Self::Cancelled(job) | Self::Embedding { job, .. } | Self::Index { job, .. } => *job,
            Self::CorruptEntry(_) => MaintenanceJob::ClusterUpdate,
        }
    }
}
