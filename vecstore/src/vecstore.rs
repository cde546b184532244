use crate::error::VecError;

/// Free-form metadata stored alongside a vector.
///
/// Providers hand this back verbatim on search; callers validate the
/// fields they depend on.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Match is a single result from a vector similarity search.
#[derive(Debug, Clone)]
pub struct Match {
    /// Identifier of the matched vector.
    pub id: String,

    /// Similarity between the query and matched vector.
    /// Higher values indicate higher similarity; 1.0 is identical.
    pub score: f32,

    /// Metadata stored with the matched vector.
    pub metadata: Metadata,
}

/// VecIndex is the interface for nearest-neighbor search over dense
/// float32 vectors with attached metadata.
///
/// All implementations must be safe for concurrent use (Send + Sync).
#[async_trait::async_trait]
pub trait VecIndex: Send + Sync {
    /// Return the top-k most similar vectors to the query, ordered by
    /// descending score (best first).
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError>;

    /// Add or replace the vector and metadata stored under `id`.
    async fn upsert(&self, id: &str, vector: &[f32], metadata: &Metadata) -> Result<(), VecError>;
}
