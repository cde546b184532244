use async_trait::async_trait;

use crate::error::EmbedError;

/// Turns texts and labels into dense vectors for similarity search.
///
/// The classifier embeds every input text and every fresh label with the
/// same embedder, so both indexes share one vector space and one
/// dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Vectors come back in the order of `texts`. Providers chunk large
    /// inputs to their own request limits.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Length of every returned vector.
    fn dimension(&self) -> usize;
}
