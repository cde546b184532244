use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::EmbedConfig;
use crate::embed::Embedder;
use crate::error::EmbedError;

/// Voyage embedding models.
pub const MODEL_VOYAGE_3_5_LITE: &str = "voyage-3.5-lite";
pub const MODEL_VOYAGE_3_5: &str = "voyage-3.5";

const VOYAGE_BASE_URL: &str = "https://api.voyageai.com/v1";
const VOYAGE_MAX_BATCH: usize = 128;
const VOYAGE_DEFAULT_DIM: usize = 1024;

/// Retrieval role hint sent with each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// No hint; the provider embeds the raw text.
    #[default]
    #[serde(skip)]
    None,
    Query,
    Document,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "is_none_input")]
    input_type: InputType,
    output_dimension: usize,
}

fn is_none_input(t: &InputType) -> bool {
    *t == InputType::None
}

/// Voyage AI embedder.
pub struct Voyage {
    client: Client,
    api_key: String,
    model: String,
    dim: usize,
    base_url: String,
    input_type: InputType,
}

impl Voyage {
    pub fn new(api_key: &str) -> Self {
        Self::with_config(api_key, EmbedConfig::default())
    }

    pub fn with_config(api_key: &str, cfg: EmbedConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: cfg.model_or(MODEL_VOYAGE_3_5_LITE),
            dim: cfg.dimension_or(VOYAGE_DEFAULT_DIM),
            base_url: cfg.base_url_or(VOYAGE_BASE_URL),
            input_type: InputType::None,
        }
    }

    /// Sets the input type hint for every request from this embedder.
    pub fn with_input_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    async fn call_api(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            input_type: self.input_type,
            output_dimension: self.dim,
        };
        let url = format!("{}/embeddings", self.base_url);
        debug!("voyage: embedding {} texts with {}", texts.len(), self.model);
        crate::http::post_embeddings(&self.client, &self.api_key, &url, &body, texts.len()).await
    }
}

#[async_trait::async_trait]
impl Embedder for Voyage {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.is_empty() {
            return Err(EmbedError::EmptyInput);
        }
        let vecs = self.embed_batch(&[text]).await?;
        vecs.into_iter().next().ok_or(EmbedError::MissingIndex(0))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let mut result = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(VOYAGE_MAX_BATCH) {
            let vecs = self.call_api(chunk).await?;
            result.extend(vecs);
        }
        Ok(result)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
