//! Pinecone data-plane client implementing [`VecIndex`].
//!
//! Talks to a single index host over REST. Every request is scoped to the
//! configured namespace, so two `Pinecone` values with different namespaces
//! over the same host behave as independent indexes.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VecError;
use crate::vecstore::{Match, Metadata, VecIndex};

const PINECONE_API_VERSION: &str = "2024-10";

/// Pinecone index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    /// API key sent in the `Api-Key` header.
    pub api_key: String,
    /// Index host, e.g. `https://my-index-abc123.svc.us-east1-gcp.pinecone.io`.
    pub host: String,
    /// Namespace all reads and writes are scoped to. Empty is the default
    /// namespace.
    #[serde(default)]
    pub namespace: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    namespace: &'a str,
    vectors: [UpsertVector<'a>; 1],
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a Metadata,
}

/// Pinecone-backed vector index.
pub struct Pinecone {
    client: Client,
    config: PineconeConfig,
}

impl Pinecone {
    pub fn new(config: PineconeConfig) -> Self {
        let mut config = config;
        if !config.host.starts_with("http://") && !config.host.starts_with("https://") {
            config.host = format!("https://{}", config.host);
        }
        config.host = config.host.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &PineconeConfig {
        &self.config
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response, VecError> {
        let url = format!("{}{}", self.config.host, path);
        let resp = self
            .client
            .post(&url)
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| VecError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VecError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl VecIndex for Pinecone {
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError> {
        if query.is_empty() {
            return Err(VecError::EmptyVector);
        }
        if top_k == 0 {
            return Ok(vec![]);
        }

        let body = QueryRequest {
            namespace: &self.config.namespace,
            vector: query,
            top_k,
            include_metadata: true,
            include_values: false,
        };
        let resp: QueryResponse = self
            .post("/query", &body)
            .await?
            .json()
            .await
            .map_err(|e| VecError::InvalidFormat(e.to_string()))?;

        debug!(
            "pinecone: {} matches in namespace {:?}",
            resp.matches.len(),
            self.config.namespace
        );
        Ok(into_matches(resp))
    }

    async fn upsert(&self, id: &str, vector: &[f32], metadata: &Metadata) -> Result<(), VecError> {
        if vector.is_empty() {
            return Err(VecError::EmptyVector);
        }
        let body = UpsertRequest {
            namespace: &self.config.namespace,
            vectors: [UpsertVector {
                id,
                values: vector,
                metadata,
            }],
        };
        self.post("/vectors/upsert", &body).await?;
        Ok(())
    }
}

/// Converts a query response into matches sorted best first.
fn into_matches(resp: QueryResponse) -> Vec<Match> {
    let mut matches: Vec<Match> = resp
        .matches
        .into_iter()
        .map(|m| Match {
            id: m.id,
            score: m.score,
            metadata: m.metadata.unwrap_or_default(),
        })
        .collect();
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    matches
}
