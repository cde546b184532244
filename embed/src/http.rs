use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::EmbedError;

/// Response body shared by OpenAI-style embedding endpoints
/// (OpenAI, Voyage and most compatible providers).
#[derive(Deserialize)]
pub(crate) struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f64>,
}

/// POST `body` to `url` and return one vector per input, in input order.
pub(crate) async fn post_embeddings<B: Serialize>(
    client: &Client,
    api_key: &str,
    url: &str,
    body: &B,
    batch_len: usize,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    let resp = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| EmbedError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(EmbedError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let data: EmbeddingResponse = resp
        .json()
        .await
        .map_err(|e| EmbedError::Decode(e.to_string()))?;
    order_embeddings(data, batch_len)
}

/// Place each returned vector at its declared index. Providers may return
/// items out of order; every slot must be filled exactly once.
pub(crate) fn order_embeddings(
    resp: EmbeddingResponse,
    batch_len: usize,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    let mut vecs: Vec<Option<Vec<f32>>> = vec![None; batch_len];
    for item in resp.data {
        if item.index >= batch_len {
            return Err(EmbedError::UnexpectedIndex {
                index: item.index,
                batch_size: batch_len,
            });
        }
        vecs[item.index] = Some(item.embedding.iter().map(|&v| v as f32).collect());
    }

    vecs.into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or(EmbedError::MissingIndex(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> EmbeddingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn reorders_by_index() {
        let resp = parse(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        );
        let vecs = order_embeddings(resp, 2).unwrap();
        assert_eq!(vecs, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn ignores_extra_fields() {
        let resp = parse(
            r#"{"object":"list","model":"m","usage":{"total_tokens":3},
                "data":[{"object":"embedding","index":0,"embedding":[0.5]}]}"#,
        );
        assert_eq!(order_embeddings(resp, 1).unwrap(), vec![vec![0.5]]);
    }

    #[test]
    fn missing_slot_is_an_error() {
        let resp = parse(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#);
        assert!(matches!(
            order_embeddings(resp, 2),
            Err(EmbedError::MissingIndex(1))
        ));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let resp = parse(r#"{"data":[{"index":3,"embedding":[1.0]}]}"#);
        assert!(matches!(
            order_embeddings(resp, 1),
            Err(EmbedError::UnexpectedIndex { index: 3, batch_size: 1 })
        ));
    }
}
