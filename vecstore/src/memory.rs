use std::collections::HashMap;

use parking_lot::RwLock;

use crate::cosine::cosine_similarity;
use crate::error::VecError;
use crate::vecstore::{Match, Metadata, VecIndex};

struct Entry {
    vector: Vec<f32>,
    metadata: Metadata,
}

struct MemoryInner {
    dim: Option<usize>,
    entries: HashMap<String, Entry>,
}

/// MemoryIndex is an in-memory VecIndex using brute-force cosine similarity.
/// Intended for testing and small-scale use (< 10k vectors).
///
/// The first upserted vector fixes the dimension; later vectors of a
/// different length are rejected.
pub struct MemoryIndex {
    inner: RwLock<MemoryInner>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                dim: None,
                entries: HashMap::new(),
            }),
        }
    }

    /// Return the number of vectors in the index.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the metadata stored under `id`.
    pub fn metadata(&self, id: &str) -> Option<Metadata> {
        self.inner.read().entries.get(id).map(|e| e.metadata.clone())
    }

    /// Return all stored IDs, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.read().entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl VecIndex for MemoryIndex {
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError> {
        let inner = self.inner.read();
        if inner.entries.is_empty() || top_k == 0 {
            return Ok(vec![]);
        }
        if let Some(dim) = inner.dim {
            if query.len() != dim {
                return Err(VecError::DimensionMismatch {
                    got: query.len(),
                    want: dim,
                });
            }
        }

        let mut results: Vec<(&String, &Entry, f32)> = inner
            .entries
            .iter()
            .map(|(id, e)| (id, e, cosine_similarity(query, &e.vector)))
            .collect();

        results.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        Ok(results
            .into_iter()
            .map(|(id, e, score)| Match {
                id: id.clone(),
                score,
                metadata: e.metadata.clone(),
            })
            .collect())
    }

    async fn upsert(&self, id: &str, vector: &[f32], metadata: &Metadata) -> Result<(), VecError> {
        if vector.is_empty() {
            return Err(VecError::EmptyVector);
        }
        let mut inner = self.inner.write();
        match inner.dim {
            Some(dim) if dim != vector.len() => {
                return Err(VecError::DimensionMismatch {
                    got: vector.len(),
                    want: dim,
                });
            }
            Some(_) => {}
            None => inner.dim = Some(vector.len()),
        }
        inner.entries.insert(
            id.to_string(),
            Entry {
                vector: vector.to_vec(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn meta(label: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert("label".into(), json!(label));
        m
    }

    #[tokio::test]
    async fn test_upsert_and_search() {
        let idx = MemoryIndex::new();
        idx.upsert("a", &[1.0, 0.0, 0.0, 0.0], &meta("a")).await.unwrap();
        idx.upsert("b", &[0.0, 1.0, 0.0, 0.0], &meta("b")).await.unwrap();
        idx.upsert("c", &[0.9, 0.1, 0.0, 0.0], &meta("c")).await.unwrap();

        let matches = idx.search(&[1.0, 0.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert!((matches[0].score - 1.0).abs() < 0.001);
        assert_eq!(matches[1].id, "c");
        assert!(matches[0].score >= matches[1].score);
        assert_eq!(matches[1].metadata["label"], "c");
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let idx = MemoryIndex::new();
        idx.upsert("a", &[1.0, 0.0], &meta("old")).await.unwrap();
        idx.upsert("a", &[0.0, 1.0], &meta("new")).await.unwrap();
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.metadata("a").unwrap()["label"], "new");

        let matches = idx.search(&[0.0, 1.0], 1).await.unwrap();
        assert!((matches[0].score - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_dimension_is_fixed_by_first_upsert() {
        let idx = MemoryIndex::new();
        idx.upsert("a", &[1.0, 0.0], &Metadata::new()).await.unwrap();
        assert!(matches!(
            idx.upsert("b", &[1.0, 0.0, 0.0], &Metadata::new()).await,
            Err(VecError::DimensionMismatch { got: 3, want: 2 })
        ));
        assert!(matches!(
            idx.search(&[1.0], 1).await,
            Err(VecError::DimensionMismatch { got: 1, want: 2 })
        ));
    }

    #[tokio::test]
    async fn test_empty_vector_rejected() {
        let idx = MemoryIndex::new();
        assert!(matches!(
            idx.upsert("a", &[], &Metadata::new()).await,
            Err(VecError::EmptyVector)
        ));
        assert!(idx.is_empty());
    }

    #[tokio::test]
    async fn test_search_empty() {
        let idx = MemoryIndex::new();
        assert!(idx.search(&[1.0, 0.0, 0.0], 5).await.unwrap().is_empty());

        idx.upsert("a", &[1.0, 0.0, 0.0], &Metadata::new()).await.unwrap();
        assert!(idx.search(&[1.0, 0.0, 0.0], 0).await.unwrap().is_empty());
        assert_eq!(idx.ids(), vec!["a"]);
    }
}
