// file: src/vector/mod.rs
// description: vector index seam with an in-memory implementation
// reference: internal module structure

pub mod qdrant;

pub use qdrant::QdrantIndex;

use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A similarity hit returned from the index, payload attached.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: Option<i64>,
    pub score: f32,
    pub payload: Value,
}

/// Nearest-neighbor search service over embedding vectors. Dimensionality
/// and distance metric are fixed when a collection is created.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<()>;

    async fn collection_exists(&self, name: &str) -> Result<bool>;

    async fn upsert(
        &self,
        collection: &str,
        id: i64,
        vector: Vec<f32>,
        payload: Value,
    ) -> Result<()>;

    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>>;
}

struct StoredPoint {
    id: i64,
    vector: Vec<f32>,
    payload: Value,
}

struct MemoryCollection {
    vector_size: u64,
    points: Vec<StoredPoint>,
}

/// In-process index with cosine scoring. Backs mock mode and tests; the
/// semantics mirror the HTTP-backed index, including the fixed-size check.
#[derive(Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| MemoryCollection {
                vector_size,
                points: Vec::new(),
            });
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn upsert(
        &self,
        collection: &str,
        id: i64,
        vector: Vec<f32>,
        payload: Value,
    ) -> Result<()> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| PipelineError::VectorIndex(format!("no collection '{collection}'")))?;

        if vector.len() as u64 != entry.vector_size {
            return Err(PipelineError::VectorIndex(format!(
                "vector size {} does not match collection size {}",
                vector.len(),
                entry.vector_size
            )));
        }

        entry.points.retain(|point| point.id != id);
        entry.points.push(StoredPoint {
            id,
            vector,
            payload,
        });
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| PipelineError::VectorIndex(format!("no collection '{collection}'")))?;

        let mut hits: Vec<ScoredPoint> = entry
            .points
            .iter()
            .map(|point| ScoredPoint {
                id: Some(point.id),
                score: cosine_similarity(&vector, &point.vector),
                payload: point.payload.clone(),
            })
            .filter(|hit| score_threshold.map(|t| hit.score >= t).unwrap_or(true))
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_ensure_collection_is_idempotent() {
        let index = MemoryIndex::new();
        index.ensure_collection("items", 3).await.unwrap();
        index.ensure_collection("items", 3).await.unwrap();
        assert!(index.collection_exists("items").await.unwrap());
        assert!(!index.collection_exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimensionality() {
        let index = MemoryIndex::new();
        index.ensure_collection("items", 3).await.unwrap();

        let result = index
            .upsert("items", 1, vec![1.0, 0.0], json!({"item_id": 1}))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity_and_applies_threshold() {
        let index = MemoryIndex::new();
        index.ensure_collection("items", 2).await.unwrap();
        index
            .upsert("items", 1, vec![1.0, 0.0], json!({"item_id": 1}))
            .await
            .unwrap();
        index
            .upsert("items", 2, vec![0.0, 1.0], json!({"item_id": 2}))
            .await
            .unwrap();

        let hits = index
            .query("items", vec![1.0, 0.1], 10, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, Some(1));
        assert!(hits[0].score > hits[1].score);

        let strict = index
            .query("items", vec![1.0, 0.1], 10, Some(0.9))
            .await
            .unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].id, Some(1));
    }

    #[tokio::test]
    async fn test_upsert_replaces_point_with_same_id() {
        let index = MemoryIndex::new();
        index.ensure_collection("items", 2).await.unwrap();
        index
            .upsert("items", 1, vec![1.0, 0.0], json!({"v": "old"}))
            .await
            .unwrap();
        index
            .upsert("items", 1, vec![0.0, 1.0], json!({"v": "new"}))
            .await
            .unwrap();

        let hits = index
            .query("items", vec![0.0, 1.0], 10, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload["v"], "new");
    }
}
