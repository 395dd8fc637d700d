// file: src/vector/qdrant.rs
// description: HTTP client for a Qdrant vector index
// reference: https://qdrant.tech/documentation/concepts/points/

use crate::config::VectorConfig;
use crate::error::{PipelineError, Result};
use crate::vector::{ScoredPoint, VectorIndex};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ExistsResponse {
    result: ExistsResult,
}

#[derive(Debug, Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    points: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Value,
}

/// Lightweight REST client for Qdrant. Collections are created with cosine
/// distance; the vector size must match the embedding model's output.
pub struct QdrantIndex {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantIndex {
    pub fn new(config: &VectorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::VectorIndex(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    async fn ensure_success(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(PipelineError::VectorIndex(format!(
            "{context} failed with status {status}: {body}"
        )))
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<()> {
        if self.collection_exists(name).await? {
            return Ok(());
        }

        debug!("Creating collection '{}' with size {}", name, vector_size);
        let body = json!({
            "vectors": {
                "size": vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{name}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::VectorIndex(e.to_string()))?;

        Self::ensure_success(response, "collection create").await?;
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .request(Method::GET, &format!("collections/{name}/exists"))
            .send()
            .await
            .map_err(|e| PipelineError::VectorIndex(e.to_string()))?;

        let response = Self::ensure_success(response, "collection exists check").await?;
        let parsed: ExistsResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::VectorIndex(format!("failed to decode response: {e}")))?;

        Ok(parsed.result.exists)
    }

    async fn upsert(
        &self,
        collection: &str,
        id: i64,
        vector: Vec<f32>,
        payload: Value,
    ) -> Result<()> {
        let body = json!({
            "points": [{
                "id": id,
                "vector": vector,
                "payload": payload,
            }]
        });

        let response = self
            .request(Method::PUT, &format!("collections/{collection}/points"))
            .query(&[("wait", "true")])
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::VectorIndex(e.to_string()))?;

        Self::ensure_success(response, "point upsert").await?;
        debug!("Upserted point {} into '{}'", id, collection);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>> {
        let mut body = json!({
            "query": vector,
            "limit": limit,
            "with_payload": true,
        });
        if let Some(threshold) = score_threshold {
            body["score_threshold"] = json!(threshold);
        }

        let response = self
            .request(
                Method::POST,
                &format!("collections/{collection}/points/query"),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::VectorIndex(e.to_string()))?;

        let response = Self::ensure_success(response, "similarity query").await?;
        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::VectorIndex(format!("failed to decode response: {e}")))?;

        Ok(parsed
            .result
            .points
            .into_iter()
            .map(|point| ScoredPoint {
                id: point.id.as_i64(),
                score: point.score,
                payload: point.payload,
            })
            .collect())
    }
}
