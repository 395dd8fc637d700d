// file: src/rag/retrieve.rs
// description: knowledge-base context retrieval for grounding oracle prompts
// reference: nearest-neighbor lookup over the kb collection

use crate::ai::Embedder;
use crate::error::Result;
use crate::vector::VectorIndex;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Pulls reference snippets from the knowledge-base collection to ground
/// classification and summarization prompts. Retrieval is best-effort
/// enrichment: every failure degrades to an empty context.
pub struct ContextRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    top_k: usize,
}

impl ContextRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        collection: String,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            collection,
            top_k,
        }
    }

    pub async fn retrieve(&self, query: &str) -> String {
        match self.try_retrieve(query).await {
            Ok(context) => context,
            Err(e) => {
                warn!("Context retrieval failed, continuing without: {e}");
                String::new()
            }
        }
    }

    async fn try_retrieve(&self, query: &str) -> Result<String> {
        let vector = self.embedder.embed(query).await?;
        let hits = self
            .index
            .query(&self.collection, vector, self.top_k, None)
            .await?;

        let chunks: Vec<String> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let text = hit
                    .payload
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let source = hit
                    .payload
                    .get("source")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                format!("--- CHUNK {} (source: {}) ---\n{}", i + 1, source, text)
            })
            .collect();

        Ok(chunks.join("\n\n"))
    }
}
