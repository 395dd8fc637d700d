// file: src/pipeline/persist.rs
// description: dual-store persistence of processed items and embeddings
// reference: structured row first, vector point best-effort

use crate::ai::{bounded_prefix, Embedder};
use crate::database::Store;
use crate::error::Result;
use crate::models::ProcessingDocument;
use crate::vector::VectorIndex;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct PersistenceGateway {
    store: Store,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    items_collection: String,
    embed_text_limit: usize,
}

impl PersistenceGateway {
    pub fn new(
        store: Store,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        items_collection: String,
        embed_text_limit: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            index,
            items_collection,
            embed_text_limit,
        }
    }

    /// Record the document as a processed item, whatever branch it took.
    /// Relevant, newly-introduced documents with text also get an embedding
    /// point; a failure there leaves the row standing and the item
    /// unreachable by semantic search until reconciled.
    pub async fn persist(&self, doc: &mut ProcessingDocument) -> Result<i64> {
        info!("Persisting document {}", doc.raw_document_id);

        let item_id = self.store.insert_item(doc).await?;

        if doc.is_relevant() && doc.is_new() && !doc.content_text.is_empty() {
            if let Err(e) = self.upsert_embedding(doc, item_id).await {
                error!("Failed to index embedding for item {}: {}", item_id, e);
            }
        } else {
            debug!("Item {} does not qualify for an embedding", item_id);
        }

        Ok(item_id)
    }

    /// Embed a single item and upsert its point, keyed by item id. Also used
    /// by the reconciliation sweep.
    pub async fn upsert_item_embedding(
        &self,
        item_id: i64,
        title: &str,
        county: &str,
        url: &str,
        content_text: &str,
    ) -> Result<()> {
        let vector = self
            .embedder
            .embed(bounded_prefix(content_text, self.embed_text_limit))
            .await?;

        let payload = json!({
            "item_id": item_id,
            "title": title,
            "county": county,
            "url": url,
        });

        self.index
            .upsert(&self.items_collection, item_id, vector, payload)
            .await
    }

    async fn upsert_embedding(&self, doc: &ProcessingDocument, item_id: i64) -> Result<()> {
        self.upsert_item_embedding(item_id, &doc.title, &doc.county, &doc.url, &doc.content_text)
            .await
    }
}
