// file: src/pipeline/dedupe.rs
// description: three-tier duplicate detection against store and vector index
// reference: cheap deterministic lookups first, embedding search last

use crate::ai::{bounded_prefix, Embedder};
use crate::database::Store;
use crate::error::{PipelineError, Result};
use crate::models::{DedupOutcome, DedupReason, ProcessingDocument};
use crate::vector::VectorIndex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

pub struct DeduplicationEngine {
    store: Store,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    items_collection: String,
    similarity_threshold: f32,
    semantic_min_chars: usize,
    semantic_text_limit: usize,
}

impl DeduplicationEngine {
    pub fn new(
        store: Store,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        items_collection: String,
        similarity_threshold: f32,
        semantic_min_chars: usize,
        semantic_text_limit: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            index,
            items_collection,
            similarity_threshold,
            semantic_min_chars,
            semantic_text_limit,
        }
    }

    /// Run the escalating duplicate checks, short-circuiting at the first
    /// match. A failed lookup is an error, never a silent "new": treating an
    /// unreachable store as "not found" would double-index true duplicates.
    pub async fn process(&self, mut doc: ProcessingDocument) -> Result<ProcessingDocument> {
        info!("Checking duplicates for document {}", doc.raw_document_id);

        if let Some(existing) = self
            .store
            .find_item_by_url(&doc.url_normalized)
            .await
            .map_err(lookup_failure)?
        {
            debug!(
                "Document {} duplicates item {} by URL",
                doc.raw_document_id, existing.id
            );
            doc.dedup = Some(DedupOutcome::Duplicate {
                reason: DedupReason::Url,
                matched_item_id: existing.id,
            });
            return Ok(doc);
        }

        // the empty-fingerprint sentinel never matches another empty page
        if !doc.content_hash.is_empty() {
            if let Some(existing) = self
                .store
                .find_item_by_hash(&doc.content_hash)
                .await
                .map_err(lookup_failure)?
            {
                debug!(
                    "Document {} duplicates item {} by content hash",
                    doc.raw_document_id, existing.id
                );
                doc.dedup = Some(DedupOutcome::Duplicate {
                    reason: DedupReason::Hash,
                    matched_item_id: existing.id,
                });
                return Ok(doc);
            }
        }

        // short documents are too noisy to fingerprint semantically
        if doc.content_text.chars().count() > self.semantic_min_chars {
            if let Some((score, matched_item_id)) = self.semantic_match(&doc).await? {
                debug!(
                    "Document {} duplicates item {} semantically (score={:.2})",
                    doc.raw_document_id, matched_item_id, score
                );
                doc.dedup = Some(DedupOutcome::Duplicate {
                    reason: DedupReason::Semantic { score },
                    matched_item_id,
                });
                return Ok(doc);
            }
        }

        doc.dedup = Some(DedupOutcome::New);
        Ok(doc)
    }

    async fn semantic_match(&self, doc: &ProcessingDocument) -> Result<Option<(f32, i64)>> {
        let prefix = bounded_prefix(&doc.content_text, self.semantic_text_limit);
        let vector = self.embedder.embed(prefix).await.map_err(lookup_failure)?;

        let hits = self
            .index
            .query(
                &self.items_collection,
                vector,
                1,
                Some(self.similarity_threshold),
            )
            .await
            .map_err(lookup_failure)?;

        match hits.into_iter().next() {
            None => Ok(None),
            Some(hit) => {
                let matched_item_id = hit
                    .payload
                    .get("item_id")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| {
                        PipelineError::DuplicateLookup(format!(
                            "semantic hit (score={:.2}) carries no item_id payload",
                            hit.score
                        ))
                    })?;
                Ok(Some((hit.score, matched_item_id)))
            }
        }
    }
}

fn lookup_failure(e: PipelineError) -> PipelineError {
    PipelineError::DuplicateLookup(e.to_string())
}
