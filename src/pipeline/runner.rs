// file: src/pipeline/runner.rs
// description: batch driver pulling collected documents through the pipeline
// reference: per-document failure isolation, one audit row per batch

use crate::collector::DocumentSource;
use crate::database::Store;
use crate::error::Result;
use crate::models::RunAudit;
use crate::pipeline::orchestrator::{DocumentOutcome, PipelineOrchestrator};
use crate::pipeline::progress::{ProgressTracker, RunStats};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct RunRunner {
    source: Arc<dyn DocumentSource>,
    store: Store,
    orchestrator: PipelineOrchestrator,
    show_progress: bool,
}

impl RunRunner {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        store: Store,
        orchestrator: PipelineOrchestrator,
        show_progress: bool,
    ) -> Self {
        Self {
            source,
            store,
            orchestrator,
            show_progress,
        }
    }

    /// Process one batch. Documents run sequentially: each new item becomes
    /// a duplicate candidate for the rest of the batch, so the store must
    /// reflect earlier documents before later ones are checked. One bad
    /// document never stops the batch.
    pub async fn run(&self) -> Result<RunStats> {
        let started_at = Utc::now();
        info!("Starting pipeline run");

        let mut errors: Vec<String> = Vec::new();

        let doc_ids = match self.source.collect().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Collection stage failed: {e}");
                errors.push(format!("Global: {e}"));
                Vec::new()
            }
        };

        if doc_ids.is_empty() && errors.is_empty() {
            info!("No new documents to process");
        }

        let progress = ProgressTracker::new(doc_ids.len(), self.show_progress);

        for doc_id in doc_ids {
            match self.process_one(doc_id).await {
                Ok(Some(outcome)) => {
                    progress.record_processed(&outcome.document);
                }
                Ok(None) => {
                    warn!("Raw document {} no longer exists, skipping", doc_id);
                }
                Err(e) => {
                    error!("Error processing document {}: {}", doc_id, e);
                    errors.push(format!("Doc {doc_id}: {e}"));
                    progress.record_failed();
                }
            }
        }

        let stats = progress.finish();

        let status = if errors.is_empty() {
            "success"
        } else {
            "completed_with_errors"
        };

        let audit = RunAudit {
            id: 0,
            status: status.to_string(),
            items_processed: stats.processed as i64,
            items_relevant: stats.relevant as i64,
            items_new: stats.new_items as i64,
            error_log: errors.join("\n"),
            started_at,
            finished_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_run(&audit).await {
            error!("Failed to record run audit: {e}");
        }

        info!(
            "Run completed: {} processed, {} relevant, {} new, {} failed",
            stats.processed, stats.relevant, stats.new_items, stats.failed
        );

        Ok(stats)
    }

    async fn process_one(&self, doc_id: i64) -> Result<Option<DocumentOutcome>> {
        match self.store.raw_document(doc_id).await? {
            None => Ok(None),
            Some(raw) => self.orchestrator.run_document(raw).await.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Embedder, MockEmbedder, MockOracle, Oracle};
    use crate::collector::FixtureSource;
    use crate::database::SchemaManager;
    use crate::error::PipelineError;
    use crate::models::NewRawDocument;
    use crate::pipeline::{
        DeduplicationEngine, PersistenceGateway, RelevanceClassifier, Summarizer,
    };
    use crate::rag::ContextRetriever;
    use crate::vector::{MemoryIndex, VectorIndex};
    use async_trait::async_trait;

    struct StaticSource {
        ids: Vec<i64>,
    }

    #[async_trait]
    impl DocumentSource for StaticSource {
        async fn collect(&self) -> Result<Vec<i64>> {
            Ok(self.ids.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl DocumentSource for BrokenSource {
        async fn collect(&self) -> Result<Vec<i64>> {
            Err(PipelineError::Database(sqlx::Error::PoolClosed))
        }
    }

    /// Embedder that fails for one marked document, making its dedup stage
    /// fatal while the rest of the batch proceeds.
    struct TrippedEmbedder {
        inner: MockEmbedder,
        marker: String,
    }

    #[async_trait]
    impl Embedder for TrippedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains(&self.marker) {
                return Err(PipelineError::Oracle("embedding backend down".to_string()));
            }
            self.inner.embed(text).await
        }
    }

    async fn prepared_store() -> (Store, Arc<MemoryIndex>) {
        let store = Store::in_memory().await.unwrap();
        SchemaManager::new(&store).initialize().await.unwrap();

        let index = Arc::new(MemoryIndex::new());
        index.ensure_collection("kb", 32).await.unwrap();
        index.ensure_collection("items", 32).await.unwrap();

        (store, index)
    }

    fn orchestrator_with(
        store: Store,
        index: Arc<MemoryIndex>,
        embedder: Arc<dyn Embedder>,
    ) -> PipelineOrchestrator {
        let oracle: Arc<dyn Oracle> = Arc::new(MockOracle::new());
        let retriever =
            ContextRetriever::new(embedder.clone(), index.clone(), "kb".to_string(), 3);

        PipelineOrchestrator::new(
            RelevanceClassifier::new(oracle.clone(), retriever, 3000),
            DeduplicationEngine::new(
                store.clone(),
                embedder.clone(),
                index.clone(),
                "items".to_string(),
                0.90,
                100,
                2000,
            ),
            Summarizer::new(oracle, 5000),
            PersistenceGateway::new(store, embedder, index, "items".to_string(), 8000),
            0.70,
        )
    }

    async fn stored_id(store: &Store, url: &str, title: &str, content: &str) -> i64 {
        store
            .insert_raw_document(&NewRawDocument::from_scrape(
                url.to_string(),
                title.to_string(),
                content.to_string(),
                "2026-08-04".to_string(),
                "agenda".to_string(),
                "Los Angeles".to_string(),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fixture_batch_records_one_audit_row() {
        let (store, index) = prepared_store().await;
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(32));

        let runner = RunRunner::new(
            Arc::new(FixtureSource::new(store.clone())),
            store.clone(),
            orchestrator_with(store.clone(), index, embedder),
            false,
        );

        let stats = runner.run().await.unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.relevant, 1);
        assert_eq!(stats.new_items, 1);
        assert_eq!(stats.failed, 0);

        let audit = store.latest_run().await.unwrap().unwrap();
        assert_eq!(audit.status, "success");
        assert_eq!(audit.items_processed, 2);
        assert_eq!(audit.items_relevant, 1);
        assert!(!audit.has_errors());
    }

    #[tokio::test]
    async fn test_one_failing_document_does_not_stop_the_batch() {
        let (store, index) = prepared_store().await;

        let good_a = stored_id(
            &store,
            "https://example.org/a",
            "Rent Control Ordinance Update",
            "The council discusses amending the rent stabilization ordinance to cap \
             annual increases at 3% for units built before 1995 across the county.",
        )
        .await;
        let poisoned = stored_id(
            &store,
            "https://example.org/b",
            "Eviction Ordinance Amendment",
            "POISON-MARKER The board considers an ordinance amendment adding just-cause \
             eviction protections for tenants in unincorporated areas of the county.",
        )
        .await;
        let good_c = stored_id(
            &store,
            "https://example.org/c",
            "Deposit Ordinance Amendment",
            "An ordinance amendment would cap security deposit amounts and require \
             itemized deductions for rental units throughout the county's cities.",
        )
        .await;

        let embedder: Arc<dyn Embedder> = Arc::new(TrippedEmbedder {
            inner: MockEmbedder::new(32),
            marker: "POISON-MARKER".to_string(),
        });

        let runner = RunRunner::new(
            Arc::new(StaticSource {
                ids: vec![good_a, poisoned, good_c],
            }),
            store.clone(),
            orchestrator_with(store.clone(), index, embedder),
            false,
        );

        let stats = runner.run().await.unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 1);

        let audit = store.latest_run().await.unwrap().unwrap();
        assert_eq!(audit.status, "completed_with_errors");
        assert!(audit.error_log.contains(&format!("Doc {poisoned}")));
        // the failed document never produced an item row
        assert_eq!(store.counts().await.unwrap().items, 2);
    }

    #[tokio::test]
    async fn test_classification_failure_still_persists_the_document() {
        struct HalfBrokenOracle;

        #[async_trait]
        impl Oracle for HalfBrokenOracle {
            async fn complete(&self, system: &str, user: &str) -> Result<String> {
                if user.contains("Bravo") {
                    return Err(PipelineError::Oracle("oracle unavailable".to_string()));
                }
                MockOracle::new().complete(system, user).await
            }
        }

        let (store, index) = prepared_store().await;
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(32));
        let oracle: Arc<dyn Oracle> = Arc::new(HalfBrokenOracle);
        let retriever =
            ContextRetriever::new(embedder.clone(), index.clone(), "kb".to_string(), 3);

        let orchestrator = PipelineOrchestrator::new(
            RelevanceClassifier::new(oracle.clone(), retriever, 3000),
            DeduplicationEngine::new(
                store.clone(),
                embedder.clone(),
                index.clone(),
                "items".to_string(),
                0.90,
                100,
                2000,
            ),
            Summarizer::new(oracle, 5000),
            PersistenceGateway::new(
                store.clone(),
                embedder,
                index,
                "items".to_string(),
                8000,
            ),
            0.70,
        );

        let bravo = stored_id(
            &store,
            "https://example.org/bravo",
            "Bravo Notice",
            "Routine notice mentioning Bravo with no legislative content at all.",
        )
        .await;
        let charlie = stored_id(
            &store,
            "https://example.org/charlie",
            "Pool Hours Extended",
            "Community pools will stay open an extra hour this summer.",
        )
        .await;

        let runner = RunRunner::new(
            Arc::new(StaticSource {
                ids: vec![bravo, charlie],
            }),
            store.clone(),
            orchestrator,
            false,
        );

        let stats = runner.run().await.unwrap();
        // a classification failure is non-fatal: both documents persist
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(store.counts().await.unwrap().items, 2);

        let audit = store.latest_run().await.unwrap().unwrap();
        assert_eq!(audit.status, "success");
    }

    #[tokio::test]
    async fn test_collection_failure_is_recorded_globally() {
        let (store, index) = prepared_store().await;
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(32));

        let runner = RunRunner::new(
            Arc::new(BrokenSource),
            store.clone(),
            orchestrator_with(store.clone(), index, embedder),
            false,
        );

        let stats = runner.run().await.unwrap();
        assert_eq!(stats.processed, 0);

        let audit = store.latest_run().await.unwrap().unwrap();
        assert_eq!(audit.status, "completed_with_errors");
        assert!(audit.error_log.starts_with("Global:"));
    }
}
