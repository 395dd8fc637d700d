// file: src/pipeline/orchestrator.rs
// description: per-document state machine sequencing the pipeline stages
// reference: classify -> dedupe -> summarize -> persist with gate predicates

use crate::error::{PipelineError, Result};
use crate::models::{ProcessingDocument, RawDocument};
use crate::pipeline::classify::RelevanceClassifier;
use crate::pipeline::dedupe::DeduplicationEngine;
use crate::pipeline::persist::PersistenceGateway;
use crate::pipeline::summarize::Summarizer;
use tracing::debug;

/// Pipeline stages. Persisting is reached exactly once on every path, so
/// every seen document leaves a processed item behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classifying,
    Deduping,
    Summarizing,
    Persisting,
    Done,
}

pub struct DocumentOutcome {
    pub item_id: i64,
    pub document: ProcessingDocument,
}

/// Drives one document through the stage machine. Holds only the stage
/// components; all per-document state lives on the document itself.
pub struct PipelineOrchestrator {
    classifier: RelevanceClassifier,
    dedupe: DeduplicationEngine,
    summarizer: Summarizer,
    gateway: PersistenceGateway,
    relevance_threshold: f32,
}

impl PipelineOrchestrator {
    pub fn new(
        classifier: RelevanceClassifier,
        dedupe: DeduplicationEngine,
        summarizer: Summarizer,
        gateway: PersistenceGateway,
        relevance_threshold: f32,
    ) -> Self {
        Self {
            classifier,
            dedupe,
            summarizer,
            gateway,
            relevance_threshold,
        }
    }

    /// Relevance gate: only documents the oracle marked relevant with a
    /// score at or above the threshold are worth deduplicating.
    fn relevance_gate(&self, doc: &ProcessingDocument) -> bool {
        doc.is_relevant() && doc.relevance_score() >= self.relevance_threshold
    }

    pub async fn run_document(&self, raw: RawDocument) -> Result<DocumentOutcome> {
        let mut doc = ProcessingDocument::from_raw(raw);
        let mut stage = Stage::Classifying;
        let mut item_id: Option<i64> = None;

        while stage != Stage::Done {
            debug!("Document {} entering stage {:?}", doc.raw_document_id, stage);

            stage = match stage {
                Stage::Classifying => {
                    doc = self.classifier.classify(doc).await;
                    if self.relevance_gate(&doc) {
                        Stage::Deduping
                    } else {
                        // duplicates of a non-relevant item are not sought
                        Stage::Persisting
                    }
                }
                Stage::Deduping => {
                    doc = self.dedupe.process(doc).await?;
                    if doc.is_new() {
                        Stage::Summarizing
                    } else {
                        // a duplicate is never re-summarized
                        Stage::Persisting
                    }
                }
                Stage::Summarizing => {
                    doc = self.summarizer.summarize(doc).await;
                    Stage::Persisting
                }
                Stage::Persisting => {
                    item_id = Some(self.gateway.persist(&mut doc).await?);
                    Stage::Done
                }
                Stage::Done => Stage::Done,
            };
        }

        let item_id = item_id.ok_or_else(|| {
            PipelineError::Validation("document left the pipeline without persisting".to_string())
        })?;

        Ok(DocumentOutcome {
            item_id,
            document: doc,
        })
    }
}
