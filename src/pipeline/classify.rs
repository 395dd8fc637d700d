// file: src/pipeline/classify.rs
// description: relevance classification against the oracle with kb context
// reference: one chat request per document, strict json response

use crate::ai::{bounded_prefix, extract_json, Oracle};
use crate::error::{PipelineError, Result};
use crate::models::{Classification, ProcessingDocument};
use crate::rag::ContextRetriever;
use std::sync::Arc;
use tracing::{info, warn};

const QUERY_PREFIX_CHARS: usize = 500;
const RATIONALE_MAX_CHARS: usize = 300;

const SYSTEM_TEMPLATE: &str = r#"You classify whether a document is relevant to county housing legislation (rent control, tenant protections, fair housing, eviction and just cause, landlord obligations, fees and deposits, rental registration, enforcement, zoning and supply, voucher and source-of-income rules).

REFERENCE CONTEXT:
{context}

Return STRICT JSON ONLY with this schema:
{
  "is_relevant": boolean,
  "relevance_score": number,
  "topics": ["rent_control"|"fair_housing"|"eviction"|"fees_deposits"|"registration"|"enforcement"|"zoning_supply"|"voucher_soi"|"other"],
  "rationale": string,
  "confidence": number
}

Rules:
- Scores and confidence are between 0.0 and 1.0; keep the rationale under 40 words.
- A document about a general housing program with no regulatory or legislative change is not relevant unless it changes landlord or tenant obligations.
- If unclear, set is_relevant=false with a low score and explain the uncertainty."#;

pub struct RelevanceClassifier {
    oracle: Arc<dyn Oracle>,
    retriever: ContextRetriever,
    text_limit: usize,
}

impl RelevanceClassifier {
    pub fn new(oracle: Arc<dyn Oracle>, retriever: ContextRetriever, text_limit: usize) -> Self {
        Self {
            oracle,
            retriever,
            text_limit,
        }
    }

    /// Classify the document. Never fails the pipeline: an unreachable
    /// oracle or an unparseable response routes the document down the
    /// non-relevant branch with the failure recorded for audit.
    pub async fn classify(&self, mut doc: ProcessingDocument) -> ProcessingDocument {
        info!("Classifying document {}", doc.raw_document_id);

        let query = format!(
            "{} {}",
            doc.title,
            bounded_prefix(&doc.content_text, QUERY_PREFIX_CHARS)
        );
        let context = self.retriever.retrieve(&query).await;

        let system = SYSTEM_TEMPLATE.replace("{context}", &context);
        let user = format!(
            "DOCUMENT METADATA:\n\
             county: {}\n\
             source_type: {}\n\
             title: {}\n\
             url: {}\n\n\
             DOCUMENT TEXT (partial):\n{}",
            doc.county,
            doc.source_type,
            doc.title,
            doc.url,
            bounded_prefix(&doc.content_text, self.text_limit)
        );

        match self.request(&system, &user).await {
            Ok(classification) => {
                doc.classification = Some(classification);
            }
            Err(e) => {
                warn!(
                    "Classification failed for document {}: {}",
                    doc.raw_document_id, e
                );
                doc.note_error("classification", &e.to_string());
                doc.classification = Some(Classification {
                    is_relevant: false,
                    relevance_score: 0.0,
                    topics: Vec::new(),
                    rationale: String::new(),
                    confidence: 0.0,
                });
            }
        }

        doc
    }

    async fn request(&self, system: &str, user: &str) -> Result<Classification> {
        let content = self.oracle.complete(system, user).await?;
        let mut classification: Classification = serde_json::from_str(extract_json(&content))
            .map_err(|e| PipelineError::OracleResponse(e.to_string()))?;

        classification.relevance_score = classification.relevance_score.clamp(0.0, 1.0);
        classification.confidence = classification.confidence.clamp(0.0, 1.0);
        classification.rationale =
            bounded_prefix(&classification.rationale, RATIONALE_MAX_CHARS).to_string();
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockEmbedder, MockOracle};
    use crate::models::{RawDocument, Topic};
    use crate::vector::{MemoryIndex, VectorIndex};
    use async_trait::async_trait;

    struct FailingOracle;

    #[async_trait]
    impl Oracle for FailingOracle {
        async fn complete(&self, _: &str, _: &str) -> Result<String> {
            Err(PipelineError::Oracle("connection refused".to_string()))
        }
    }

    struct GarbageOracle;

    #[async_trait]
    impl Oracle for GarbageOracle {
        async fn complete(&self, _: &str, _: &str) -> Result<String> {
            Ok("I'd be happy to help with that!".to_string())
        }
    }

    fn doc_fixture(title: &str, content: &str) -> ProcessingDocument {
        ProcessingDocument::from_raw(RawDocument {
            id: 1,
            url: "https://example.org/a".to_string(),
            url_normalized: "https://example.org/a".to_string(),
            title: title.to_string(),
            content_text: content.to_string(),
            content_hash: "h".to_string(),
            extracted_date: "2026-08-01".to_string(),
            source_type: "agenda".to_string(),
            county: "Los Angeles".to_string(),
        })
    }

    async fn classifier_with(oracle: Arc<dyn Oracle>) -> RelevanceClassifier {
        let index = Arc::new(MemoryIndex::new());
        index.ensure_collection("kb", 8).await.unwrap();
        let retriever = ContextRetriever::new(
            Arc::new(MockEmbedder::new(8)),
            index,
            "kb".to_string(),
            3,
        );
        RelevanceClassifier::new(oracle, retriever, 3000)
    }

    #[tokio::test]
    async fn test_classify_relevant_document() {
        let classifier = classifier_with(Arc::new(MockOracle::new())).await;
        let doc = doc_fixture(
            "Rent Control Ordinance Update",
            "The city council discusses amending the rent stabilization ordinance to cap increases at 3%.",
        );

        let doc = classifier.classify(doc).await;
        let classification = doc.classification.unwrap();
        assert!(classification.is_relevant);
        assert!(classification.topics.contains(&Topic::RentControl));
        assert!(doc.stage_errors.is_empty());
    }

    #[tokio::test]
    async fn test_classify_oracle_failure_defaults_to_non_relevant() {
        let classifier = classifier_with(Arc::new(FailingOracle)).await;
        let doc = doc_fixture("Anything", "text");

        let doc = classifier.classify(doc).await;
        let classification = doc.classification.unwrap();
        assert!(!classification.is_relevant);
        assert_eq!(classification.relevance_score, 0.0);
        assert_eq!(doc.stage_errors.len(), 1);
        assert!(doc.stage_errors[0].starts_with("classification:"));
    }

    #[tokio::test]
    async fn test_classify_unparseable_response_defaults_to_non_relevant() {
        let classifier = classifier_with(Arc::new(GarbageOracle)).await;
        let doc = doc_fixture("Anything", "text");

        let doc = classifier.classify(doc).await;
        assert!(!doc.is_relevant());
        assert_eq!(doc.stage_errors.len(), 1);
    }
}
