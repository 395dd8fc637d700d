// file: src/pipeline/summarize.rs
// description: structured digest generation for accepted documents
// reference: one chat request per document, strict json response

use crate::ai::{bounded_prefix, extract_json, Oracle};
use crate::error::{PipelineError, Result};
use crate::models::{Digest, ProcessingDocument};
use std::sync::Arc;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = r#"You write concise, plain-English structured summaries of county housing legislation and policy actions. Do not invent facts. If dates are missing, use "unknown" and lower the confidence.

Return STRICT JSON ONLY with this schema:
{
  "heading": string,
  "summary": string,
  "key_points": string[],
  "impacted_parties": string[],
  "important_dates": string[],
  "confidence": number
}

Rules:
- Use only information supported by the document text.
- summary is 3-6 sentences; key_points is 3-7 bullets.
- important_dates entries are ISO dates with a short label, or "unknown".
- If the document is an agenda or minutes, summarize the housing-related items."#;

pub struct Summarizer {
    oracle: Arc<dyn Oracle>,
    text_limit: usize,
}

impl Summarizer {
    pub fn new(oracle: Arc<dyn Oracle>, text_limit: usize) -> Self {
        Self { oracle, text_limit }
    }

    /// Produce a digest for the document. Failures keep whatever fields the
    /// document already carries; persistence proceeds with partial data.
    pub async fn summarize(&self, mut doc: ProcessingDocument) -> ProcessingDocument {
        info!("Summarizing document {}", doc.raw_document_id);

        let user = format!(
            "DOCUMENT METADATA:\n\
             county: {}\n\
             title: {}\n\
             url: {}\n\
             extracted_date: {}\n\n\
             DOCUMENT TEXT:\n{}",
            doc.county,
            doc.title,
            doc.url,
            doc.extracted_date,
            bounded_prefix(&doc.content_text, self.text_limit)
        );

        match self.request(&user).await {
            Ok(digest) => {
                doc.digest = Some(digest);
            }
            Err(e) => {
                warn!(
                    "Summarization failed for document {}: {}",
                    doc.raw_document_id, e
                );
                doc.note_error("summarization", &e.to_string());
            }
        }

        doc
    }

    async fn request(&self, user: &str) -> Result<Digest> {
        let content = self.oracle.complete(SYSTEM_PROMPT, user).await?;
        let mut digest: Digest = serde_json::from_str(extract_json(&content))
            .map_err(|e| PipelineError::OracleResponse(e.to_string()))?;

        digest.confidence = digest.confidence.clamp(0.0, 1.0);
        Ok(digest)
    }
}
