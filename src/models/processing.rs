// file: src/models/processing.rs
// description: mutable in-flight document state threaded through the pipeline
// reference: internal data structures

use crate::models::RawDocument;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Controlled topic vocabulary for classified documents. Unknown strings
/// returned by the oracle collapse into `Other` instead of failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    RentControl,
    FairHousing,
    Eviction,
    FeesDeposits,
    Registration,
    Enforcement,
    ZoningSupply,
    VoucherSoi,
    #[serde(other)]
    Other,
}

/// Structured relevance verdict parsed from the oracle response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub is_relevant: bool,
    #[serde(default)]
    pub relevance_score: f32,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub confidence: f32,
}

/// Which deduplication tier matched, highest confidence first.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupReason {
    Url,
    Hash,
    Semantic { score: f32 },
}

impl fmt::Display for DedupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupReason::Url => write!(f, "url"),
            DedupReason::Hash => write!(f, "hash"),
            DedupReason::Semantic { score } => write!(f, "semantic (score={score:.2})"),
        }
    }
}

/// Outcome of the deduplication stage.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupOutcome {
    New,
    Duplicate {
        reason: DedupReason,
        matched_item_id: i64,
    },
}

/// Structured digest parsed from the oracle summarization response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub impacted_parties: Vec<String>,
    #[serde(default)]
    pub important_dates: Vec<String>,
    #[serde(default)]
    pub confidence: f32,
}

/// The in-flight record owned by exactly one pipeline run for one document.
/// Stage outputs are `Option` so "not yet computed" stays distinguishable
/// from "computed empty".
#[derive(Debug, Clone)]
pub struct ProcessingDocument {
    pub raw_document_id: i64,
    pub url: String,
    pub url_normalized: String,
    pub title: String,
    pub content_text: String,
    pub content_hash: String,
    pub extracted_date: String,
    pub source_type: String,
    pub county: String,
    pub classification: Option<Classification>,
    pub dedup: Option<DedupOutcome>,
    pub digest: Option<Digest>,
    /// Non-fatal stage failures recorded for the audit trail.
    pub stage_errors: Vec<String>,
}

impl ProcessingDocument {
    pub fn from_raw(raw: RawDocument) -> Self {
        Self {
            raw_document_id: raw.id,
            url: raw.url,
            url_normalized: raw.url_normalized,
            title: raw.title,
            content_text: raw.content_text,
            content_hash: raw.content_hash,
            extracted_date: raw.extracted_date,
            source_type: raw.source_type,
            county: raw.county,
            classification: None,
            dedup: None,
            digest: None,
            stage_errors: Vec::new(),
        }
    }

    pub fn is_relevant(&self) -> bool {
        self.classification
            .as_ref()
            .map(|c| c.is_relevant)
            .unwrap_or(false)
    }

    pub fn relevance_score(&self) -> f32 {
        self.classification
            .as_ref()
            .map(|c| c.relevance_score)
            .unwrap_or(0.0)
    }

    /// True only when deduplication ran and found no match. A document that
    /// never reached the dedup stage is not "new".
    pub fn is_new(&self) -> bool {
        matches!(self.dedup, Some(DedupOutcome::New))
    }

    pub fn matched_item_id(&self) -> Option<i64> {
        match &self.dedup {
            Some(DedupOutcome::Duplicate {
                matched_item_id, ..
            }) => Some(*matched_item_id),
            _ => None,
        }
    }

    pub fn dedup_reason(&self) -> Option<String> {
        match &self.dedup {
            Some(DedupOutcome::Duplicate { reason, .. }) => Some(reason.to_string()),
            _ => None,
        }
    }

    pub fn note_error(&mut self, stage: &str, message: &str) {
        self.stage_errors.push(format!("{stage}: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_fixture() -> RawDocument {
        RawDocument {
            id: 7,
            url: "https://example.org/agenda".to_string(),
            url_normalized: "https://example.org/agenda".to_string(),
            title: "Agenda".to_string(),
            content_text: "text".to_string(),
            content_hash: "abc".to_string(),
            extracted_date: "2026-08-01".to_string(),
            source_type: "agenda".to_string(),
            county: "Los Angeles".to_string(),
        }
    }

    #[test]
    fn test_topic_parses_controlled_vocabulary() {
        let topics: Vec<Topic> =
            serde_json::from_str(r#"["rent_control", "voucher_soi", "zoning_supply"]"#).unwrap();
        assert_eq!(
            topics,
            vec![Topic::RentControl, Topic::VoucherSoi, Topic::ZoningSupply]
        );
    }

    #[test]
    fn test_topic_unknown_string_maps_to_other() {
        let topics: Vec<Topic> = serde_json::from_str(r#"["parking_minimums"]"#).unwrap();
        assert_eq!(topics, vec![Topic::Other]);
    }

    #[test]
    fn test_dedup_reason_display() {
        assert_eq!(DedupReason::Url.to_string(), "url");
        assert_eq!(DedupReason::Hash.to_string(), "hash");
        assert_eq!(
            DedupReason::Semantic { score: 0.934 }.to_string(),
            "semantic (score=0.93)"
        );
    }

    #[test]
    fn test_classification_parses_with_missing_fields() {
        let parsed: Classification = serde_json::from_str(r#"{"is_relevant": true}"#).unwrap();
        assert!(parsed.is_relevant);
        assert_eq!(parsed.relevance_score, 0.0);
        assert!(parsed.topics.is_empty());
    }

    #[test]
    fn test_unstarted_document_is_neither_relevant_nor_new() {
        let doc = ProcessingDocument::from_raw(raw_fixture());
        assert!(!doc.is_relevant());
        assert!(!doc.is_new());
        assert_eq!(doc.matched_item_id(), None);
        assert_eq!(doc.dedup_reason(), None);
    }

    #[test]
    fn test_duplicate_outcome_accessors() {
        let mut doc = ProcessingDocument::from_raw(raw_fixture());
        doc.dedup = Some(DedupOutcome::Duplicate {
            reason: DedupReason::Url,
            matched_item_id: 42,
        });

        assert!(!doc.is_new());
        assert_eq!(doc.matched_item_id(), Some(42));
        assert_eq!(doc.dedup_reason().as_deref(), Some("url"));
    }
}
