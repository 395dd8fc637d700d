// file: src/models/item.rs
// description: durable processed item rows written once per raw document
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `items` table. Created exactly once per raw document and
/// never mutated afterwards; corrections require a new item.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessedItem {
    pub id: i64,
    pub raw_document_id: i64,
    pub title: String,
    pub is_relevant: bool,
    pub relevance_score: f64,
    /// JSON-encoded topic list.
    pub topics: String,
    pub relevance_rationale: String,
    pub relevance_confidence: f64,
    pub is_new: bool,
    pub dedup_reason: Option<String>,
    pub matched_item_id: Option<i64>,
    pub heading: Option<String>,
    pub summary: Option<String>,
    /// JSON-encoded bullet list; unset when the document never reached the
    /// summarizer.
    pub key_points: Option<String>,
    pub impacted_parties: Option<String>,
    pub important_dates: Option<String>,
    pub summary_confidence: Option<f64>,
    pub stage_errors: String,
    pub processed_at: DateTime<Utc>,
}
