// file: src/models/raw_document.rs
// description: as-fetched document records produced by the collection stage
// reference: internal data structures

use crate::collector::normalize::{content_fingerprint, normalize_url};
use serde::{Deserialize, Serialize};

/// A raw page as stored by the collection stage. Immutable once written;
/// the pipeline only ever reads these rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RawDocument {
    pub id: i64,
    pub url: String,
    pub url_normalized: String,
    pub title: String,
    pub content_text: String,
    pub content_hash: String,
    pub extracted_date: String,
    pub source_type: String,
    pub county: String,
}

/// A raw document that has not been assigned a row id yet.
#[derive(Debug, Clone)]
pub struct NewRawDocument {
    pub url: String,
    pub url_normalized: String,
    pub title: String,
    pub content_text: String,
    pub content_hash: String,
    pub extracted_date: String,
    pub source_type: String,
    pub county: String,
}

impl NewRawDocument {
    /// Build a record from scraped fields, filling in the normalized URL and
    /// content fingerprint.
    pub fn from_scrape(
        url: String,
        title: String,
        content_text: String,
        extracted_date: String,
        source_type: String,
        county: String,
    ) -> Self {
        let url_normalized = normalize_url(&url);
        let content_hash = content_fingerprint(&content_text);

        Self {
            url,
            url_normalized,
            title,
            content_text,
            content_hash,
            extracted_date,
            source_type,
            county,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scrape_fills_derived_fields() {
        let doc = NewRawDocument::from_scrape(
            "HTTPS://Example.org/agenda/?session=9#item3".to_string(),
            "Agenda".to_string(),
            "Meeting agenda text".to_string(),
            "2026-08-01".to_string(),
            "agenda".to_string(),
            "Los Angeles".to_string(),
        );

        assert_eq!(doc.url_normalized, "https://example.org/agenda");
        assert_eq!(doc.content_hash.len(), 64);
    }

    #[test]
    fn test_from_scrape_empty_content_has_sentinel_hash() {
        let doc = NewRawDocument::from_scrape(
            "https://example.org".to_string(),
            "Empty".to_string(),
            String::new(),
            "2026-08-01".to_string(),
            "official".to_string(),
            "Alameda".to_string(),
        );

        assert_eq!(doc.content_hash, "");
    }
}
