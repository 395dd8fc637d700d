// file: src/database/schema.rs
// description: SQLite schema management for the structured store
// reference: https://docs.rs/sqlx

use crate::database::store::Store;
use crate::error::Result;
use tracing::{info, warn};

const CREATE_RAW_DOCUMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS raw_documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    url_normalized TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    content_text TEXT NOT NULL DEFAULT '',
    content_hash TEXT NOT NULL DEFAULT '',
    extracted_date TEXT NOT NULL DEFAULT '',
    source_type TEXT NOT NULL DEFAULT '',
    county TEXT NOT NULL DEFAULT ''
)
"#;

const CREATE_ITEMS: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    raw_document_id INTEGER NOT NULL REFERENCES raw_documents(id),
    title TEXT NOT NULL DEFAULT '',
    is_relevant INTEGER NOT NULL DEFAULT 0,
    relevance_score REAL NOT NULL DEFAULT 0,
    topics TEXT NOT NULL DEFAULT '[]',
    relevance_rationale TEXT NOT NULL DEFAULT '',
    relevance_confidence REAL NOT NULL DEFAULT 0,
    is_new INTEGER NOT NULL DEFAULT 0,
    dedup_reason TEXT,
    matched_item_id INTEGER,
    heading TEXT,
    summary TEXT,
    key_points TEXT,
    impacted_parties TEXT,
    important_dates TEXT,
    summary_confidence REAL,
    stage_errors TEXT NOT NULL DEFAULT '',
    processed_at TEXT NOT NULL
)
"#;

const CREATE_RUNS: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    status TEXT NOT NULL,
    items_processed INTEGER NOT NULL DEFAULT 0,
    items_relevant INTEGER NOT NULL DEFAULT 0,
    items_new INTEGER NOT NULL DEFAULT 0,
    error_log TEXT NOT NULL DEFAULT '',
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL
)
"#;

const CREATE_INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_raw_documents_content_hash ON raw_documents(content_hash)",
    "CREATE INDEX IF NOT EXISTS idx_items_raw_document_id ON items(raw_document_id)",
];

const TABLES: [&str; 3] = ["raw_documents", "items", "runs"];

pub struct SchemaManager<'a> {
    store: &'a Store,
}

impl<'a> SchemaManager<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Create tables and indexes. Idempotent.
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing SQLite schema");

        for statement in [CREATE_RAW_DOCUMENTS, CREATE_ITEMS, CREATE_RUNS] {
            sqlx::query(statement).execute(self.store.pool()).await?;
        }

        for statement in CREATE_INDEXES {
            sqlx::query(statement).execute(self.store.pool()).await?;
        }

        info!("SQLite schema initialized successfully");
        Ok(())
    }

    pub async fn verify(&self) -> Result<bool> {
        for table in TABLES {
            let found: Option<String> = sqlx::query_scalar(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(self.store.pool())
            .await?;

            if found.is_none() {
                warn!("Table '{}' does not exist", table);
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_and_verify() {
        let store = Store::in_memory().await.unwrap();
        let manager = SchemaManager::new(&store);

        assert!(!manager.verify().await.unwrap());
        manager.initialize().await.unwrap();
        assert!(manager.verify().await.unwrap());

        // second initialize is a no-op
        manager.initialize().await.unwrap();
        assert!(manager.verify().await.unwrap());
    }
}
