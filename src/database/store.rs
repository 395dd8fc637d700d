// file: src/database/store.rs
// description: structured-store access layer over a SQLite connection pool
// reference: https://docs.rs/sqlx

use crate::error::{PipelineError, Result};
use crate::models::{NewRawDocument, ProcessedItem, ProcessingDocument, RawDocument, RunAudit};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

/// Lightweight reference to an existing item, used by duplicate lookups.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemMatch {
    pub id: i64,
    pub title: String,
}

/// A relevant, newly-introduced item that may need its embedding rebuilt.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReconcileCandidate {
    pub item_id: i64,
    pub title: String,
    pub content_text: String,
    pub county: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct StoreCounts {
    pub raw_documents: i64,
    pub items: i64,
    pub runs: i64,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to SQLite at {}", url);

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PipelineError::Config(format!(
                        "cannot create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        // A single connection serializes writes and keeps in-memory databases
        // coherent across the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// In-memory store, used by tests and throwaway runs.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a raw document. A duplicate normalized URL is a no-op that
    /// returns the existing row's id.
    pub async fn insert_raw_document(&self, doc: &NewRawDocument) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO raw_documents
                (url, url_normalized, title, content_text, content_hash,
                 extracted_date, source_type, county)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.url)
        .bind(&doc.url_normalized)
        .bind(&doc.title)
        .bind(&doc.content_text)
        .bind(&doc.content_hash)
        .bind(&doc.extracted_date)
        .bind(&doc.source_type)
        .bind(&doc.county)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let existing: i64 =
                sqlx::query_scalar("SELECT id FROM raw_documents WHERE url_normalized = ?")
                    .bind(&doc.url_normalized)
                    .fetch_one(&self.pool)
                    .await?;
            debug!(
                "Raw document already stored as id {} ({})",
                existing, doc.url_normalized
            );
            return Ok(existing);
        }

        Ok(result.last_insert_rowid())
    }

    pub async fn raw_document(&self, id: i64) -> Result<Option<RawDocument>> {
        let row = sqlx::query_as::<_, RawDocument>(
            r#"
            SELECT id, url, url_normalized, title, content_text, content_hash,
                   extracted_date, source_type, county
            FROM raw_documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Raw documents that have no processed item yet, oldest first.
    pub async fn pending_raw_document_ids(&self, limit: Option<usize>) -> Result<Vec<i64>> {
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let ids = sqlx::query_scalar(
            r#"
            SELECT r.id
            FROM raw_documents r
            LEFT JOIN items i ON i.raw_document_id = r.id
            WHERE i.id IS NULL
            ORDER BY r.id
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn find_item_by_url(&self, url_normalized: &str) -> Result<Option<ItemMatch>> {
        let row = sqlx::query_as::<_, ItemMatch>(
            r#"
            SELECT i.id, i.title
            FROM items i
            JOIN raw_documents r ON i.raw_document_id = r.id
            WHERE r.url_normalized = ?
            ORDER BY i.id
            LIMIT 1
            "#,
        )
        .bind(url_normalized)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_item_by_hash(&self, content_hash: &str) -> Result<Option<ItemMatch>> {
        let row = sqlx::query_as::<_, ItemMatch>(
            r#"
            SELECT i.id, i.title
            FROM items i
            JOIN raw_documents r ON i.raw_document_id = r.id
            WHERE r.content_hash = ?
            ORDER BY i.id
            LIMIT 1
            "#,
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Insert one processed item row for the document, whatever branch it
    /// took through the pipeline. Returns the new item id.
    pub async fn insert_item(&self, doc: &ProcessingDocument) -> Result<i64> {
        let classification = doc.classification.as_ref();
        let topics = match classification {
            Some(c) => serde_json::to_string(&c.topics)?,
            None => "[]".to_string(),
        };

        let digest = doc.digest.as_ref();
        let key_points = digest
            .map(|d| serde_json::to_string(&d.key_points))
            .transpose()?;
        let impacted_parties = digest
            .map(|d| serde_json::to_string(&d.impacted_parties))
            .transpose()?;
        let important_dates = digest
            .map(|d| serde_json::to_string(&d.important_dates))
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO items
                (raw_document_id, title, is_relevant, relevance_score, topics,
                 relevance_rationale, relevance_confidence, is_new, dedup_reason,
                 matched_item_id, heading, summary, key_points, impacted_parties,
                 important_dates, summary_confidence, stage_errors, processed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(doc.raw_document_id)
        .bind(&doc.title)
        .bind(doc.is_relevant())
        .bind(doc.relevance_score() as f64)
        .bind(topics)
        .bind(classification.map(|c| c.rationale.as_str()).unwrap_or(""))
        .bind(classification.map(|c| c.confidence as f64).unwrap_or(0.0))
        .bind(doc.is_new())
        .bind(doc.dedup_reason())
        .bind(doc.matched_item_id())
        .bind(digest.map(|d| d.heading.as_str()))
        .bind(digest.map(|d| d.summary.as_str()))
        .bind(key_points)
        .bind(impacted_parties)
        .bind(important_dates)
        .bind(digest.map(|d| d.confidence as f64))
        .bind(doc.stage_errors.join("\n"))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_run(&self, audit: &RunAudit) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO runs
                (status, items_processed, items_relevant, items_new, error_log,
                 started_at, finished_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&audit.status)
        .bind(audit.items_processed)
        .bind(audit.items_relevant)
        .bind(audit.items_new)
        .bind(&audit.error_log)
        .bind(audit.started_at)
        .bind(audit.finished_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn latest_run(&self) -> Result<Option<RunAudit>> {
        let row = sqlx::query_as::<_, RunAudit>(
            r#"
            SELECT id, status, items_processed, items_relevant, items_new,
                   error_log, started_at, finished_at
            FROM runs
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn recent_items(&self, limit: usize) -> Result<Vec<ProcessedItem>> {
        let rows = sqlx::query_as::<_, ProcessedItem>(
            r#"
            SELECT id, raw_document_id, title, is_relevant, relevance_score,
                   topics, relevance_rationale, relevance_confidence, is_new,
                   dedup_reason, matched_item_id, heading, summary, key_points,
                   impacted_parties, important_dates, summary_confidence,
                   stage_errors, processed_at
            FROM items
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Items that qualify for an embedding (relevant, new, non-empty text),
    /// used by the reconciliation sweep.
    pub async fn reconcile_candidates(&self) -> Result<Vec<ReconcileCandidate>> {
        let rows = sqlx::query_as::<_, ReconcileCandidate>(
            r#"
            SELECT i.id AS item_id, i.title, r.content_text, r.county, r.url
            FROM items i
            JOIN raw_documents r ON i.raw_document_id = r.id
            WHERE i.is_relevant = 1 AND i.is_new = 1 AND length(r.content_text) > 0
            ORDER BY i.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn counts(&self) -> Result<StoreCounts> {
        let raw_documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw_documents")
            .fetch_one(&self.pool)
            .await?;
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        let runs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM runs")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreCounts {
            raw_documents,
            items,
            runs,
        })
    }
}
