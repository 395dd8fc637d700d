// file: src/models/run.rs
// description: append-only audit record summarizing one batch execution
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RunAudit {
    #[sqlx(default)]
    pub id: i64,
    pub status: String,
    pub items_processed: i64,
    pub items_relevant: i64,
    pub items_new: i64,
    /// Newline-joined per-document and batch-level failures.
    pub error_log: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunAudit {
    pub fn has_errors(&self) -> bool {
        !self.error_log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors() {
        let mut audit = RunAudit {
            id: 1,
            status: "success".to_string(),
            items_processed: 3,
            items_relevant: 1,
            items_new: 1,
            error_log: String::new(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };
        assert!(!audit.has_errors());

        audit.error_log = "Doc 9: oracle timeout".to_string();
        assert!(audit.has_errors());
    }
}
