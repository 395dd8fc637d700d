// file: src/error.rs
// description: custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Oracle request failed: {0}")]
    Oracle(String),

    #[error("Oracle response did not match the expected schema: {0}")]
    OracleResponse(String),

    #[error("Duplicate lookup failed: {0}")]
    DuplicateLookup(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
