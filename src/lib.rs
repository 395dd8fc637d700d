// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod ai;
pub mod collector;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rag;
pub mod utils;
pub mod vector;

pub use ai::{Embedder, MockEmbedder, MockOracle, OpenAiClient, Oracle};
pub use collector::{DocumentSource, FixtureSource, PendingSource};
pub use config::{Config, DatabaseConfig, OracleConfig, PipelineConfig, VectorConfig};
pub use database::{SchemaManager, Store};
pub use error::{PipelineError, Result};
pub use models::{
    Classification, DedupOutcome, DedupReason, Digest, ProcessedItem, ProcessingDocument,
    RawDocument, RunAudit, Topic,
};
pub use pipeline::{
    DeduplicationEngine, PersistenceGateway, PipelineOrchestrator, RelevanceClassifier, RunRunner,
    RunStats, Summarizer,
};
pub use rag::ContextRetriever;
pub use vector::{MemoryIndex, QdrantIndex, ScoredPoint, VectorIndex};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert_eq!(config.vector.kb_collection, "kb_chunks");
    }
}
