// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod item;
pub mod processing;
pub mod raw_document;
pub mod run;

pub use item::ProcessedItem;
pub use processing::{
    Classification, DedupOutcome, DedupReason, Digest, ProcessingDocument, Topic,
};
pub use raw_document::{NewRawDocument, RawDocument};
pub use run::RunAudit;
