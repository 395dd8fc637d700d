// file: src/database/mod.rs
// description: database operations module exports
// reference: internal module structure

pub mod schema;
pub mod store;

pub use schema::SchemaManager;
pub use store::{ItemMatch, ReconcileCandidate, Store, StoreCounts};
