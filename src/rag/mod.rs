// file: src/rag/mod.rs
// description: retrieval-augmented context module exports
// reference: internal module structure

pub mod retrieve;

pub use retrieve::ContextRetriever;
