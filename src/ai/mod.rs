// file: src/ai/mod.rs
// description: oracle and embedding client seams with shared prompt helpers
// reference: internal module structure

pub mod mock;
pub mod openai;

pub use mock::{MockEmbedder, MockOracle};
pub use openai::OpenAiClient;

use crate::error::Result;
use async_trait::async_trait;

/// Text-understanding service invoked for classification and summarization.
/// One request, one JSON document back.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Dense-embedding provider for the vector index.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Clip text to a character-bounded prefix for prompt and embedding input.
/// Cuts on a char boundary, never mid-codepoint.
pub fn bounded_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Oracle responses sometimes arrive wrapped in markdown code fences even
/// when strict JSON was requested. Strip them before parsing.
pub fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bounded_prefix_respects_char_boundaries() {
        assert_eq!(bounded_prefix("héllo wörld", 4), "héll");
        assert_eq!(bounded_prefix("short", 100), "short");
        assert_eq!(bounded_prefix("", 10), "");
    }

    #[test]
    fn test_extract_json_strips_fences() {
        assert_eq!(extract_json("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(extract_json("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("  {\"a\": 1}  "), "{\"a\": 1}");
    }
}
