// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub vector: VectorConfig,
    pub oracle: OracleConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub kb_collection: String,
    pub items_collection: String,
    pub vector_size: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub relevance_threshold: f32,
    pub dedupe_similarity_threshold: f32,
    /// Documents shorter than this are never semantically fingerprinted.
    pub semantic_min_chars: usize,
    pub semantic_text_limit: usize,
    pub classify_text_limit: usize,
    pub summary_text_limit: usize,
    pub embed_text_limit: usize,
    pub retrieve_top_k: usize,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HOUSING_MONITOR")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/housing_monitor.db?mode=rwc".to_string(),
            },
            vector: VectorConfig {
                url: "http://localhost:6333".to_string(),
                api_key: None,
                kb_collection: "kb_chunks".to_string(),
                items_collection: "legislation_items".to_string(),
                vector_size: 1536,
            },
            oracle: OracleConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                chat_model: "gpt-4o".to_string(),
                embedding_model: "text-embedding-3-small".to_string(),
            },
            pipeline: PipelineConfig {
                relevance_threshold: 0.70,
                dedupe_similarity_threshold: 0.90,
                semantic_min_chars: 100,
                semantic_text_limit: 2000,
                classify_text_limit: 3000,
                summary_text_limit: 5000,
                embed_text_limit: 8000,
                retrieve_top_k: 3,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.pipeline.relevance_threshold) {
            return Err(PipelineError::Config(
                "relevance_threshold must be within [0, 1]".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.pipeline.dedupe_similarity_threshold) {
            return Err(PipelineError::Config(
                "dedupe_similarity_threshold must be within [0, 1]".to_string(),
            ));
        }

        if self.vector.vector_size == 0 {
            return Err(PipelineError::Config(
                "vector_size must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.retrieve_top_k == 0 {
            return Err(PipelineError::Config(
                "retrieve_top_k must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
