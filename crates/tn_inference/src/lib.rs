use std::env;
use std::time::Duration;
use tn_core::EMBEDDING_DIMENSION;

pub mod analysis;
pub mod embeddings;
pub mod models;

pub const DEFAULT_MODEL_URL: &str = "http://localhost:11434";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_CHAT_MODEL: &str = "llama3.1:8b-instruct-q4_K_M";

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub model_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub dimension: usize,
    pub embed_timeout: Duration,
    pub generate_timeout: Duration,
}

impl InferenceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_url: env::var("OLLAMA_URL").unwrap_or(defaults.model_url),
            embedding_model: env::var("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            chat_model: env::var("CHAT_MODEL").unwrap_or(defaults.chat_model),
            ..defaults
        }
    }

    pub fn with_model_url(mut self, url: impl Into<String>) -> Self {
        self.model_url = url.into();
        self
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_url: DEFAULT_MODEL_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            dimension: EMBEDDING_DIMENSION,
            embed_timeout: Duration::from_secs(30),
            generate_timeout: Duration::from_secs(60),
        }
    }
}

pub mod prelude {
    pub use super::analysis::{PipelineOptions, RetrievalPipeline, SearchFailurePolicy};
    pub use super::embeddings::EmbeddingGenerator;
    pub use super::models::{create_models, Models};
    pub use super::InferenceConfig;
    pub use tn_core::{AnalysisResult, Citation, Error, Result};
}

pub use models::create_models;
