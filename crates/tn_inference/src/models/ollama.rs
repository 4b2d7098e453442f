use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tn_core::{AnswerGenerator, Embedder, Error, Result};
use tracing::debug;
use url::Url;

use crate::InferenceConfig;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama server. One instance serves both embeddings and
/// completions, each with its own model and timeout.
pub struct OllamaModel {
    client: Client,
    base_url: Url,
    embedding_model: String,
    chat_model: String,
    dimension: usize,
    embed_timeout: Duration,
    generate_timeout: Duration,
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_str())
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .finish()
    }
}

impl OllamaModel {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let mut raw = config.model_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("Invalid model URL {}: {}", config.model_url, e)))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            dimension: config.dimension,
            embed_timeout: config.embed_timeout,
            generate_timeout: config.generate_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid endpoint {}: {}", path, e)))
    }
}

#[async_trait]
impl Embedder for OllamaModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response = self
            .client
            .post(self.endpoint("api/embeddings")?)
            .timeout(self.embed_timeout)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Embedding(e.to_string()))?
            .json::<EmbeddingResponse>()
            .await
            .map_err(|e| Error::Embedding(format!("Malformed embedding response: {}", e)))?;

        if response.embedding.is_empty() {
            return Err(Error::Embedding("Empty embedding returned".to_string()));
        }
        debug!("Embedded {} chars into {} dims", text.len(), response.embedding.len());
        Ok(response.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl AnswerGenerator for OllamaModel {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.chat_model,
            system: system_prompt,
            prompt: user_prompt,
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint("api/generate")?)
            .timeout(self.generate_timeout)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Generation(e.to_string()))?
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Generation(format!("Malformed generation response: {}", e)))?;

        Ok(response.response.trim().to_string())
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
