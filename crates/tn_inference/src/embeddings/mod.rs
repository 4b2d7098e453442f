use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tn_core::{Embedder, Error, Result};

/// Guards an embedding backend: blank input is refused before any call, and
/// vectors of the wrong length are reported as embedding failures.
pub struct EmbeddingGenerator {
    model: Arc<dyn Embedder>,
    dimension: usize,
}

impl fmt::Debug for EmbeddingGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingGenerator")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl EmbeddingGenerator {
    pub fn new(model: Arc<dyn Embedder>, dimension: usize) -> Self {
        Self { model, dimension }
    }
}

#[async_trait]
impl Embedder for EmbeddingGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::Validation("Cannot embed empty text".to_string()));
        }

        let embedding = self.model.embed(text).await.map_err(|e| match e {
            Error::Embedding(_) => e,
            other => Error::Embedding(other.to_string()),
        })?;

        if embedding.len() != self.dimension {
            return Err(Error::Embedding(format!(
                "Expected {} dimensions, got {}",
                self.dimension,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
