use async_trait::async_trait;
use std::fmt;
use tn_core::{AnswerGenerator, Embedder, Result};

/// Offline stand-in for a real model: deterministic character-bucket
/// embeddings and an answer that restates the top context block.
pub struct DummyModel {
    dimension: usize,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel")
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl DummyModel {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(2),
        }
    }
}

#[async_trait]
impl Embedder for DummyModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; self.dimension];

        // Use text length as a feature
        let text_len = text.chars().count().max(1) as f32;
        embedding[0] = text_len / 1000.0;

        let buckets = self.dimension - 1;
        for c in text.chars().flat_map(char::to_lowercase) {
            embedding[1 + (c as u32 as usize) % buckets] += 1.0 / text_len;
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl AnswerGenerator for DummyModel {
    async fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        let headline = user_prompt
            .split_once("Context:\n")
            .and_then(|(_, context)| context.lines().next())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .unwrap_or("no context was provided");
        Ok(format!("Most relevant item: {}", headline))
    }

    fn name(&self) -> &str {
        "Dummy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new(768);

        let first = model.embed("Apple reported strong iPhone sales.").await.unwrap();
        let second = model.embed("Apple reported strong iPhone sales.").await.unwrap();
        assert_eq!(first.len(), 768);
        assert_eq!(first, second);
        assert!(first[0] > 0.0); // Text length feature should be non-zero

        let answer = model
            .generate("system", "Question: q\n\nContext:\n[AAPL] Apple beats (2024-05-02 20:30)\nbody")
            .await
            .unwrap();
        assert_eq!(answer, "Most relevant item: [AAPL] Apple beats (2024-05-02 20:30)");
    }
}
