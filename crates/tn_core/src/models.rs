use async_trait::async_trait;
use std::fmt;

use crate::Result;

#[async_trait]
pub trait Embedder: Send + Sync + fmt::Debug {
    /// Turn a non-empty piece of text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of the vectors returned by `embed`.
    fn dimension(&self) -> usize;
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync + fmt::Debug {
    /// Produce free text for a system/user prompt pair.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}
