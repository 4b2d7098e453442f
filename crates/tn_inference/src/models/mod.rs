use std::sync::Arc;
use tn_core::{AnswerGenerator, Embedder, Error, Result};
use tracing::info;

use crate::embeddings::EmbeddingGenerator;
use crate::InferenceConfig;

pub mod dummy;
pub mod ollama;

pub use dummy::DummyModel;
pub use ollama::OllamaModel;

/// The two model handles the rest of the system is wired with.
#[derive(Debug, Clone)]
pub struct Models {
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn AnswerGenerator>,
}

/// Build the models named by `kind` ("ollama" or "dummy"). The embedder is
/// always wrapped in an [`EmbeddingGenerator`].
pub fn create_models(kind: &str, config: &InferenceConfig) -> Result<Models> {
    let models = match kind {
        "ollama" => {
            let model = Arc::new(OllamaModel::new(config)?);
            Models {
                embedder: Arc::new(EmbeddingGenerator::new(model.clone(), config.dimension)),
                generator: model,
            }
        }
        "dummy" => {
            let model = Arc::new(DummyModel::new(config.dimension));
            Models {
                embedder: Arc::new(EmbeddingGenerator::new(model.clone(), config.dimension)),
                generator: model,
            }
        }
        other => {
            return Err(Error::Config(format!(
                "Unknown model: {}. Available models: ollama, dummy",
                other
            )))
        }
    };
    info!("🧠 Inference model initialized (using {})", models.generator.name());
    Ok(models)
}
