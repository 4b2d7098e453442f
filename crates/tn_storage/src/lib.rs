use async_trait::async_trait;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tn_core::{Error, Result, VectorIndex, EMBEDDING_DIMENSION};

pub mod backends;
pub mod store;

pub use backends::*;
pub use store::{DocumentStore, PAYLOAD_INDEXES};

pub const DEFAULT_COLLECTION: &str = "text_docs";

#[async_trait]
pub trait StorageBackend: VectorIndex + Sized {
    /// Hint shown to the user when the backend cannot be reached.
    fn get_error_message() -> &'static str;

    async fn connect(config: &BackendConfig) -> Result<Self>;
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub collection: String,
    pub vector_size: u64,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let url = env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());
        let collection = env::var("QDRANT_COLLECTION").unwrap_or_else(|_| DEFAULT_COLLECTION.to_string());
        let api_key = env::var("QDRANT_API_KEY").ok().filter(|key| !key.is_empty());
        let timeout = env::var("QDRANT_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .unwrap_or(30);
        Self {
            url,
            collection,
            vector_size: EMBEDDING_DIMENSION as u64,
            api_key,
            timeout: Duration::from_secs(timeout),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            vector_size: EMBEDDING_DIMENSION as u64,
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Open the backend named by `kind` ("memory" or "qdrant").
pub async fn create_storage(kind: &str, config: &BackendConfig) -> Result<Arc<dyn VectorIndex>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStorage::connect(config).await?)),
        #[cfg(feature = "qdrant")]
        "qdrant" => Ok(Arc::new(QdrantStorage::connect(config).await?)),
        other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
    }
}

/// Hint for the backend named by `kind`.
pub fn storage_hint(kind: &str) -> &'static str {
    match kind {
        #[cfg(feature = "qdrant")]
        "qdrant" => QdrantStorage::get_error_message(),
        _ => MemoryStorage::get_error_message(),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, BackendConfig, DocumentStore, StorageBackend};
}
