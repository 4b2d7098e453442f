use async_trait::async_trait;

use crate::types::{SearchFilter, SearchResult, StoredNews};
use crate::Result;

/// How a payload field is indexed by the vector backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFieldKind {
    Keyword,
    Text,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    Cosine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: String,
    pub vector_size: u64,
    pub distance: Distance,
}

/// Opaque indexed store with filtered nearest-neighbour search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Create the collection unless it already exists.
    async fn ensure_collection(&self, schema: &CollectionSchema) -> Result<()>;

    /// Create a payload index unless one is already registered for `field`.
    async fn ensure_field_index(&self, collection: &str, field: &str, kind: PayloadFieldKind) -> Result<()>;

    /// Insert or overwrite the point keyed by `id`.
    async fn upsert(&self, collection: &str, id: &str, vector: Vec<f32>, payload: &StoredNews) -> Result<()>;

    /// Results ordered by descending similarity, at most `limit` of them.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>>;
}
