use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use tn_core::{
    cosine_similarity, CollectionSchema, Error, PayloadFieldKind, Result, SearchFilter, SearchResult,
    StoredNews, VectorIndex,
};
use tokio::sync::RwLock;

use crate::{BackendConfig, StorageBackend};

struct MemoryPoint {
    id: String,
    vector: Vec<f32>,
    payload: StoredNews,
}

struct MemoryCollection {
    schema: CollectionSchema,
    indexes: HashMap<String, PayloadFieldKind>,
    points: Vec<MemoryPoint>,
}

impl MemoryCollection {
    fn upsert(&mut self, id: &str, vector: Vec<f32>, payload: &StoredNews) {
        if let Some(existing) = self.points.iter_mut().find(|p| p.id == id) {
            existing.vector = vector;
            existing.payload = payload.clone();
        } else {
            self.points.push(MemoryPoint {
                id: id.to_string(),
                vector,
                payload: payload.clone(),
            });
        }
    }

    fn search(&self, vector: &[f32], filter: &SearchFilter, limit: usize) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .points
            .iter()
            .filter(|p| filter.matches(&p.payload))
            .map(|p| SearchResult {
                document: p.payload.clone(),
                score: cosine_similarity(vector, &p.vector),
            })
            .collect();
        // stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(limit);
        results
    }
}

/// Brute-force cosine index held in process memory.
pub struct MemoryStorage {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn point_count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.points.len()).unwrap_or(0)
    }

    pub async fn field_indexes(&self, collection: &str) -> HashMap<String, PayloadFieldKind> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default()
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<(Vec<f32>, StoredNews)> {
        let collections = self.collections.read().await;
        collections
            .get(collection)?
            .points
            .iter()
            .find(|p| p.id == id)
            .map(|p| (p.vector.clone(), p.payload.clone()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_collection(name: &str) -> Error {
    Error::Storage(format!("Collection not found: {}", name))
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_config: &BackendConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl VectorIndex for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ensure_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(schema.name.clone())
            .or_insert_with(|| MemoryCollection {
                schema: schema.clone(),
                indexes: HashMap::new(),
                points: Vec::new(),
            });
        Ok(())
    }

    async fn ensure_field_index(&self, collection: &str, field: &str, kind: PayloadFieldKind) -> Result<()> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(collection)
            .ok_or_else(|| missing_collection(collection))?;
        collection.indexes.entry(field.to_string()).or_insert(kind);
        Ok(())
    }

    async fn upsert(&self, collection: &str, id: &str, vector: Vec<f32>, payload: &StoredNews) -> Result<()> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(collection)
            .ok_or_else(|| missing_collection(collection))?;
        if vector.len() as u64 != collection.schema.vector_size {
            return Err(Error::Storage(format!(
                "Vector dimension mismatch: expected {}, got {}",
                collection.schema.vector_size,
                vector.len()
            )));
        }
        collection.upsert(id, vector, payload);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(collection)
            .ok_or_else(|| missing_collection(collection))?;
        Ok(collection.search(vector, filter, limit))
    }
}
