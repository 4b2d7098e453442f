use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        vectors_config::Config, Condition, CreateCollection, CreateFieldIndexCollection,
        Distance as QdrantDistance, FieldType, Filter, PointStruct, Range, ScoredPoint,
        SearchPoints, UpsertPoints, VectorParams, VectorsConfig, WithPayloadSelector,
    },
    Payload, Qdrant, QdrantError,
};
use std::sync::Arc;
use tn_core::{
    CollectionSchema, Distance, Error, PayloadFieldKind, Result, SearchFilter, SearchResult,
    StoredNews, VectorIndex,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{BackendConfig, StorageBackend};

fn storage_error(e: QdrantError) -> Error {
    Error::Storage(e.to_string())
}

/// Qdrant accepts only UUID or integer point ids. Anything else is mapped to a
/// stable UUIDv5 so the same document id always lands on the same point.
pub fn point_id(doc_id: &str) -> String {
    Uuid::parse_str(doc_id)
        .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, doc_id.as_bytes()))
        .to_string()
}

fn field_type(kind: PayloadFieldKind) -> FieldType {
    match kind {
        PayloadFieldKind::Keyword => FieldType::Keyword,
        PayloadFieldKind::Text => FieldType::Text,
        PayloadFieldKind::Integer => FieldType::Integer,
    }
}

fn distance(distance: Distance) -> QdrantDistance {
    match distance {
        Distance::Cosine => QdrantDistance::Cosine,
    }
}

pub fn build_filter(filter: &SearchFilter) -> Filter {
    let mut conditions = vec![Condition::range(
        "published_at",
        Range {
            gte: Some(filter.published_since as f64),
            ..Default::default()
        },
    )];
    if let Some(ticker) = &filter.ticker {
        conditions.push(Condition::matches("ticker", ticker.clone()));
    }
    Filter::must(conditions)
}

fn parse_point(point: ScoredPoint) -> Option<SearchResult> {
    let payload: serde_json::Map<String, serde_json::Value> = point
        .payload
        .into_iter()
        .map(|(key, value)| (key, value.into_json()))
        .collect();
    match serde_json::from_value::<StoredNews>(serde_json::Value::Object(payload)) {
        Ok(document) => Some(SearchResult {
            document,
            score: point.score,
        }),
        Err(e) => {
            warn!("⚠️ Skipping point with malformed payload: {}", e);
            None
        }
    }
}

pub struct QdrantStorage {
    client: Arc<Qdrant>,
    url: String,
}

#[async_trait]
impl StorageBackend for QdrantStorage {
    fn get_error_message() -> &'static str {
        "Qdrant should be running on http://localhost:6334 (gRPC); set QDRANT_URL or --backend-url"
    }

    async fn connect(config: &BackendConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key.clone())
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| Error::External(e.into()))?;
        info!("🔌 Qdrant client configured for {}", config.url);
        Ok(Self {
            client: Arc::new(client),
            url: config.url.clone(),
        })
    }
}

impl QdrantStorage {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VectorIndex for QdrantStorage {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn ensure_collection(&self, schema: &CollectionSchema) -> Result<()> {
        if self
            .client
            .collection_exists(&schema.name)
            .await
            .map_err(storage_error)?
        {
            debug!("Collection {} already exists", schema.name);
            return Ok(());
        }

        let vectors_config = VectorsConfig {
            config: Some(Config::Params(VectorParams {
                size: schema.vector_size,
                distance: distance(schema.distance).into(),
                ..Default::default()
            })),
        };

        let created = self
            .client
            .create_collection(CreateCollection {
                collection_name: schema.name.clone(),
                vectors_config: Some(vectors_config),
                on_disk_payload: Some(true),
                ..Default::default()
            })
            .await;

        match created {
            Ok(_) => {
                info!("📦 Created collection {}", schema.name);
                Ok(())
            }
            // another process may have won the race
            Err(e) => {
                if self
                    .client
                    .collection_exists(&schema.name)
                    .await
                    .map_err(storage_error)?
                {
                    Ok(())
                } else {
                    Err(storage_error(e))
                }
            }
        }
    }

    async fn ensure_field_index(&self, collection: &str, field: &str, kind: PayloadFieldKind) -> Result<()> {
        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(storage_error)?;
        let indexed = info
            .result
            .map(|info| info.payload_schema.contains_key(field))
            .unwrap_or(false);
        if indexed {
            return Ok(());
        }

        self.client
            .create_field_index(CreateFieldIndexCollection {
                collection_name: collection.to_string(),
                field_name: field.to_string(),
                field_type: Some(field_type(kind).into()),
                wait: Some(true),
                ..Default::default()
            })
            .await
            .map_err(storage_error)?;
        info!("🗂️ Created {:?} index on {}.{}", kind, collection, field);
        Ok(())
    }

    async fn upsert(&self, collection: &str, id: &str, vector: Vec<f32>, payload: &StoredNews) -> Result<()> {
        let payload = Payload::try_from(serde_json::to_value(payload)?).map_err(storage_error)?;
        let point = PointStruct::new(point_id(id), vector, payload);

        self.client
            .upsert_points(UpsertPoints {
                collection_name: collection.to_string(),
                points: vec![point],
                wait: Some(true),
                ..Default::default()
            })
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let request = SearchPoints {
            collection_name: collection.to_string(),
            vector: vector.to_vec(),
            filter: Some(build_filter(filter)),
            limit: limit as u64,
            with_payload: Some(WithPayloadSelector::from(true)),
            ..Default::default()
        };

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| Error::Search(e.to_string()))?;

        Ok(response.result.into_iter().filter_map(parse_point).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_keeps_uuids() {
        let id = "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d";
        assert_eq!(point_id(id), id);
    }

    #[test]
    fn test_point_id_is_stable_for_other_ids() {
        let first = point_id("yahoo-12345");
        assert_eq!(first, point_id("yahoo-12345"));
        assert_ne!(first, point_id("yahoo-12346"));
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_filter_scopes_by_ticker() {
        let scoped = build_filter(&SearchFilter {
            ticker: Some("AAPL".to_string()),
            published_since: 1_700_000_000,
        });
        assert_eq!(scoped.must.len(), 2);

        let unscoped = build_filter(&SearchFilter {
            ticker: None,
            published_since: 1_700_000_000,
        });
        assert_eq!(unscoped.must.len(), 1);
    }
}
