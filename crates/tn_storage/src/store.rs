use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tn_core::{
    CollectionSchema, Distance, Embedder, Error, InstrumentType, NewsDocument, PayloadFieldKind, Result,
    SearchFilter, SearchResult, StoredNews, VectorIndex,
};
use tracing::{debug, error, info};

/// Secondary indexes provisioned on every collection.
pub const PAYLOAD_INDEXES: [(&str, PayloadFieldKind); 10] = [
    ("doc_id", PayloadFieldKind::Keyword),
    ("doc_type", PayloadFieldKind::Keyword),
    ("published_at", PayloadFieldKind::Integer),
    ("title", PayloadFieldKind::Text),
    ("summary", PayloadFieldKind::Text),
    ("provider", PayloadFieldKind::Keyword),
    ("ticker", PayloadFieldKind::Keyword),
    ("instrument_type", PayloadFieldKind::Keyword),
    ("instrument_id", PayloadFieldKind::Keyword),
    ("language", PayloadFieldKind::Keyword),
];

/// Typed upsert and filtered search over a vector index.
pub struct DocumentStore {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    schema: CollectionSchema,
}

impl DocumentStore {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, collection: impl Into<String>) -> Self {
        let schema = CollectionSchema {
            name: collection.into(),
            vector_size: embedder.dimension() as u64,
            distance: Distance::Cosine,
        };
        Self {
            index,
            embedder,
            schema,
        }
    }

    pub fn collection(&self) -> &str {
        &self.schema.name
    }

    pub fn backend(&self) -> &str {
        self.index.name()
    }

    /// Safe to call on every startup.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.index.ensure_collection(&self.schema).await?;
        for (field, kind) in PAYLOAD_INDEXES {
            self.index
                .ensure_field_index(&self.schema.name, field, kind)
                .await?;
        }
        debug!("Schema ready for collection {}", self.schema.name);
        Ok(())
    }

    /// Runs `ensure_schema` until it succeeds, bounding each attempt by `timeout`.
    pub async fn ensure_schema_with_retry(&self, max_retries: u32, timeout: Duration) -> Result<()> {
        let mut retries = 0;
        let mut last_error = None;

        while retries < max_retries {
            match tokio::time::timeout(timeout, self.ensure_schema()).await {
                Ok(Ok(())) => {
                    info!("🏦 Storage ready (using {}, collection {})", self.backend(), self.collection());
                    return Ok(());
                }
                Ok(Err(e)) => last_error = Some(e),
                Err(elapsed) => {
                    last_error = Some(Error::Storage(format!("Schema setup timed out: {}", elapsed)));
                }
            }
            retries += 1;
            if retries < max_retries {
                info!("Storage setup failed, retrying {}/{}...", retries, max_retries);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Storage("Storage setup failed after all retries".to_string())))
    }

    /// Embeds the article body and writes it under `doc.id`.
    ///
    /// Returns `Ok(false)` without touching the embedder or the index when the
    /// document has no article text.
    pub async fn upsert_document(
        &self,
        ticker: &str,
        instrument_type: InstrumentType,
        doc: &NewsDocument,
    ) -> Result<bool> {
        let text = match doc.article_text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                debug!("Skipping {} ({}): no article text", doc.id, doc.title);
                return Ok(false);
            }
        };

        let vector = self.embedder.embed(text).await?;
        let payload = StoredNews::from_document(ticker, instrument_type, doc);
        self.index
            .upsert(&self.schema.name, &doc.id, vector, &payload)
            .await?;
        debug!("Upserted {} for {}", doc.id, ticker);
        Ok(true)
    }

    pub async fn search_by_ticker(
        &self,
        vector: &[f32],
        ticker: &str,
        max_age_days: u32,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let filter = SearchFilter::recent(Some(ticker), max_age_days, Utc::now());
        self.search(vector, &filter, limit).await
    }

    pub async fn search_all(&self, vector: &[f32], max_age_days: u32, limit: usize) -> Result<Vec<SearchResult>> {
        let filter = SearchFilter::recent(None, max_age_days, Utc::now());
        self.search(vector, &filter, limit).await
    }

    async fn search(&self, vector: &[f32], filter: &SearchFilter, limit: usize) -> Result<Vec<SearchResult>> {
        let mut results = self
            .index
            .search(&self.schema.name, vector, filter, limit)
            .await
            .map_err(|e| {
                error!("Search on {} failed: {}", self.schema.name, e);
                match e {
                    Error::Search(_) => e,
                    other => Error::Search(other.to_string()),
                }
            })?;
        // the backend is trusted for ranking, not for filtering
        results.retain(|r| filter.matches(&r.document));
        results.truncate(limit);
        Ok(results)
    }
}
