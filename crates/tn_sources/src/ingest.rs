use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tn_core::{normalize_ticker, Error, InstrumentType, Result};
use tn_storage::DocumentStore;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::NewsSource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub ticker: String,
    pub fetched: usize,
    pub stored: usize,
    /// Items without article text.
    pub skipped: usize,
    pub failed: usize,
}

/// Fetches news per ticker and upserts it. Tickers run concurrently, bounded
/// by a semaphore; the store is the only shared state.
pub struct IngestManager {
    source: Arc<dyn NewsSource>,
    store: Arc<DocumentStore>,
    semaphore: Arc<Semaphore>,
}

impl IngestManager {
    pub fn new(source: Arc<dyn NewsSource>, store: Arc<DocumentStore>, concurrency: usize) -> Self {
        Self {
            source,
            store,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub async fn ingest_ticker(&self, ticker: &str, instrument_type: InstrumentType) -> Result<IngestReport> {
        let ticker = normalize_ticker(ticker)
            .ok_or_else(|| Error::Validation("ticker must not be empty".to_string()))?;
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::External(e.into()))?;

        info!("🦗 Fetching {} news from {}", ticker, self.source.name());
        let documents = self.source.fetch(&ticker).await?;
        let mut report = IngestReport {
            ticker: ticker.clone(),
            fetched: documents.len(),
            ..IngestReport::default()
        };

        for doc in &documents {
            match self.store.upsert_document(&ticker, instrument_type, doc).await {
                Ok(true) => {
                    debug!("💾 {}", doc.title);
                    report.stored += 1;
                }
                Ok(false) => {
                    debug!("⏭️ {} (no article text)", doc.title);
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!("Failed to embed document {}: {}", doc.title, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "✅ {}: {} stored, {} skipped, {} failed",
            ticker, report.stored, report.skipped, report.failed
        );
        Ok(report)
    }

    /// One result per ticker, in input order.
    pub async fn ingest_all(&self, tickers: &[String], instrument_type: InstrumentType) -> Vec<Result<IngestReport>> {
        join_all(
            tickers
                .iter()
                .map(|ticker| self.ingest_ticker(ticker, instrument_type)),
        )
        .await
    }
}
