use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tn_core::{NewsDocument, Result};

pub mod extract;
pub mod ingest;
pub mod json;
pub mod yahoo;

pub use extract::{ArticleExtractor, ExtractedArticle};
pub use ingest::{IngestManager, IngestReport};
pub use json::JsonFileSource;
pub use yahoo::YahooNewsSource;

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Returns the name of the news source
    fn name(&self) -> &str;

    /// News items for one ticker. Items whose article could not be extracted
    /// come back with `article_text: None`.
    async fn fetch(&self, ticker: &str) -> Result<Vec<NewsDocument>>;
}

/// Yahoo Finance unless a file is given.
pub fn create_source(file: Option<PathBuf>) -> Arc<dyn NewsSource> {
    match file {
        Some(path) => Arc::new(JsonFileSource::new(path)),
        None => Arc::new(YahooNewsSource::new()),
    }
}

pub mod prelude {
    pub use super::{IngestManager, IngestReport, NewsSource};
    pub use tn_core::{NewsDocument, Result, Error};
}
