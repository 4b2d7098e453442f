use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tn_core::{normalize_ticker, NewsDocument, Result};

use crate::NewsSource;

/// Reads documents from a JSON array or a JSON-lines file.
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_documents(raw: &str) -> Result<Vec<NewsDocument>> {
    if raw.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(raw)?);
    }
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str::<NewsDocument>(line)?))
        .collect()
}

#[async_trait]
impl NewsSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, ticker: &str) -> Result<Vec<NewsDocument>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let wanted = normalize_ticker(ticker);
        Ok(parse_documents(&raw)?
            .into_iter()
            .filter(|doc| normalize_ticker(&doc.ticker) == wanted)
            .collect())
    }
}
