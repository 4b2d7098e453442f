use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tn_core::{Error, InstrumentType, NewsDocument, Result, DEFAULT_LANGUAGE};
use tracing::{debug, info, warn};

use crate::extract::{ArticleExtractor, ExtractedArticle, USER_AGENT};
use crate::NewsSource;

const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsItem {
    uuid: String,
    title: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    provider_publish_time: Option<i64>,
}

/// News feed from Yahoo Finance's search endpoint, with article bodies
/// fetched and extracted from each link.
pub struct YahooNewsSource {
    client: Client,
    search_url: String,
    news_count: usize,
    timeout: Duration,
    extractor: ArticleExtractor,
}

impl YahooNewsSource {
    pub fn new() -> Self {
        Self::with_search_url(SEARCH_URL)
    }

    pub fn with_search_url(search_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            search_url: search_url.into(),
            news_count: 20,
            timeout: Duration::from_secs(20),
            extractor: ArticleExtractor::default(),
        }
    }

    pub fn with_news_count(mut self, news_count: usize) -> Self {
        self.news_count = news_count;
        self
    }

    async fn to_document(&self, ticker: &str, item: NewsItem) -> Option<NewsDocument> {
        let Some(link) = item.link else {
            warn!("⚠️ Dropping {}: no link", item.uuid);
            return None;
        };
        let published_at = match item.provider_publish_time.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)) {
            Some(published_at) => published_at,
            None => {
                warn!("⚠️ Dropping {}: bad publish time {:?}", item.uuid, item.provider_publish_time);
                return None;
            }
        };

        let extracted = match self.extractor.fetch(&link).await {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("⚠️ Could not extract {}: {}", link, e);
                ExtractedArticle::default()
            }
        };

        Some(NewsDocument {
            id: item.uuid,
            ticker: ticker.to_string(),
            instrument_type: InstrumentType::Stock,
            title: item.title,
            summary: extracted.summary.unwrap_or_default(),
            provider: item.publisher,
            published_at,
            url: link,
            article_text: extracted.text,
            language: DEFAULT_LANGUAGE.to_string(),
        })
    }
}

impl Default for YahooNewsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsSource for YahooNewsSource {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch(&self, ticker: &str) -> Result<Vec<NewsDocument>> {
        let news_count = self.news_count.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", ticker), ("quotesCount", "0"), ("newsCount", news_count.as_str())])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Source(format!("Yahoo news request for {} failed: {}", ticker, e)))?
            .json::<SearchResponse>()
            .await
            .map_err(|e| Error::Source(format!("Malformed Yahoo news response: {}", e)))?;

        info!("📰 {} news items for {}", response.news.len(), ticker);
        let documents = join_all(
            response
                .news
                .into_iter()
                .map(|item| self.to_document(ticker, item)),
        )
        .await;

        let documents: Vec<_> = documents.into_iter().flatten().collect();
        debug!(
            "{} of {} items for {} have article text",
            documents.iter().filter(|d| d.is_embeddable()).count(),
            documents.len(),
            ticker
        );
        Ok(documents)
    }
}
