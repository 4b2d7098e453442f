use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Dimension of every stored embedding.
pub const EMBEDDING_DIMENSION: usize = 768;

/// `doc_type` written on every news payload.
pub const NEWS_DOC_TYPE: &str = "news";

pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentType {
    Stock,
    Etf,
    Index,
    Crypto,
    Currency,
    Future,
    MutualFund,
}

impl InstrumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::Stock => "STOCK",
            InstrumentType::Etf => "ETF",
            InstrumentType::Index => "INDEX",
            InstrumentType::Crypto => "CRYPTO",
            InstrumentType::Currency => "CURRENCY",
            InstrumentType::Future => "FUTURE",
            InstrumentType::MutualFund => "MUTUAL_FUND",
        }
    }
}

impl Default for InstrumentType {
    fn default() -> Self {
        Self::Stock
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "STOCK" | "EQUITY" => Ok(Self::Stock),
            "ETF" => Ok(Self::Etf),
            "INDEX" => Ok(Self::Index),
            "CRYPTO" | "CRYPTOCURRENCY" => Ok(Self::Crypto),
            "CURRENCY" => Ok(Self::Currency),
            "FUTURE" => Ok(Self::Future),
            "MUTUAL_FUND" | "MUTUALFUND" => Ok(Self::MutualFund),
            other => Err(Error::Validation(format!("Unknown instrument type: {}", other))),
        }
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// A news item as delivered by an article source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsDocument {
    pub id: String,
    pub ticker: String,
    #[serde(default)]
    pub instrument_type: InstrumentType,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub provider: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    /// Extracted body; `None` when extraction failed.
    #[serde(default)]
    pub article_text: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl NewsDocument {
    /// Only documents with a non-blank article body may be embedded.
    pub fn is_embeddable(&self) -> bool {
        self.article_text
            .as_deref()
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Payload attached to a stored vector. Parsing into this type is the single
/// validation step for anything read back from an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNews {
    pub doc_id: String,
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
    /// Epoch seconds.
    pub published_at: i64,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub provider: String,
    pub ticker: String,
    pub instrument_type: InstrumentType,
    #[serde(default)]
    pub instrument_id: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    pub url: String,
}

fn default_doc_type() -> String {
    NEWS_DOC_TYPE.to_string()
}

impl StoredNews {
    pub fn from_document(ticker: &str, instrument_type: InstrumentType, doc: &NewsDocument) -> Self {
        Self {
            doc_id: doc.id.clone(),
            doc_type: NEWS_DOC_TYPE.to_string(),
            published_at: doc.published_at.timestamp(),
            title: doc.title.clone(),
            summary: doc.summary.clone(),
            provider: doc.provider.clone(),
            ticker: ticker.to_string(),
            instrument_type,
            instrument_id: None,
            language: doc.language.clone(),
            url: doc.url.clone(),
        }
    }
}

/// Equality and recency constraints applied to a similarity search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub ticker: Option<String>,
    /// Inclusive lower bound on `published_at`, epoch seconds.
    pub published_since: i64,
}

impl SearchFilter {
    pub fn recent(ticker: Option<&str>, max_age_days: u32, now: DateTime<Utc>) -> Self {
        // windows reaching past chrono's range admit everything
        let cutoff = Duration::try_days(i64::from(max_age_days))
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self {
            ticker: ticker.map(str::to_string),
            published_since: cutoff.timestamp(),
        }
    }

    pub fn matches(&self, doc: &StoredNews) -> bool {
        if doc.published_at < self.published_since {
            return false;
        }
        match &self.ticker {
            Some(ticker) => &doc.ticker == ticker,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: StoredNews,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub published_at: i64,
    pub ticker: String,
    pub score: f32,
}

impl From<&SearchResult> for Citation {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.document.title.clone(),
            url: result.document.url.clone(),
            published_at: result.document.published_at,
            ticker: result.document.ticker.clone(),
            score: result.score,
        }
    }
}

/// Outcome of one pipeline run. Serialises to `{answer, citations, total_results}`
/// or `{error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Answered {
        answer: String,
        citations: Vec<Citation>,
        total_results: usize,
    },
    Failed {
        error: String,
    },
}

impl AnalysisResult {
    pub fn answered(answer: impl Into<String>, citations: Vec<Citation>, total_results: usize) -> Self {
        Self::Answered {
            answer: answer.into(),
            citations,
            total_results,
        }
    }

    /// A successful run that matched nothing.
    pub fn empty(answer: impl Into<String>) -> Self {
        Self::answered(answer, Vec::new(), 0)
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed { error: error.into() }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered { answer, .. } => Some(answer),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Answered { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }

    pub fn citations(&self) -> &[Citation] {
        match self {
            Self::Answered { citations, .. } => citations,
            Self::Failed { .. } => &[],
        }
    }

    pub fn total_results(&self) -> usize {
        match self {
            Self::Answered { total_results, .. } => *total_results,
            Self::Failed { .. } => 0,
        }
    }
}
