use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tn_core::{
    normalize_ticker, AnalysisResult, AnswerGenerator, Citation, Embedder, Error, Result, SearchResult,
};
use tn_storage::DocumentStore;
use tracing::{debug, error, info, warn};

use super::context;
use super::prompt::{self, QueryMode};

pub const EMBEDDING_FAILED: &str = "embedding failed";
pub const GENERATION_FAILED: &str = "generation failed";
pub const SEARCH_FAILED: &str = "search failed";

/// What to do when the store reports an error instead of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFailurePolicy {
    /// Log it and answer as if nothing matched.
    #[default]
    TreatAsEmpty,
    /// End the run with a `search failed` error.
    Report,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub context_chars: usize,
    pub ticker_search_limit: usize,
    pub cross_search_limit: usize,
    pub ticker_citations: usize,
    pub cross_citations: usize,
    pub search_failure: SearchFailurePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            context_chars: 3000,
            ticker_search_limit: 20,
            cross_search_limit: 100,
            ticker_citations: 6,
            cross_citations: 8,
            search_failure: SearchFailurePolicy::TreatAsEmpty,
        }
    }
}

struct Query {
    question: String,
    ticker: Option<String>,
    mode: QueryMode,
}

impl Query {
    fn scope(&self) -> &str {
        self.ticker.as_deref().unwrap_or("all tickers")
    }
}

/// embed → search → assemble → generate → cite.
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<DocumentStore>,
    generator: Arc<dyn AnswerGenerator>,
    options: PipelineOptions,
}

impl fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("embedder", &self.embedder)
            .field("store", &self.store.collection())
            .field("generator", &self.generator.name())
            .field("options", &self.options)
            .finish()
    }
}

fn require(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

fn require_ticker(ticker: &str) -> Result<String> {
    normalize_ticker(ticker).ok_or_else(|| Error::Validation("ticker must not be empty".to_string()))
}

impl RetrievalPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<DocumentStore>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self::with_options(embedder, store, generator, PipelineOptions::default())
    }

    pub fn with_options(
        embedder: Arc<dyn Embedder>,
        store: Arc<DocumentStore>,
        generator: Arc<dyn AnswerGenerator>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// "What's new" summary for one ticker.
    pub async fn analyze_default(&self, ticker: &str, max_age_days: u32) -> Result<AnalysisResult> {
        let ticker = require_ticker(ticker)?;
        let query = Query {
            question: prompt::default_question(&ticker),
            ticker: Some(ticker),
            mode: QueryMode::Latest,
        };
        self.run(query, max_age_days).await
    }

    pub async fn analyze_custom(&self, ticker: &str, question: &str, max_age_days: u32) -> Result<AnalysisResult> {
        let ticker = require_ticker(ticker)?;
        let question = require(question, "question")?;
        let query = Query {
            question,
            ticker: Some(ticker),
            mode: QueryMode::Custom,
        };
        self.run(query, max_age_days).await
    }

    pub async fn analyze_cross_ticker(&self, question: &str, max_age_days: u32) -> Result<AnalysisResult> {
        let question = require(question, "question")?;
        let query = Query {
            question,
            ticker: None,
            mode: QueryMode::CrossTicker,
        };
        self.run(query, max_age_days).await
    }

    /// Only validation errors leave this function as `Err`.
    async fn run(&self, query: Query, max_age_days: u32) -> Result<AnalysisResult> {
        let started = Instant::now();
        info!("🔎 Analyzing {} (last {} days): {}", query.scope(), max_age_days, query.question);

        let vector = match self.embedder.embed(&query.question).await {
            Ok(vector) => vector,
            Err(e) => {
                error!("Embedding the question failed: {}", e);
                return Ok(AnalysisResult::failed(EMBEDDING_FAILED));
            }
        };
        debug!("Question embedded in {:?}", started.elapsed());

        let searched = match &query.ticker {
            Some(ticker) => {
                self.store
                    .search_by_ticker(&vector, ticker, max_age_days, self.options.ticker_search_limit)
                    .await
            }
            None => {
                self.store
                    .search_all(&vector, max_age_days, self.options.cross_search_limit)
                    .await
            }
        };
        let results = match searched {
            Ok(results) => results,
            Err(e) => match self.options.search_failure {
                SearchFailurePolicy::TreatAsEmpty => {
                    warn!("⚠️ Search failed, continuing with no results: {}", e);
                    Vec::new()
                }
                SearchFailurePolicy::Report => {
                    error!("Search failed: {}", e);
                    return Ok(AnalysisResult::failed(SEARCH_FAILED));
                }
            },
        };
        info!("📰 {} matching articles", results.len());

        if results.is_empty() {
            return Ok(AnalysisResult::empty(format!(
                "no recent news found for {} in the last {} days",
                query.scope(),
                max_age_days
            )));
        }

        let context = context::assemble(&results, self.options.context_chars);
        let system_prompt = prompt::system_prompt(query.mode);
        let user_prompt = prompt::user_prompt(&query.question, &context);
        debug!("Context is {} chars", context.chars().count());

        let answer = match self.generator.generate(system_prompt, &user_prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Generation failed: {}", e);
                return Ok(AnalysisResult::failed(GENERATION_FAILED));
            }
        };

        let citations = self.citations(&results, query.mode);
        info!("✅ Analysis complete in {:?} ({} citations)", started.elapsed(), citations.len());
        Ok(AnalysisResult::answered(answer, citations, results.len()))
    }

    fn citations(&self, results: &[SearchResult], mode: QueryMode) -> Vec<Citation> {
        let count = match mode {
            QueryMode::CrossTicker => self.options.cross_citations,
            QueryMode::Latest | QueryMode::Custom => self.options.ticker_citations,
        };
        results.iter().take(count).map(Citation::from).collect()
    }
}
