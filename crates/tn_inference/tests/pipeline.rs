use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tn_core::{
    AnswerGenerator, CollectionSchema, Embedder, Error, InstrumentType, NewsDocument, PayloadFieldKind,
    Result, SearchFilter, SearchResult, StoredNews, VectorIndex,
};
use tn_inference::analysis::{PipelineOptions, RetrievalPipeline, SearchFailurePolicy};
use tn_storage::{DocumentStore, MemoryStorage};

const DIM: usize = 4;
const QUERY_VECTOR: [f32; DIM] = [1.0, 0.0, 0.0, 0.0];

/// Maps known article bodies to fixed vectors; everything else (the
/// questions) embeds to `QUERY_VECTOR`.
#[derive(Debug, Default)]
struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fail: bool,
    calls: AtomicUsize,
}

impl TableEmbedder {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Embedding("connection refused".to_string()));
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| QUERY_VECTOR.to_vec()))
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

#[derive(Debug, Default)]
struct RecordingGenerator {
    fail: bool,
    prompts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AnswerGenerator for RecordingGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        if self.fail {
            return Err(Error::Generation("timed out".to_string()));
        }
        Ok("Apple's iPhone sales were strong.".to_string())
    }

    fn name(&self) -> &str {
        "Recording"
    }
}

/// Memory index that counts searches and can be told to fail them.
#[derive(Default)]
struct CountingIndex {
    inner: MemoryStorage,
    fail_search: bool,
    searches: AtomicUsize,
}

#[async_trait]
impl VectorIndex for CountingIndex {
    fn name(&self) -> &str {
        "counting"
    }

    async fn ensure_collection(&self, schema: &CollectionSchema) -> Result<()> {
        self.inner.ensure_collection(schema).await
    }

    async fn ensure_field_index(&self, collection: &str, field: &str, kind: PayloadFieldKind) -> Result<()> {
        self.inner.ensure_field_index(collection, field, kind).await
    }

    async fn upsert(&self, collection: &str, id: &str, vector: Vec<f32>, payload: &StoredNews) -> Result<()> {
        self.inner.upsert(collection, id, vector, payload).await
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(Error::Storage("transport error".to_string()));
        }
        self.inner.search(collection, vector, filter, limit).await
    }
}

fn news(id: &str, ticker: &str, article: &str) -> NewsDocument {
    NewsDocument {
        id: id.to_string(),
        ticker: ticker.to_string(),
        instrument_type: InstrumentType::Stock,
        title: format!("{} headline {}", ticker, id),
        summary: format!("Summary of {}", id),
        provider: "Reuters".to_string(),
        published_at: Utc::now() - Duration::hours(1),
        url: format!("https://news.test/{}/{}", ticker, id),
        article_text: Some(article.to_string()),
        language: "English".to_string(),
    }
}

struct Fixture {
    index: Arc<CountingIndex>,
    store: Arc<DocumentStore>,
    generator: Arc<RecordingGenerator>,
}

impl Fixture {
    async fn new(index: CountingIndex, vectors: HashMap<String, Vec<f32>>) -> Self {
        let index = Arc::new(index);
        let embedder = Arc::new(TableEmbedder {
            vectors,
            ..TableEmbedder::default()
        });
        let store = Arc::new(DocumentStore::new(index.clone(), embedder, "text_docs"));
        store.ensure_schema().await.unwrap();
        Self {
            index,
            store,
            generator: Arc::new(RecordingGenerator::default()),
        }
    }

    async fn ingest(&self, docs: &[NewsDocument]) {
        for doc in docs {
            assert!(self
                .store
                .upsert_document(&doc.ticker, doc.instrument_type, doc)
                .await
                .unwrap());
        }
    }

    fn pipeline_with(&self, embedder: Arc<dyn Embedder>, options: PipelineOptions) -> RetrievalPipeline {
        RetrievalPipeline::with_options(embedder, self.store.clone(), self.generator.clone(), options)
    }

    fn pipeline(&self) -> RetrievalPipeline {
        self.pipeline_with(Arc::new(TableEmbedder::default()), PipelineOptions::default())
    }
}

/// Ten AAPL articles whose similarity to the query strictly decreases with `i`.
fn ranked_articles() -> (Vec<NewsDocument>, HashMap<String, Vec<f32>>) {
    let mut docs = Vec::new();
    let mut vectors = HashMap::new();
    for i in 0..10 {
        let body = format!("article body {}", i);
        vectors.insert(body.clone(), vec![1.0, i as f32 * 0.2, 0.0, 0.0]);
        docs.push(news(&format!("doc-{}", i), "AAPL", &body));
    }
    (docs, vectors)
}

#[tokio::test]
async fn test_single_document_is_retrieved_and_cited() {
    let fixture = Fixture::new(CountingIndex::default(), HashMap::new()).await;
    let doc = news("aapl-1", "AAPL", "Apple reported strong iPhone sales.");
    fixture.ingest(&[doc.clone()]).await;

    let result = fixture.pipeline().analyze_default("AAPL", 30).await.unwrap();

    assert_eq!(result.error(), None);
    assert_eq!(result.answer(), Some("Apple's iPhone sales were strong."));
    assert_eq!(result.total_results(), 1);
    assert_eq!(result.citations().len(), 1);
    let citation = &result.citations()[0];
    assert_eq!(citation.title, doc.title);
    assert_eq!(citation.url, doc.url);
    assert_eq!(citation.ticker, "AAPL");
    assert_eq!(citation.published_at, doc.published_at.timestamp());

    let prompts = fixture.generator.prompts.lock().unwrap();
    let (system, user) = &prompts[0];
    assert!(system.contains("Use ONLY the provided context"));
    assert!(user.starts_with("Question: What are the latest news for AAPL and what do they imply?"));
    assert!(user.contains(&doc.title));
}

#[tokio::test]
async fn test_ticker_is_normalized() {
    let fixture = Fixture::new(CountingIndex::default(), HashMap::new()).await;
    fixture.ingest(&[news("aapl-1", "AAPL", "Apple reported strong iPhone sales.")]).await;

    let result = fixture.pipeline().analyze_default("  aapl ", 30).await.unwrap();
    assert_eq!(result.total_results(), 1);
}

#[tokio::test]
async fn test_empty_store_answers_without_error() {
    let fixture = Fixture::new(CountingIndex::default(), HashMap::new()).await;

    let result = fixture.pipeline().analyze_default("ZZZZ", 30).await.unwrap();

    assert_eq!(result.answer(), Some("no recent news found for ZZZZ in the last 30 days"));
    assert!(result.citations().is_empty());
    assert_eq!(result.error(), None);
    assert!(fixture.generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_embedding_failure_skips_search() {
    let fixture = Fixture::new(CountingIndex::default(), HashMap::new()).await;
    fixture.ingest(&[news("aapl-1", "AAPL", "Apple reported strong iPhone sales.")]).await;
    let embedder = Arc::new(TableEmbedder::failing());
    let pipeline = fixture.pipeline_with(embedder.clone(), PipelineOptions::default());

    let result = pipeline.analyze_default("AAPL", 30).await.unwrap();

    assert_eq!(result.error(), Some("embedding failed"));
    assert_eq!(result.answer(), None);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.index.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_custom_question_truncates_citations_to_six() {
    let (docs, vectors) = ranked_articles();
    let fixture = Fixture::new(CountingIndex::default(), vectors).await;
    fixture.ingest(&docs).await;

    let result = fixture
        .pipeline()
        .analyze_custom("AAPL", "How are iPhone sales trending?", 30)
        .await
        .unwrap();

    assert_eq!(result.total_results(), 10);
    let citations = result.citations();
    assert_eq!(citations.len(), 6);
    for (i, citation) in citations.iter().enumerate() {
        assert_eq!(citation.url, docs[i].url);
    }
    assert!(citations.windows(2).all(|pair| pair[0].score > pair[1].score));

    let prompts = fixture.generator.prompts.lock().unwrap();
    assert!(prompts[0].0.contains("specific question"));
    assert!(prompts[0].1.starts_with("Question: How are iPhone sales trending?"));
}

#[tokio::test]
async fn test_cross_ticker_question_spans_tickers() {
    let mut vectors = HashMap::new();
    let mut docs = Vec::new();
    for (i, ticker) in ["AAPL", "MSFT", "NVDA"].iter().cycle().take(12).enumerate() {
        let body = format!("market body {}", i);
        vectors.insert(body.clone(), vec![1.0, i as f32 * 0.1, 0.0, 0.0]);
        docs.push(news(&format!("m-{}", i), ticker, &body));
    }
    let fixture = Fixture::new(CountingIndex::default(), vectors).await;
    fixture.ingest(&docs).await;

    let result = fixture
        .pipeline()
        .analyze_cross_ticker("Which chip makers are mentioned?", 45)
        .await
        .unwrap();

    assert_eq!(result.total_results(), 12);
    assert_eq!(result.citations().len(), 8);
    let tickers: std::collections::HashSet<_> = result.citations().iter().map(|c| c.ticker.as_str()).collect();
    assert_eq!(tickers.len(), 3);

    let empty = Fixture::new(CountingIndex::default(), HashMap::new()).await;
    let result = empty.pipeline().analyze_cross_ticker("Anything?", 45).await.unwrap();
    assert_eq!(result.answer(), Some("no recent news found for all tickers in the last 45 days"));
}

#[tokio::test]
async fn test_blank_input_is_rejected_before_any_call() {
    let fixture = Fixture::new(CountingIndex::default(), HashMap::new()).await;
    let embedder = Arc::new(TableEmbedder::default());
    let pipeline = fixture.pipeline_with(embedder.clone(), PipelineOptions::default());

    assert!(matches!(pipeline.analyze_default("  ", 30).await, Err(Error::Validation(_))));
    assert!(matches!(pipeline.analyze_custom("AAPL", "", 30).await, Err(Error::Validation(_))));
    assert!(matches!(pipeline.analyze_custom("", "why?", 30).await, Err(Error::Validation(_))));
    assert!(matches!(pipeline.analyze_cross_ticker("\n", 30).await, Err(Error::Validation(_))));

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fixture.index.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generation_failure_is_reported() {
    let fixture = Fixture::new(CountingIndex::default(), HashMap::new()).await;
    fixture.ingest(&[news("aapl-1", "AAPL", "Apple reported strong iPhone sales.")]).await;
    let generator = Arc::new(RecordingGenerator {
        fail: true,
        ..RecordingGenerator::default()
    });
    let pipeline = RetrievalPipeline::new(Arc::new(TableEmbedder::default()), fixture.store.clone(), generator);

    let result = pipeline.analyze_default("AAPL", 30).await.unwrap();
    assert_eq!(result.error(), Some("generation failed"));
    assert!(result.citations().is_empty());
}

#[tokio::test]
async fn test_search_failure_policies() {
    let failing = CountingIndex {
        fail_search: true,
        ..CountingIndex::default()
    };
    let fixture = Fixture::new(failing, HashMap::new()).await;

    let lenient = fixture.pipeline();
    let result = lenient.analyze_default("AAPL", 30).await.unwrap();
    assert_eq!(result.answer(), Some("no recent news found for AAPL in the last 30 days"));
    assert_eq!(result.error(), None);

    let strict = fixture.pipeline_with(
        Arc::new(TableEmbedder::default()),
        PipelineOptions {
            search_failure: SearchFailurePolicy::Report,
            ..PipelineOptions::default()
        },
    );
    let result = strict.analyze_default("AAPL", 30).await.unwrap();
    assert_eq!(result.error(), Some("search failed"));
}

#[tokio::test]
async fn test_context_budget_limits_prompt() {
    let (docs, vectors) = ranked_articles();
    let fixture = Fixture::new(CountingIndex::default(), vectors).await;
    fixture.ingest(&docs).await;
    let pipeline = fixture.pipeline_with(
        Arc::new(TableEmbedder::default()),
        PipelineOptions {
            context_chars: 200,
            ..PipelineOptions::default()
        },
    );

    let result = pipeline.analyze_default("AAPL", 30).await.unwrap();
    assert_eq!(result.total_results(), 10);

    let prompts = fixture.generator.prompts.lock().unwrap();
    let context = prompts[0].1.split_once("Context:\n").unwrap().1;
    assert!(context.chars().count() <= 200);
    assert!(context.contains(&docs[0].title));
    assert!(!context.contains(&docs[9].title));
}
