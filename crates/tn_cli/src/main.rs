use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tn_core::{AnalysisResult, Error, InstrumentType, Result};
use tn_inference::analysis::{PipelineOptions, RetrievalPipeline, SearchFailurePolicy};
use tn_inference::{create_models, InferenceConfig};
use tn_sources::IngestManager;
use tn_storage::{storage_hint, BackendConfig, DocumentStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod report;

const CROSS_TICKER_TARGETS: [&str; 3] = ["all", "cross", "market"];
const INGEST_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                match c {
                    's' => total_seconds += num,
                    'm' => total_seconds += num * 60,
                    'h' => total_seconds += num * 3600,
                    'd' => total_seconds += num * 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                }
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing bare number counts as seconds
        if !current_number.is_empty() {
            match current_number.parse::<u64>() {
                Ok(num) => {
                    total_seconds += num;
                    has_unit = true;
                }
                Err(_) => return Err("Invalid number in duration".to_string()),
            }
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be longer than zero".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Ticker news retrieval and question answering", long_about = None)]
pub struct Cli {
    #[arg(
        long,
        default_value = "qdrant",
        help = "Storage backend: qdrant (default), memory (kept in process, lost when the command exits)"
    )]
    storage: String,
    #[arg(long, help = "Vector store URL (overrides QDRANT_URL)")]
    backend_url: Option<String>,
    #[arg(long, default_value = "ollama", help = "Model to use for inference. Available models: ollama (default), dummy")]
    model: String,
    #[arg(long, help = "Model server URL (overrides OLLAMA_URL)")]
    model_url: Option<String>,
    #[arg(long)]
    embedding_model: Option<String>,
    #[arg(long)]
    chat_model: Option<String>,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create the collection and payload indexes if they are missing
    Schema,
    /// Fetch news for the given tickers and store it
    Ingest {
        #[arg(required = true)]
        tickers: Vec<String>,
        #[arg(long, default_value = "stock")]
        instrument_type: InstrumentType,
        /// Read documents from a JSON or JSON-lines file instead of Yahoo Finance
        #[arg(long)]
        file: Option<PathBuf>,
        /// Run in periodic mode with the specified interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Answer a question from stored news
    Analyze {
        /// A ticker, or all/cross/market to search every ticker
        target: String,
        question: Option<String>,
        #[arg(long, default_value_t = 45)]
        days: u32,
        /// Also print the raw result as JSON
        #[arg(long)]
        debug: bool,
        /// Report search failures instead of answering from no results
        #[arg(long)]
        strict_search: bool,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
        #[arg(long, default_value_t = 45)]
        days: u32,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn is_cross_ticker(target: &str) -> bool {
    CROSS_TICKER_TARGETS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(target.trim()))
}

async fn run_analysis(
    pipeline: &RetrievalPipeline,
    target: &str,
    question: Option<&str>,
    days: u32,
) -> Result<AnalysisResult> {
    if is_cross_ticker(target) {
        let question = question.ok_or_else(|| {
            Error::Validation(format!("a question is required when analyzing {}", target))
        })?;
        return pipeline.analyze_cross_ticker(question, days).await;
    }
    match question {
        Some(question) => pipeline.analyze_custom(target, question, days).await,
        None => pipeline.analyze_default(target, days).await,
    }
}

async fn ingest_once(manager: &IngestManager, tickers: &[String], instrument_type: InstrumentType) {
    for (ticker, outcome) in tickers.iter().zip(manager.ingest_all(tickers, instrument_type).await) {
        match outcome {
            Ok(report) => println!(
                "{}: {} fetched, {} stored, {} skipped, {} failed",
                report.ticker, report.fetched, report.stored, report.skipped, report.failed
            ),
            Err(e) => eprintln!("{}: {}", ticker, e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut backend_config = BackendConfig::from_env();
    if let Some(url) = &cli.backend_url {
        backend_config = backend_config.with_url(url);
    }

    let mut inference_config = InferenceConfig::from_env();
    if let Some(url) = &cli.model_url {
        inference_config = inference_config.with_model_url(url);
    }
    if let Some(model) = cli.embedding_model {
        inference_config.embedding_model = model;
    }
    if let Some(model) = cli.chat_model {
        inference_config.chat_model = model;
    }
    let models = create_models(&cli.model, &inference_config)?;

    info!("💾 Checking storage connection...");
    let index = match tn_storage::create_storage(&cli.storage, &backend_config).await {
        Ok(index) => index,
        Err(e) => {
            eprintln!("{}", storage_hint(&cli.storage));
            return Err(e);
        }
    };
    let store = Arc::new(DocumentStore::new(
        index,
        models.embedder.clone(),
        backend_config.collection.clone(),
    ));
    if let Err(e) = store.ensure_schema_with_retry(3, backend_config.timeout).await {
        error!("Storage is not available: {}", e);
        eprintln!("{}", storage_hint(&cli.storage));
        return Err(e);
    }

    match cli.command {
        Commands::Schema => {
            println!("✨ Collection {} is ready ({})", store.collection(), store.backend());
        }
        Commands::Ingest {
            tickers,
            instrument_type,
            file,
            interval,
        } => {
            let source = tn_sources::create_source(file);
            info!("🦗 Ingesting {} from {}", tickers.join(", "), source.name());
            let manager = IngestManager::new(source, store, INGEST_CONCURRENCY);

            if let Some(interval) = interval {
                info!("Running in periodic mode with {} interval", interval.0.as_secs());
                loop {
                    info!("Starting ingest cycle");
                    ingest_once(&manager, &tickers, instrument_type).await;
                    info!("Waiting {}s before next ingest", interval.0.as_secs());
                    tokio::time::sleep(interval.0).await;
                }
            } else {
                ingest_once(&manager, &tickers, instrument_type).await;
            }
        }
        Commands::Analyze {
            target,
            question,
            days,
            debug,
            strict_search,
        } => {
            let options = PipelineOptions {
                search_failure: if strict_search {
                    SearchFailurePolicy::Report
                } else {
                    SearchFailurePolicy::TreatAsEmpty
                },
                ..PipelineOptions::default()
            };
            let pipeline = RetrievalPipeline::with_options(models.embedder, store, models.generator, options);
            let result = run_analysis(&pipeline, &target, question.as_deref(), days).await?;

            print!("{}", report::render(&result));
            if debug {
                println!("\n{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Commands::Serve { addr, days } => {
            let pipeline = RetrievalPipeline::new(models.embedder, store, models.generator);
            let state = tn_web::AppState {
                pipeline: Arc::new(pipeline),
                default_days: days,
            };
            tn_web::serve(state, &addr).await?;
        }
    }

    Ok(())
}
