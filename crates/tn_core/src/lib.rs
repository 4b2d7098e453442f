pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::{AnswerGenerator, Embedder};
pub use storage::{CollectionSchema, Distance, PayloadFieldKind, VectorIndex};
pub use types::*;

/// Trimmed, upper-cased ticker symbol, or `None` when nothing is left.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        None
    } else {
        Some(ticker.to_uppercase())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

pub mod prelude {
    pub use crate::{
        AnalysisResult, AnswerGenerator, Citation, Embedder, Error, InstrumentType, NewsDocument,
        Result, SearchFilter, SearchResult, StoredNews, VectorIndex,
    };
}
