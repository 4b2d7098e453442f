use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tn_core::{AnalysisResult, Result};
use tracing::warn;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalysisParams {
    pub days: Option<u32>,
    pub question: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    pub days: Option<u32>,
}

fn respond(outcome: Result<AnalysisResult>) -> Response {
    match outcome {
        Ok(result) => Json(result).into_response(),
        Err(e) if e.is_validation() => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => {
            warn!("⚠️ Request failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Latest-news summary, or a custom question when `question` is given.
pub async fn analyze_ticker(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(params): Query<AnalysisParams>,
) -> Response {
    let days = params.days.unwrap_or(state.default_days);
    let outcome = match params.question {
        Some(question) => state.pipeline.analyze_custom(&ticker, &question, days).await,
        None => state.pipeline.analyze_default(&ticker, days).await,
    };
    respond(outcome)
}

pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuestionRequest>,
) -> Response {
    let days = request.days.unwrap_or(state.default_days);
    respond(state.pipeline.analyze_cross_ticker(&request.question, days).await)
}
