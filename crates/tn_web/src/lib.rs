use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/tickers/:ticker/analysis", get(handlers::analyze_ticker))
        .route("/api/questions", post(handlers::ask_question))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serve the app until the listener fails.
pub async fn serve(state: AppState, addr: &str) -> tn_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use tn_core::{AnalysisResult, Error, Result};
}
