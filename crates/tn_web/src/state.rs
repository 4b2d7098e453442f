use std::sync::Arc;
use tn_inference::analysis::RetrievalPipeline;

pub struct AppState {
    pub pipeline: Arc<RetrievalPipeline>,
    /// Age window used when a request does not give `days`.
    pub default_days: u32,
}
