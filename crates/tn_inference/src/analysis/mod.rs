pub mod context;
pub mod pipeline;
pub mod prompt;

pub use pipeline::{PipelineOptions, RetrievalPipeline, SearchFailurePolicy};
