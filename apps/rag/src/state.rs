use std::sync::Arc;

use crate::retrieval::ContextRetriever;
use crate::review::pipeline::ReportPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// One retriever (and so one context cache) per process.
    pub retriever: Arc<ContextRetriever>,
    /// Pluggable report pipeline. Default: AgentPipeline over OpenAI chat completions.
    pub pipeline: Arc<dyn ReportPipeline>,
}
