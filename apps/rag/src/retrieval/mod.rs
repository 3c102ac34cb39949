// Company context retrieval.
// A TTL cache in front of an ordered list of strategies: deep research first,
// then keyword search ranked by embedding similarity.

pub mod cache;
pub mod deep_research;
pub mod prompts;
pub mod ranking;
pub mod retriever;
pub mod search;
pub mod strategy;

use thiserror::Error;

use crate::llm_client::LlmError;

pub use retriever::ContextRetriever;

/// Role label used when the request has no job title.
pub const DEFAULT_ROLE_LABEL: &str = "指定なし";

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Missing credential; always fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The named strategy exhausted its attempts.
    #[error("{strategy} unavailable: {message}")]
    Upstream {
        strategy: &'static str,
        message: String,
    },
}

impl RetrievalError {
    pub fn from_llm(strategy: &'static str, err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => RetrievalError::Configuration(err.to_string()),
            other => RetrievalError::Upstream {
                strategy,
                message: other.to_string(),
            },
        }
    }
}

/// Returns `job_title`, or [`DEFAULT_ROLE_LABEL`] when it is blank.
pub fn role_label(job_title: &str) -> &str {
    if job_title.trim().is_empty() {
        DEFAULT_ROLE_LABEL
    } else {
        job_title
    }
}

/// Cache key for a company/role pair. The default role label is applied first.
pub fn cache_key(company_name: &str, job_title: &str) -> String {
    format!("{}::{}", company_name, role_label(job_title))
}
