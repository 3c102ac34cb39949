//! Deep research: a hosted reasoning call with live web search, used as the
//! primary source of company context.
//!
//! Two attempts at most. The first uses the primary model with the
//! `web_search` tool; if it errors or comes back empty, one retry goes to the
//! fallback model with tools disabled.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::llm_client::prompts::{fill_template, UNCERTAINTY_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError, ResearchRequest};
use crate::retrieval::prompts::DEEP_RESEARCH_PROMPT_TEMPLATE;

/// Anything that can answer a single research prompt.
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, request: &ResearchRequest<'_>) -> Result<String, LlmError>;
}

#[async_trait]
impl Researcher for LlmClient {
    async fn research(&self, request: &ResearchRequest<'_>) -> Result<String, LlmError> {
        self.respond(request).await
    }
}

pub fn build_research_prompt(company_name: &str, role_label: &str) -> String {
    fill_template(
        DEEP_RESEARCH_PROMPT_TEMPLATE,
        &[
            ("uncertainty_instruction", UNCERTAINTY_INSTRUCTION),
            ("company", company_name),
            ("role", role_label),
        ],
    )
}

/// Runs deep research for a company, returning the first non-empty report.
///
/// Errors with the last failure when both attempts fail or come back empty.
/// A missing API key is returned immediately without trying the fallback.
pub async fn run_deep_research(
    researcher: &dyn Researcher,
    company_name: &str,
    role_label: &str,
    model: &str,
    fallback_model: &str,
) -> Result<String, LlmError> {
    let prompt = build_research_prompt(company_name, role_label);
    info!(
        "deep research start model={} company={} role={}",
        model, company_name, role_label
    );

    let attempts = [
        ResearchRequest {
            model,
            prompt: &prompt,
            use_tools: true,
        },
        ResearchRequest {
            model: fallback_model,
            prompt: &prompt,
            use_tools: false,
        },
    ];

    let mut last_error = LlmError::EmptyContent;

    for (attempt, request) in attempts.iter().enumerate() {
        let attempt = attempt + 1;
        match researcher.research(request).await {
            Ok(output) => {
                let output = output.trim();
                info!(
                    "deep research finished chars={} attempt={} model={} tools={}",
                    output.chars().count(),
                    attempt,
                    request.model,
                    request.use_tools
                );
                if !output.is_empty() {
                    return Ok(output.to_string());
                }
                warn!(
                    "deep research returned empty result attempt={} model={}",
                    attempt, request.model
                );
                last_error = LlmError::EmptyContent;
            }
            Err(LlmError::MissingApiKey) => return Err(LlmError::MissingApiKey),
            Err(e) => {
                warn!(
                    "deep research failed attempt={} model={} error={}",
                    attempt, request.model, e
                );
                last_error = e;
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted researcher: pops one canned outcome per call and records requests.
    pub(crate) struct ScriptedResearcher {
        outcomes: Mutex<VecDeque<Result<String, LlmError>>>,
        pub(crate) calls: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedResearcher {
        pub(crate) fn new(outcomes: Vec<Result<String, LlmError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<(String, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Researcher for ScriptedResearcher {
        async fn research(&self, request: &ResearchRequest<'_>) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((request.model.to_string(), request.use_tools));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    pub(crate) fn api_error() -> LlmError {
        LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_prompt_contains_company_and_role() {
        let prompt = build_research_prompt("Acme", "指定なし");
        assert!(prompt.contains("企業名: Acme"));
        assert!(prompt.contains("職種: 指定なし"));
        assert!(prompt.contains(UNCERTAINTY_INSTRUCTION));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_prompt_keeps_braces_in_company_name() {
        let prompt = build_research_prompt("{role} Corp", "Engineer");
        assert!(prompt.contains("企業名: {role} Corp"));
        assert!(prompt.contains("職種: Engineer"));
    }

    #[tokio::test]
    async fn test_primary_success_makes_one_call() {
        let researcher = ScriptedResearcher::new(vec![Ok("  report  ".to_string())]);
        let report = run_deep_research(&researcher, "Acme", "Engineer", "primary", "fallback")
            .await
            .unwrap();
        assert_eq!(report, "report");
        assert_eq!(researcher.calls(), vec![("primary".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_primary_error_uses_fallback_without_tools() {
        let researcher = ScriptedResearcher::new(vec![Err(api_error()), Ok("fallback report".to_string())]);
        let report = run_deep_research(&researcher, "Acme", "Engineer", "primary", "fallback")
            .await
            .unwrap();
        assert_eq!(report, "fallback report");
        assert_eq!(
            researcher.calls(),
            vec![("primary".to_string(), true), ("fallback".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_primary_empty_uses_fallback() {
        let researcher = ScriptedResearcher::new(vec![Ok("   ".to_string()), Ok("ok".to_string())]);
        let report = run_deep_research(&researcher, "Acme", "Engineer", "primary", "fallback")
            .await
            .unwrap();
        assert_eq!(report, "ok");
        assert_eq!(researcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_both_attempts_fail_returns_last_error() {
        let researcher = ScriptedResearcher::new(vec![
            Err(api_error()),
            Err(LlmError::Api {
                status: 503,
                message: "fallback down".to_string(),
            }),
        ]);
        let err = run_deep_research(&researcher, "Acme", "Engineer", "primary", "fallback")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(researcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_both_attempts_empty_is_empty_content() {
        let researcher = ScriptedResearcher::new(vec![Ok(String::new()), Ok("  \n ".to_string())]);
        let err = run_deep_research(&researcher, "Acme", "Engineer", "primary", "fallback")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
        assert_eq!(
            researcher.calls(),
            vec![("primary".to_string(), true), ("fallback".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_fallback() {
        let researcher = ScriptedResearcher::new(vec![Err(LlmError::MissingApiKey)]);
        let err = run_deep_research(&researcher, "Acme", "Engineer", "primary", "fallback")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
        assert_eq!(researcher.calls().len(), 1);
    }
}
