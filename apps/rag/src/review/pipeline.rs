//! Report pipeline: two agents run in sequence.
//!
//! 1. Company Researcher: context documents → hiring-signal keywords
//! 2. Resume Reviewer: resume + keywords → final Japanese report
//!
//! `AppState` holds an `Arc<dyn ReportPipeline>`; `AgentPipeline` is the
//! OpenAI-backed implementation.

use async_trait::async_trait;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, CONCISE_INSTRUCTION, UNCERTAINTY_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::review::prompts::{
    RESEARCHER_PROMPT_TEMPLATE, RESEARCHER_SYSTEM, REVIEWER_PROMPT_TEMPLATE, REVIEWER_SYSTEM,
};

/// Everything the pipeline needs for one report.
#[derive(Debug, Clone, Copy)]
pub struct ReviewInput<'a> {
    pub resume_text: &'a str,
    pub company_name: &'a str,
    pub role_label: &'a str,
    pub context_docs: &'a [String],
}

#[async_trait]
pub trait ReportPipeline: Send + Sync {
    async fn run(&self, input: &ReviewInput<'_>) -> Result<String, AppError>;
}

pub struct AgentPipeline {
    llm: LlmClient,
}

impl AgentPipeline {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReportPipeline for AgentPipeline {
    async fn run(&self, input: &ReviewInput<'_>) -> Result<String, AppError> {
        let research_prompt = build_researcher_prompt(input);
        let keywords = self
            .llm
            .chat(RESEARCHER_SYSTEM, &research_prompt)
            .await
            .map_err(|e| agent_error("company researcher", e))?;
        info!(
            "researcher finished chars={} model={}",
            keywords.chars().count(),
            self.llm.chat_model()
        );

        let review_prompt = build_reviewer_prompt(input, &keywords);
        let report = self
            .llm
            .chat(REVIEWER_SYSTEM, &review_prompt)
            .await
            .map_err(|e| agent_error("resume reviewer", e))?;
        info!("reviewer finished chars={}", report.chars().count());

        Ok(report)
    }
}

/// Missing credentials surface as a configuration error.
fn agent_error(agent: &str, err: LlmError) -> AppError {
    match err {
        LlmError::MissingApiKey => AppError::Configuration(err.to_string()),
        other => AppError::Llm(format!("{agent} failed: {other}")),
    }
}

pub fn build_researcher_prompt(input: &ReviewInput<'_>) -> String {
    let context = input.context_docs.join("\n\n");
    fill_template(
        RESEARCHER_PROMPT_TEMPLATE,
        &[
            ("company", input.company_name),
            ("role", input.role_label),
            ("context", context.as_str()),
        ],
    )
}

pub fn build_reviewer_prompt(input: &ReviewInput<'_>, keywords: &str) -> String {
    fill_template(
        REVIEWER_PROMPT_TEMPLATE,
        &[
            ("concise_instruction", CONCISE_INSTRUCTION),
            ("uncertainty_instruction", UNCERTAINTY_INSTRUCTION),
            ("company", input.company_name),
            ("role", input.role_label),
            ("keywords", keywords),
            ("resume", input.resume_text),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use crate::config::Config;

    fn input<'a>(docs: &'a [String]) -> ReviewInput<'a> {
        ReviewInput {
            resume_text: "Rust で決済基盤を開発 {not a placeholder}",
            company_name: "Acme",
            role_label: "指定なし",
            context_docs: docs,
        }
    }

    #[test]
    fn test_researcher_prompt_joins_context() {
        let docs = vec!["doc one".to_string(), "doc two".to_string()];
        let prompt = build_researcher_prompt(&input(&docs));
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("Role: 指定なし"));
        assert!(prompt.contains("doc one\n\ndoc two"));
    }

    #[test]
    fn test_researcher_prompt_with_empty_context() {
        let prompt = build_researcher_prompt(&input(&[]));
        assert!(prompt.contains("Context:\n\n"));
    }

    #[test]
    fn test_reviewer_prompt_contains_format_and_inputs() {
        let prompt = build_reviewer_prompt(&input(&[]), "- 挑戦\n- 誠実");
        assert!(prompt.starts_with("Write the final report in Japanese"));
        assert!(prompt.contains("【企業別レビュー報告書】"));
        assert!(prompt.contains("#### ■ 対象企業\nAcme"));
        assert!(prompt.contains("- 挑戦\n- 誠実"));
        assert!(prompt.contains(CONCISE_INSTRUCTION));
        assert!(prompt.contains("{not a placeholder}"));
        assert!(!prompt.contains("{company}"));
        assert!(!prompt.contains("{keywords}"));
    }

    #[test]
    fn test_reviewer_prompt_inserts_user_text_once() {
        let resume = "Go と Rust の経験あり";
        let review = ReviewInput {
            resume_text: resume,
            company_name: "Acme {resume}",
            role_label: "{keywords}",
            context_docs: &[],
        };
        let prompt = build_reviewer_prompt(&review, "- 挑戦 {resume}");
        assert_eq!(prompt.matches(resume).count(), 1);
        assert!(prompt.contains("#### ■ 対象企業\nAcme {resume}"));
        assert!(prompt.contains("- 挑戦 {resume}"));
    }

    #[test]
    fn test_researcher_prompt_keeps_braces_in_company_name() {
        let docs = vec!["doc {role}".to_string()];
        let review = ReviewInput {
            company_name: "{context} Inc",
            ..input(&docs)
        };
        let prompt = build_researcher_prompt(&review);
        assert!(prompt.contains("Company: {context} Inc"));
        assert!(prompt.contains("doc {role}"));
        assert_eq!(prompt.matches("doc {role}").count(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let pipeline = AgentPipeline::new(LlmClient::new(&Config::default()).unwrap());
        let docs = vec!["doc".to_string()];
        let err = pipeline.run(&input(&docs)).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_agent_failure_is_llm_error() {
        let err = agent_error(
            "resume reviewer",
            LlmError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        );
        assert!(matches!(err, AppError::Llm(msg) if msg.starts_with("resume reviewer failed")));
    }
}
