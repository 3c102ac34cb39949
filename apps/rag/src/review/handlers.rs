//! Axum route handlers for the Review API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::retrieval::role_label;
use crate::review::pipeline::ReviewInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub resume_text: String,
    pub company_name: String,
    #[serde(default)]
    pub job_title: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub report: String,
}

/// POST /resume/review
///
/// Retrieve company context (cached) → two-agent review → report.
/// Missing context is not an error; the agents run with an empty context block.
pub async fn handle_review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    if request.company_name.trim().is_empty() {
        return Err(AppError::Validation("company_name cannot be empty".to_string()));
    }

    let role = role_label(&request.job_title);

    let context_docs = state
        .retriever
        .retrieve(&request.company_name, role)
        .await?;
    info!(
        "review context ready company={} role={} docs={}",
        request.company_name,
        role,
        context_docs.len()
    );

    let report = state
        .pipeline
        .run(&ReviewInput {
            resume_text: &request.resume_text,
            company_name: &request.company_name,
            role_label: role,
            context_docs: &context_docs,
        })
        .await?;

    Ok(Json(ReviewResponse { report }))
}
