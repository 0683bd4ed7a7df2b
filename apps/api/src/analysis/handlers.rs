//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::jd_parser::parse_job_description;
use crate::analysis::models::{AnalysisResult, JobDescription};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub user_id: Uuid,
    pub resume_content: String,
    #[serde(default)]
    pub job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListAnalysesQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ListAnalysesResponse {
    pub analyses: Vec<AnalysisResult>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ParseJobRequest {
    pub job_text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseJobResponse {
    pub job_description: JobDescription,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses
///
/// Runs the full pipeline and returns the stored record.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<(StatusCode, Json<AnalysisResult>), AppError> {
    let result = state
        .analyzer
        .analyze(
            &request.resume_content,
            request.user_id,
            request.job_description.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /api/v1/analyses?user_id=
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    Query(query): Query<ListAnalysesQuery>,
) -> Result<Json<ListAnalysesResponse>, AppError> {
    let analyses = state.store.list_by_user(query.user_id).await?;
    let total = analyses.len();
    Ok(Json(ListAnalysesResponse { analyses, total }))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResult>, AppError> {
    state
        .store
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))
}

/// POST /api/v1/analyses/parse-job
///
/// Parses a job posting without running an analysis.
/// Useful for previewing what the scoring prompt will see.
pub async fn handle_parse_job(
    State(state): State<AppState>,
    Json(request): Json<ParseJobRequest>,
) -> Result<Json<ParseJobResponse>, AppError> {
    if request.job_text.trim().is_empty() {
        return Err(AppError::Validation("job_text cannot be empty".to_string()));
    }

    let job_description = parse_job_description(&request.job_text, state.llm.as_ref()).await?;

    Ok(Json(ParseJobResponse { job_description }))
}
