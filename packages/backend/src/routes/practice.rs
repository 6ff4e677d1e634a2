use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::response::AppError;
use crate::services::practice::{GenerateRequest, SubmissionRequest, ValidateRequest};
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<SuccessResponse<T>> {
    Json(SuccessResponse {
        success: true,
        data,
    })
}

#[derive(Debug, Default, Deserialize)]
struct TopicQuery {
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlternateQuery {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    exclude: Option<String>,
}

pub fn profile_router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).delete(reset_profile))
}

pub fn submissions_router() -> Router<AppState> {
    Router::new().route("/", post(submit))
}

pub fn questions_router() -> Router<AppState> {
    Router::new()
        .route("/next", get(next_question))
        .route("/alternate", get(alternate_question))
        .route("/generate", post(generate_question))
        .route("/validate", post(validate_code))
}

pub fn rl_router() -> Router<AppState> {
    Router::new().route("/", get(rl_summary).delete(reset_rl))
}

// ==================== Profile ====================

async fn get_profile(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let profile = state.practice().profile().await?;
    Ok(ok(profile))
}

async fn reset_profile(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let profile = state.practice().reset_profile().await?;
    Ok(ok(profile))
}

// ==================== Submissions ====================

async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.question_id.trim().is_empty() {
        return Err(AppError::validation("questionId is required"));
    }
    let outcome = state.practice().submit(payload).await?;
    Ok(ok(outcome))
}

// ==================== Questions ====================

async fn next_question(
    State(state): State<AppState>,
    Query(query): Query<TopicQuery>,
) -> Result<impl IntoResponse, AppError> {
    let next = state.practice().next_question(query.topic.as_deref()).await?;
    Ok(ok(next))
}

async fn alternate_question(
    State(state): State<AppState>,
    Query(query): Query<AlternateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let exclude = query
        .exclude
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("exclude query parameter is required"))?;
    let question = state
        .practice()
        .alternate_question(query.topic.as_deref(), &exclude)
        .await?;
    Ok(ok(question))
}

async fn generate_question(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.practice().generate_question(payload).await?;
    Ok(ok(outcome))
}

async fn validate_code(
    State(state): State<AppState>,
    Json(payload): Json<ValidateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let verdict = state.practice().validate_code(payload).await?;
    Ok(ok(verdict))
}

// ==================== RL ====================

async fn rl_summary(
    State(state): State<AppState>,
    Query(query): Query<TopicQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.practice().rl_summary(query.topic.as_deref()).await?;
    Ok(ok(summary))
}

async fn reset_rl(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summary = state.practice().reset_rl().await?;
    Ok(ok(summary))
}
