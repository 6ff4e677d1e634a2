use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::response::AppError;
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectPathRequest {
    path_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_paths))
        .route("/current", put(select_path))
        .route("/generate", post(generate_path))
}

async fn list_paths(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let overview = state.practice().paths().await?;
    Ok(Json(SuccessResponse {
        success: true,
        data: overview,
    }))
}

async fn select_path(
    State(state): State<AppState>,
    Json(payload): Json<SelectPathRequest>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = payload.path_id.trim();
    if path_id.is_empty() {
        return Err(AppError::validation("pathId is required"));
    }
    let overview = state.practice().set_current_path(path_id).await?;
    Ok(Json(SuccessResponse {
        success: true,
        data: overview,
    }))
}

async fn generate_path(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let path = state.practice().generate_path().await?;
    Ok(Json(SuccessResponse {
        success: true,
        data: path,
    }))
}
