mod health;
mod paths;
mod practice;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/profile", practice::profile_router())
        .nest("/api/submissions", practice::submissions_router())
        .nest("/api/questions", practice::questions_router())
        .nest("/api/rl", practice::rl_router())
        .nest("/api/paths", paths::router())
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
