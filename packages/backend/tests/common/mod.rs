use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use neuro_backend::clock::FixedClock;
use neuro_backend::services::ai_provider::DisabledProvider;
use neuro_backend::services::catalog::QuestionCatalog;
use neuro_backend::services::practice::{PracticeService, ServiceOptions};
use neuro_backend::services::repository::PracticeRepository;
use neuro_backend::state::AppState;
use neuro_backend::store::MemoryStore;

pub const T0: i64 = 1_700_000_000_000;

pub async fn create_test_app() -> Router {
    let practice = PracticeService::new(
        PracticeRepository::new(Arc::new(MemoryStore::new())),
        QuestionCatalog::assemble(&[], &[]),
        Arc::new(DisabledProvider),
        Arc::new(FixedClock::new(T0)),
        ServiceOptions {
            seed: Some(11),
            ..ServiceOptions::default()
        },
    );
    neuro_backend::create_app(AppState::new(practice))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
