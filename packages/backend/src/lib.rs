pub mod clock;
pub mod config;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::clock::SystemClock;
use crate::config::{Config, StoreLocation};
use crate::services::ai_provider::{DisabledProvider, OllamaProvider, QuestionGenerator};
use crate::services::catalog::{load_csv_questions, CatalogError, QuestionCatalog};
use crate::services::practice::{PracticeService, ServiceOptions};
use crate::services::repository::{PracticeRepository, RepositoryError};
use crate::state::AppState;
use crate::store::{FileStore, KeyValueStore, MemoryStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot open store: {0}")]
    Store(#[from] StoreError),
    #[error("cannot load catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("cannot read stored questions: {0}")]
    Repository(#[from] RepositoryError),
}

/// Wire store, catalog, AI provider and engine settings from `config`.
pub async fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let store: Arc<dyn KeyValueStore> = match &config.store {
        StoreLocation::Memory => Arc::new(MemoryStore::new()),
        StoreLocation::Directory(dir) => Arc::new(FileStore::open(dir.clone()).await?),
    };
    let repo = PracticeRepository::new(store);

    let csv = match &config.catalog_csv {
        Some(path) => load_csv_questions(path)?,
        None => Vec::new(),
    };
    let ai_questions = repo.load_ai_questions().await?;
    let catalog = QuestionCatalog::assemble(&csv, &ai_questions);

    let generator: Arc<dyn QuestionGenerator> = if config.ai.enabled {
        Arc::new(OllamaProvider::new(&config.ai))
    } else {
        warn!("AI provider disabled, generation falls back to the catalog");
        Arc::new(DisabledProvider)
    };

    info!(
        store = repo.store_name(),
        questions = catalog.len(),
        authority = config.difficulty_authority.as_str(),
        rl_enabled = config.rl_enabled,
        "practice service ready"
    );

    let practice = PracticeService::new(
        repo,
        catalog,
        generator,
        Arc::new(SystemClock),
        ServiceOptions {
            authority: config.difficulty_authority,
            rl_enabled: config.rl_enabled,
            seed: config.rl_seed,
            ..ServiceOptions::default()
        },
    );
    Ok(AppState::new(practice))
}

pub fn create_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
