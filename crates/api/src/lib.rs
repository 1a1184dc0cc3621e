//! HTTP API layer with Axum routes and extractors.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - The [`extractors::Tenant`] extractor that resolves the school in the path
//! - JSON envelopes for success and error bodies

pub mod error;
pub mod extractors;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use scholaris_db::repositories::LedgerSettings;
use scholaris_shared::{AcademicsConfig, AppConfig};

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Entry numbering and balance tolerance.
    pub ledger: LedgerSettings,
    /// Score limits for results.
    pub academics: AcademicsConfig,
}

impl AppState {
    /// State with default ledger and grading settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db: Arc::new(db),
            ledger: LedgerSettings::default(),
            academics: AcademicsConfig::default(),
        }
    }

    /// State using the loaded configuration.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            ledger: LedgerSettings::from(&config.ledger),
            academics: config.academics.clone(),
        }
    }

    /// A shared handle on the pool for building repositories.
    #[must_use]
    pub fn conn(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.db)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
