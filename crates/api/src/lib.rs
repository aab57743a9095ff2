//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes grouped by resource
//! - Actor extraction middleware
//! - Error to HTTP response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tally_shared::config::{LedgerConfig, ReconciliationConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Import and matching settings.
    pub reconciliation: ReconciliationConfig,
    /// Posting defaults.
    pub ledger: LedgerConfig,
}

impl AppState {
    /// Builds state with default reconciliation and ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db: Arc::new(db),
            reconciliation: ReconciliationConfig::default(),
            ledger: LedgerConfig::default(),
        }
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

#[cfg(test)]
mod tests;
