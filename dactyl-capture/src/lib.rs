//! dactyl-capture library interface
//!
//! Fingerprint capture and archival: accepts quality-scored scans, keeps a
//! bounded set of variants per finger in the remote archive and serves the
//! stored images back for comparison.

pub mod api;
pub mod archive;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use dactyl_common::config::Language;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::archive::ArchiveClient;
use crate::services::FingerprintService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Capture services (hold their own pool and archive handles)
    pub service: FingerprintService,
}

impl AppState {
    pub fn new(db: SqlitePool, archive: Arc<dyn ArchiveClient>, language: Language) -> Self {
        let service = FingerprintService::new(db.clone(), archive, language);
        Self { db, service }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::person_routes())
        .merge(api::fingerprint_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
