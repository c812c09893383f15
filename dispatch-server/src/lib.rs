//! dispatch-server library
//!
//! HTTP service for scanned dispatch slips: record storage and search,
//! recycle bin, bulk trip-sheet generation, lessee profile and trip-sheet
//! document rendering.

use axum::Router;
use dispatch_common::config::ServiceSettings;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod render;
pub mod retention;

pub use crate::error::{ApiError, ApiJson, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Retention and listing limits
    pub settings: ServiceSettings,
    /// Location of the uploaded Word template
    pub template_path: PathBuf,
}

impl AppState {
    pub fn new(db: SqlitePool, settings: ServiceSettings, template_path: PathBuf) -> Self {
        Self {
            db,
            settings,
            template_path,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::scan_routes())
        .merge(api::bin_routes())
        .merge(api::bulk_routes())
        .merge(api::document_routes())
        .merge(api::settings_routes())
        .merge(api::driver_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // The scanner front end is served from a different origin
        .layer(CorsLayer::permissive())
}
