//! wavedeck-mr library interface
//!
//! Exposes the container accessor, domain services, and HTTP router for the
//! Metadata Resolver service, plus everything integration tests need.

pub mod api;
pub mod container;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Root folder containing the audio working set
    pub root_folder: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(root_folder: PathBuf) -> Self {
        Self {
            root_folder,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember the most recent failure for the health endpoint
    pub async fn record_error(&self, error: &wavedeck_common::Error) {
        *self.last_error.write().await = Some(error.to_string());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::metadata_routes())
        .merge(api::mirror_routes())
        .merge(api::health_routes())
        .with_state(state)
}
