//! Metadata read/write API handlers
//!
//! POST /metadata/read, POST /metadata/read_batch, POST /metadata/write

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ApiError, ApiResult};
use crate::models::{BatchReadResult, FileRecord};
use crate::services::{resolver, scanner, writeback};
use crate::AppState;

const DEFAULT_READ_CONCURRENCY: usize = 4;

/// POST /metadata/read request
#[derive(Debug, Deserialize)]
pub struct ReadMetadataRequest {
    pub path: String,
}

/// POST /metadata/read_batch request.
///
/// Reads the given paths, or scans `folder` (default: the service root
/// folder) for WAV files when `paths` is absent.
#[derive(Debug, Deserialize)]
pub struct ReadBatchRequest {
    #[serde(default)]
    pub paths: Option<Vec<String>>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub concurrency: Option<usize>,
}

/// POST /metadata/write request
#[derive(Debug, Deserialize)]
pub struct WriteMetadataRequest {
    pub path: String,
    pub record: FileRecord,
}

/// POST /metadata/write response
#[derive(Debug, Serialize)]
pub struct WriteMetadataResponse {
    pub path: String,
    pub written: bool,
}

/// POST /metadata/read
///
/// Resolve one file's canonical metadata record.
pub async fn read_metadata(
    State(state): State<AppState>,
    Json(request): Json<ReadMetadataRequest>,
) -> ApiResult<Json<FileRecord>> {
    let path = PathBuf::from(&request.path);
    match resolver::resolve_path(&path).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            state.record_error(&e).await;
            Err(ApiError::Common(e))
        }
    }
}

/// POST /metadata/read_batch
///
/// Resolve many files; per-file failures are reported in the result, never
/// as a failed request.
pub async fn read_metadata_batch(
    State(state): State<AppState>,
    Json(request): Json<ReadBatchRequest>,
) -> ApiResult<Json<BatchReadResult>> {
    let paths: Vec<PathBuf> = match request.paths {
        Some(paths) => paths.into_iter().map(PathBuf::from).collect(),
        None => {
            let folder = request
                .folder
                .map(PathBuf::from)
                .unwrap_or_else(|| state.root_folder.clone());
            match scanner::scan_folder(&folder) {
                Ok(paths) => paths,
                Err(e) => {
                    state.record_error(&e).await;
                    return Err(ApiError::Common(e));
                }
            }
        }
    };

    let concurrency = request.concurrency.unwrap_or(DEFAULT_READ_CONCURRENCY);
    tracing::debug!(files = paths.len(), concurrency, "Bulk metadata read");

    Ok(Json(resolver::resolve_batch(paths, concurrency).await))
}

/// POST /metadata/write
///
/// Write a record's authoritative fields back into its file. On failure the
/// file is left byte-identical to its pre-write state.
pub async fn write_metadata(
    State(state): State<AppState>,
    Json(request): Json<WriteMetadataRequest>,
) -> ApiResult<Json<WriteMetadataResponse>> {
    let path = PathBuf::from(&request.path);
    match writeback::write_back(&path, &request.record).await {
        Ok(()) => Ok(Json(WriteMetadataResponse {
            path: request.path,
            written: true,
        })),
        Err(e) => {
            state.record_error(&e).await;
            Err(ApiError::Common(e))
        }
    }
}

/// Build metadata routes
pub fn metadata_routes() -> Router<AppState> {
    Router::new()
        .route("/metadata/read", post(read_metadata))
        .route("/metadata/read_batch", post(read_metadata_batch))
        .route("/metadata/write", post(write_metadata))
}
