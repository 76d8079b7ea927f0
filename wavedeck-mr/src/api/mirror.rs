//! Mirror API handlers
//!
//! POST /mirror, POST /mirror/conflicts

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::{FileRecord, MirrorConfig, MirrorResult};
use crate::services::mirror;
use crate::AppState;

/// POST /mirror and /mirror/conflicts request
#[derive(Debug, Deserialize)]
pub struct MirrorRequest {
    pub config: MirrorConfig,
    pub records: Vec<FileRecord>,
}

/// POST /mirror/conflicts response
#[derive(Debug, Serialize)]
pub struct ConflictCheckResponse {
    pub conflicts: Vec<String>,
}

fn validate(request: &MirrorRequest) -> Result<(), ApiError> {
    if request.config.destination_root.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "destination_root must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// POST /mirror
///
/// Copy the selected records into the destination tree. Per-file failures
/// and conflicts are reported inside the result; the request itself only
/// fails when the destination root cannot be prepared.
pub async fn mirror_files(
    State(state): State<AppState>,
    Json(request): Json<MirrorRequest>,
) -> ApiResult<Json<MirrorResult>> {
    validate(&request)?;

    tracing::info!(
        destination = %request.config.destination_root,
        records = request.records.len(),
        "Mirror requested"
    );

    match mirror::mirror(&request.config, &request.records).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            state.record_error(&e).await;
            Err(ApiError::Common(e))
        }
    }
}

/// POST /mirror/conflicts
///
/// Dry-run conflict check: reports which destinations already exist without
/// copying anything.
pub async fn check_conflicts(
    State(state): State<AppState>,
    Json(request): Json<MirrorRequest>,
) -> ApiResult<Json<ConflictCheckResponse>> {
    validate(&request)?;

    match mirror::check_conflicts(&request.config, &request.records).await {
        Ok(conflicts) => Ok(Json(ConflictCheckResponse { conflicts })),
        Err(e) => {
            state.record_error(&e).await;
            Err(ApiError::Common(e))
        }
    }
}

/// Build mirror routes
pub fn mirror_routes() -> Router<AppState> {
    Router::new()
        .route("/mirror", post(mirror_files))
        .route("/mirror/conflicts", post(check_conflicts))
}
