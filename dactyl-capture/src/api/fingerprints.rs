//! Fingerprint capture endpoints
//!
//! POST /persons/:key/fingerprints             submit a batch of scans
//! GET  /persons/:key/fingerprints             registered fingers
//! GET  /persons/:key/fingerprints/comparison  stored images for comparison

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::db::persons::PersonKey;
use crate::error::ApiResult;
use crate::models::{ComparisonEntry, RegisteredFingerprint, SubmissionRequest, SubmissionResponse};
use crate::AppState;

/// POST /persons/:key/fingerprints
///
/// Partial success is a 200: see `results.error` for scans not registered.
pub async fn submit_fingerprints(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<SubmissionRequest>,
) -> ApiResult<Json<SubmissionResponse>> {
    let key = PersonKey::parse(&key);
    let response = state.service.submit(&key, &request.fingerprints).await?;
    Ok(Json(response))
}

/// GET /persons/:key/fingerprints
pub async fn list_registered_fingerprints(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Vec<RegisteredFingerprint>>> {
    let key = PersonKey::parse(&key);
    Ok(Json(state.service.list_registered(&key).await?))
}

/// GET /persons/:key/fingerprints/comparison
pub async fn get_comparison_set(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Vec<ComparisonEntry>>> {
    let key = PersonKey::parse(&key);
    Ok(Json(state.service.retrieve_for_comparison(&key).await?))
}

pub fn fingerprint_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/persons/:key/fingerprints",
            get(list_registered_fingerprints).post(submit_fingerprints),
        )
        .route("/persons/:key/fingerprints/comparison", get(get_comparison_set))
}
