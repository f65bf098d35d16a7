//! Person registration and lookup, fingerprint type reference data
//!
//! POST /persons, GET /persons/:key, GET /fingerprint-types

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use dactyl_common::db::{FingerprintType, Person};

use crate::db::persons::{self, NewPerson, PersonKey};
use crate::db::fingerprint_types;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /persons
///
/// Returns 201 with the new person; a duplicate identity card is a 400.
pub async fn create_person(
    State(state): State<AppState>,
    Json(request): Json<NewPerson>,
) -> ApiResult<(StatusCode, Json<Person>)> {
    let person = persons::create_person(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

/// GET /persons/:key
///
/// `key` is a person guid or an identity card number.
pub async fn get_person(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Person>> {
    let key = PersonKey::parse(&key);
    persons::find_person(&state.db, &key)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Person not found: {}", key)))
}

/// GET /fingerprint-types
pub async fn list_fingerprint_types(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<FingerprintType>>> {
    Ok(Json(fingerprint_types::list_fingerprint_types(&state.db).await?))
}

pub fn person_routes() -> Router<AppState> {
    Router::new()
        .route("/persons", post(create_person))
        .route("/persons/:key", get(get_person))
        .route("/fingerprint-types", get(list_fingerprint_types))
}
