//! Raw record surface over the shared state store.
//!
//! Racers and external tools poll these endpoints directly; the payloads
//! are the JSON-encoded records, passed through without interpretation.
//! This makes the backend itself usable as the base URL of an HTTP-backed
//! store client.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{error::AppError, state::SharedState};

/// Key/value record endpoints for polling clients.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/store/{key}",
        get(get_record).put(put_record).delete(delete_record),
    )
}

#[utoipa::path(
    get,
    path = "/store/{key}",
    tag = "store",
    params(("key" = String, Path, description = "Record key to fetch")),
    responses(
        (status = 200, description = "Raw record bytes", content_type = "application/octet-stream", body = String),
        (status = 404, description = "No record under this key")
    )
)]
/// Fetch the raw bytes stored under `key`.
pub async fn get_record(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Vec<u8>, AppError> {
    let record = state.records().store().get(&key).await?;
    record.ok_or_else(|| AppError::NotFound(format!("no record under `{key}`")))
}

#[utoipa::path(
    put,
    path = "/store/{key}",
    tag = "store",
    params(("key" = String, Path, description = "Record key to write")),
    request_body(content = String, content_type = "application/octet-stream"),
    responses((status = 204, description = "Record written"))
)]
/// Overwrite the record under `key` with the request body.
pub async fn put_record(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    state.records().store().set(&key, body.to_vec()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/store/{key}",
    tag = "store",
    params(("key" = String, Path, description = "Record key to remove")),
    responses((status = 204, description = "Record removed or already absent"))
)]
/// Remove the record under `key`; absent keys are not an error.
pub async fn delete_record(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    state.records().store().remove(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
