use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::{dao::storage::StorageError, state::state_machine::TransitionError};

/// Classified failures shared by the services and the racer agent.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The state store is unavailable or returned a corrupt record.
    #[error("store unavailable")]
    Unavailable(#[source] StorageError),
    /// The caller is not allowed to drive the competition.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Input failed a validation gate.
    #[error("invalid input: {0}")]
    Validation(String),
    /// The operation is not legal in the current competition phase.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// No record matches the given identity (email or store key).
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        ServiceError::Precondition(err.to_string())
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        let detail = err
            .message
            .as_deref()
            .map(str::to_owned)
            .unwrap_or_else(|| err.code.to_string());
        ServiceError::Validation(detail)
    }
}

/// Route-level errors, each mapping to one HTTP status.
///
/// Every handler failure funnels through here; there is deliberately no
/// catch-all 500 variant, since all failures in this crate are one of the
/// classified [`ServiceError`] cases.
#[derive(Debug, Error)]
pub enum AppError {
    /// A request payload failed validation.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The admin token is missing or wrong.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested record or participant not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The operation is not legal in the current competition phase.
    #[error("conflict: {0}")]
    Conflict(String),
    /// State store unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Validation(message) => AppError::BadRequest(message),
            ServiceError::Precondition(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        ServiceError::from(err).into()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
