use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use persistence::StoreError;
use serde::Serialize;
use thiserror::Error;

use crate::services::reports::ReportError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "bad_gateway", msg.clone())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages = validation_messages(&errors);

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors", messages.len())
        };

        ApiError::Validation(message)
    }
}

/// Flattens field errors, including those of nested structs, as
/// `field: message` strings.
fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    use validator::ValidationErrorsKind;

    let mut messages = Vec::new();
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let text = e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    messages.push(format!("{}: {}", field, text));
                }
            }
            ValidationErrorsKind::Struct(nested) => messages.extend(validation_messages(nested)),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    messages.extend(validation_messages(nested));
                }
            }
        }
    }
    messages
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AuthMissing => ApiError::Unauthorized(err.to_string()),
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            StoreError::RemoteUnavailable(_) | StoreError::RemoteStatus { .. } => {
                ApiError::BadGateway(err.to_string())
            }
            StoreError::Local(msg) => ApiError::Internal(format!("Local store error: {}", msg)),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Validation(errors) => errors.into(),
            ReportError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            ReportError::Store(store) => store.into(),
            ReportError::Collect(e) => ApiError::ServiceUnavailable(e.to_string()),
            ReportError::Export(e) => ApiError::Internal(e.to_string()),
        }
    }
}
