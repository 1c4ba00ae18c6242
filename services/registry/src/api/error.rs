//! API error type and the mapping from registry errors to HTTP responses.
//!
//! # Key invariants
//! - Every error body carries the numeric registry code and the trace id.
//! - Store failures are logged server-side; the caller only ever sees the
//!   generic internal message.
use crate::api::types::ErrorResponse;
use crate::context::RequestContext;
use crate::registry::{ErrorCode, INTERNAL_SERVER_ERROR, RegistryError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use registry::api::error::ApiError;
/// use registry::api::types::ErrorResponse;
///
/// let err = ApiError {
///     status: StatusCode::NOT_FOUND,
///     body: ErrorResponse {
///         code: 102,
///         message: "missing".to_string(),
///         trace_id: "trace-1".to_string(),
///     },
/// };
/// assert_eq!(err.status, StatusCode::NOT_FOUND);
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn status_for(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::Conflict { .. } => StatusCode::CONFLICT,
        RegistryError::ValueMismatch(_)
        | RegistryError::MissingParameter(_)
        | RegistryError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        RegistryError::Forbidden(_) => StatusCode::FORBIDDEN,
        RegistryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a registry error into the response for the request in `ctx`.
pub fn api_error(err: RegistryError, ctx: &RequestContext) -> ApiError {
    let status = status_for(&err);
    let message = match &err {
        RegistryError::Store(source) => {
            tracing::error!(error = ?source, trace_id = %ctx.trace_id, "registry storage error");
            INTERNAL_SERVER_ERROR.to_string()
        }
        other => other.to_string(),
    };
    ApiError {
        status,
        body: ErrorResponse {
            code: err.code().as_i32(),
            message,
            trace_id: ctx.trace_id.clone(),
        },
    }
}

/// Build a 500 response for failures outside the registry (health checks).
pub fn api_internal(ctx: &RequestContext, err: &dyn std::fmt::Debug) -> ApiError {
    tracing::error!(error = ?err, trace_id = %ctx.trace_id, "internal error");
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            code: ErrorCode::Unknown.as_i32(),
            message: INTERNAL_SERVER_ERROR.to_string(),
            trace_id: ctx.trace_id.clone(),
        },
    }
}
