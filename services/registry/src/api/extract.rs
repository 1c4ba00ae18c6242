//! Request-context and JSON body extraction.
use crate::api::error::ApiError;
use crate::api::types::{ApiVersionQuery, ErrorResponse};
use crate::context::RequestContext;
use crate::registry::ErrorCode;
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use std::convert::Infallible;

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // An unparsable query string only loses the api-version override.
        let query = Query::<ApiVersionQuery>::try_from_uri(&parts.uri)
            .map(|Query(query)| query)
            .unwrap_or_default();
        Ok(RequestContext::from_headers(
            &parts.headers,
            query.api_version.as_deref(),
        ))
    }
}

/// JSON request body whose rejections use the registry error envelope.
///
/// A body that is not JSON, or does not fit the request type, answers 400 with
/// `InvalidPayload` instead of axum's plain-text 415/422.
pub(crate) struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_headers(req.headers(), None);
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejected_body(rejection, &ctx)),
        }
    }
}

fn rejected_body(rejection: JsonRejection, ctx: &RequestContext) -> ApiError {
    tracing::debug!(trace_id = %ctx.trace_id, error = %rejection, "rejected request body");
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`.".to_string()
        }
        other => format!("Invalid request body: {}", other.body_text()),
    };
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: ErrorResponse {
            code: ErrorCode::InvalidPayload.as_i32(),
            message,
            trace_id: ctx.trace_id.clone(),
        },
    }
}
