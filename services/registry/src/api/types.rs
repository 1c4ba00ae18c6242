//! HTTP-only payload shapes. Domain request/response types live in `model`.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
    pub durable: bool,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(rename = "traceId")]
    pub trace_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiVersionQuery {
    /// Overrides the default API version when the `api-version` header is absent.
    #[serde(rename = "api-version")]
    pub api_version: Option<String>,
}
