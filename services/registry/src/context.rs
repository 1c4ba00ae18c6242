//! Per-request caller context and the registry clock.
//!
//! The context is built once at the HTTP boundary and passed explicitly to
//! every registry operation; nothing about the caller is kept in ambient state.
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

pub const USER_ID_HEADER: &str = "feast-core-user-id";
pub const USER_NAME_HEADER: &str = "feast-core-user-name";
/// Principal headers injected by an authenticating proxy; they win over the plain ones.
pub const PROXY_USER_ID_HEADER: &str = "x-ms-client-principal-id";
pub const PROXY_USER_NAME_HEADER: &str = "x-ms-client-principal-name";
pub const API_VERSION_HEADER: &str = "api-version";
pub const TRACE_ID_HEADER: &str = "trace-id";
pub const DEFAULT_API_VERSION: &str = "0.13";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: String,
    pub user_name: String,
    pub api_version: String,
    pub trace_id: String,
}

impl RequestContext {
    /// Context for calls that do not originate from HTTP (startup tasks, tests).
    pub fn internal(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Build the context from request headers.
    ///
    /// `query_api_version` comes from the `api-version` query parameter and is
    /// used when the header is absent.
    pub fn from_headers(headers: &HeaderMap, query_api_version: Option<&str>) -> Self {
        let user_id = header(headers, PROXY_USER_ID_HEADER)
            .or_else(|| header(headers, USER_ID_HEADER))
            .unwrap_or_default();
        let user_name = header(headers, PROXY_USER_NAME_HEADER)
            .or_else(|| header(headers, USER_NAME_HEADER))
            .unwrap_or_default();
        let api_version = header(headers, API_VERSION_HEADER)
            .or_else(|| {
                query_api_version
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let trace_id = header(headers, TRACE_ID_HEADER)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            user_id,
            user_name,
            api_version,
            trace_id,
        }
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Source of record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Used to make timestamps deterministic.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_principal_overrides_user_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, "local-user".parse().unwrap());
        headers.insert(USER_NAME_HEADER, "Local".parse().unwrap());
        headers.insert(PROXY_USER_ID_HEADER, "aad-oid".parse().unwrap());
        let ctx = RequestContext::from_headers(&headers, None);
        assert_eq!(ctx.user_id, "aad-oid");
        assert_eq!(ctx.user_name, "Local");
    }

    #[test]
    fn api_version_prefers_header_then_query_then_default() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            RequestContext::from_headers(&headers, None).api_version,
            DEFAULT_API_VERSION
        );
        assert_eq!(
            RequestContext::from_headers(&headers, Some("0.14")).api_version,
            "0.14"
        );
        headers.insert(API_VERSION_HEADER, "0.15".parse().unwrap());
        assert_eq!(
            RequestContext::from_headers(&headers, Some("0.14")).api_version,
            "0.15"
        );
    }

    #[test]
    fn trace_id_is_taken_or_generated() {
        let mut headers = HeaderMap::new();
        let generated = RequestContext::from_headers(&headers, None).trace_id;
        assert!(uuid::Uuid::parse_str(&generated).is_ok());
        headers.insert(TRACE_ID_HEADER, "abc-123".parse().unwrap());
        assert_eq!(
            RequestContext::from_headers(&headers, None).trace_id,
            "abc-123"
        );
    }

    #[test]
    fn manual_clock_advances() {
        let start = DateTime::from_timestamp(1_000, 0).expect("time");
        let clock = ManualClock::new(start);
        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(clock.now().timestamp(), 1_005);
    }
}
