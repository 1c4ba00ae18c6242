//! System/health API handlers.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::{ErrorResponse, HealthStatus};
use crate::app::AppState;
use crate::context::RequestContext;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Registry health", body = HealthStatus),
        (status = 500, description = "Backing store unavailable", body = ErrorResponse)
    )
)]
/// Ping the backing store and report the active backend.
///
/// # Errors
/// - Returns 500 if the store health check fails.
pub(crate) async fn system_health(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<HealthStatus>, ApiError> {
    let store = state.registry.store();
    if let Err(err) = store.health_check().await {
        return Err(api_internal(&ctx, &err));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        backend: store.backend_name().to_string(),
        durable: store.is_durable(),
    }))
}
