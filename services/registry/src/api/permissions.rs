//! User permission and RBAC API handlers.
//!
//! With access enforcement on, changing a grant needs an admin grant on the
//! grant's project (or a global admin grant), and listing another user's
//! grants needs a global admin grant. Initialization and access queries are
//! always open.
use crate::access::{CanAccessQuery, CanAccessResult};
use crate::api::error::{ApiError, api_error};
use crate::api::extract::JsonBody;
use crate::api::types::ErrorResponse;
use crate::api::authorize_admin;
use crate::app::AppState;
use crate::context::RequestContext;
use crate::model::{UserPermissionListResponse, UserPermissionRequest, UserPermissionResponse};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

#[utoipa::path(
    post,
    path = "/initialize",
    tag = "rbac",
    responses(
        (status = 204, description = "Caller granted the global admin role"),
        (status = 409, description = "An admin already exists", body = ErrorResponse)
    )
)]
pub(crate) async fn initialize(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .init_rbac(&ctx)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    post,
    path = "/userpermissions/add",
    tag = "rbac",
    request_body = UserPermissionRequest,
    responses(
        (status = 200, description = "Grant added", body = UserPermissionResponse),
        (status = 409, description = "Grant already exists", body = ErrorResponse)
    )
)]
pub(crate) async fn add_permission(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(body): JsonBody<UserPermissionRequest>,
) -> Result<Json<UserPermissionResponse>, ApiError> {
    authorize_admin(&state, &ctx, body.project_name.as_deref()).await?;
    state
        .registry
        .add_permission(&ctx, body)
        .await
        .map(Json)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    post,
    path = "/userpermissions/update",
    tag = "rbac",
    request_body = UserPermissionRequest,
    responses(
        (status = 200, description = "Grant updated", body = UserPermissionResponse),
        (status = 404, description = "Grant not found", body = ErrorResponse)
    )
)]
pub(crate) async fn update_permission(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(body): JsonBody<UserPermissionRequest>,
) -> Result<Json<UserPermissionResponse>, ApiError> {
    authorize_admin(&state, &ctx, body.project_name.as_deref()).await?;
    state
        .registry
        .update_permission(&ctx, body)
        .await
        .map(Json)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    post,
    path = "/userpermissions/remove",
    tag = "rbac",
    request_body = UserPermissionRequest,
    responses(
        (status = 204, description = "Grant removed"),
        (status = 404, description = "Grant not found", body = ErrorResponse)
    )
)]
pub(crate) async fn remove_permission(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(body): JsonBody<UserPermissionRequest>,
) -> Result<StatusCode, ApiError> {
    authorize_admin(&state, &ctx, body.project_name.as_deref()).await?;
    state
        .registry
        .remove_permission(&ctx, &body)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    post,
    path = "/userpermissions/canaccess",
    tag = "rbac",
    request_body = CanAccessQuery,
    responses(
        (status = 200, description = "Access decision", body = CanAccessResult)
    )
)]
pub(crate) async fn can_access(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(query): JsonBody<CanAccessQuery>,
) -> Result<Json<CanAccessResult>, ApiError> {
    state
        .registry
        .can_access(&ctx, &query)
        .await
        .map(Json)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    get,
    path = "/userpermissions/{user_id}",
    tag = "rbac",
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Grants held by the user", body = UserPermissionListResponse)
    )
)]
pub(crate) async fn list_permissions(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<UserPermissionListResponse>, ApiError> {
    if user_id != ctx.user_id {
        authorize_admin(&state, &ctx, None).await?;
    }
    state
        .registry
        .list_permissions(&ctx, &user_id)
        .await
        .map(Json)
        .map_err(|err| api_error(err, &ctx))
}
