//! Project API handlers.
use crate::access::Operation;
use crate::api::error::{ApiError, api_error};
use crate::api::extract::JsonBody;
use crate::api::types::ErrorResponse;
use crate::api::authorize;
use crate::app::AppState;
use crate::context::RequestContext;
use crate::model::{ProjectListResponse, ProjectRequest, ProjectResponse};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    responses(
        (status = 200, description = "All projects, ordered by name", body = ProjectListResponse)
    )
)]
pub(crate) async fn list_projects(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ProjectListResponse>, ApiError> {
    authorize(&state, &ctx, None, Operation::LIST).await?;
    state
        .registry
        .list_projects(&ctx)
        .await
        .map(Json)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    get,
    path = "/projects/{project}",
    tag = "projects",
    params(("project" = String, Path, description = "Project name")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
pub(crate) async fn get_project(
    Path(project): Path<String>,
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ProjectResponse>, ApiError> {
    authorize(&state, &ctx, Some(&project), Operation::READ).await?;
    state
        .registry
        .get_project(&ctx, &project)
        .await
        .map(Json)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    put,
    path = "/projects/{project}",
    tag = "projects",
    request_body = ProjectRequest,
    params(("project" = String, Path, description = "Project name")),
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid store configuration", body = ErrorResponse),
        (status = 409, description = "Project already exists", body = ErrorResponse)
    )
)]
pub(crate) async fn create_project(
    Path(project): Path<String>,
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(body): JsonBody<ProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    authorize(&state, &ctx, Some(&project), Operation::CREATE).await?;
    state
        .registry
        .create_project(&ctx, &project, body)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)))
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    patch,
    path = "/projects/{project}",
    tag = "projects",
    request_body = ProjectRequest,
    params(("project" = String, Path, description = "Project name")),
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Invalid store configuration", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
pub(crate) async fn update_project(
    Path(project): Path<String>,
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(body): JsonBody<ProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    authorize(&state, &ctx, Some(&project), Operation::UPDATE).await?;
    state
        .registry
        .update_project(&ctx, &project, body)
        .await
        .map(Json)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    post,
    path = "/projects/{project}/apply",
    tag = "projects",
    request_body = ProjectRequest,
    params(("project" = String, Path, description = "Project name")),
    responses(
        (status = 200, description = "Project created or updated", body = ProjectResponse),
        (status = 400, description = "Invalid store configuration", body = ErrorResponse)
    )
)]
pub(crate) async fn apply_project(
    Path(project): Path<String>,
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(body): JsonBody<ProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    authorize(
        &state,
        &ctx,
        Some(&project),
        Operation::CREATE | Operation::UPDATE,
    )
    .await?;
    state
        .registry
        .apply_project(&ctx, &project, body)
        .await
        .map(Json)
        .map_err(|err| api_error(err, &ctx))
}

#[utoipa::path(
    delete,
    path = "/projects/{project}",
    tag = "projects",
    params(("project" = String, Path, description = "Project name")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 409, description = "Project still owns objects", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_project(
    Path(project): Path<String>,
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &ctx, Some(&project), Operation::DELETE).await?;
    state
        .registry
        .delete_project(&ctx, &project)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|err| api_error(err, &ctx))
}
