//! Handlers for the project-scoped object kinds.
//!
//! The shared logic is generic over the kind's [`ObjectMapper`]; the
//! per-kind modules only bind it to routes and OpenAPI metadata.
use crate::access::Operation;
use crate::api::authorize;
use crate::api::error::{ApiError, api_error};
use crate::app::AppState;
use crate::context::RequestContext;
use crate::mapper::ObjectMapper;
use crate::model::{ObjectKey, ObjectListResponse, ObjectRequest, ObjectResponse};
use axum::Json;
use axum::http::StatusCode;

type ObjectResult<M> = Result<Json<ObjectResponse<<M as ObjectMapper>::Object>>, ApiError>;

async fn list_objects<M: ObjectMapper>(
    state: &AppState,
    ctx: &RequestContext,
    project: &str,
) -> Result<Json<ObjectListResponse<M::Object>>, ApiError> {
    authorize(state, ctx, Some(project), Operation::LIST).await?;
    state
        .registry
        .list::<M>(ctx, project)
        .await
        .map(Json)
        .map_err(|err| api_error(err, ctx))
}

async fn get_object<M: ObjectMapper>(
    state: &AppState,
    ctx: &RequestContext,
    key: ObjectKey,
) -> ObjectResult<M> {
    authorize(state, ctx, Some(&key.project), Operation::READ).await?;
    state
        .registry
        .get::<M>(ctx, &key)
        .await
        .map(Json)
        .map_err(|err| api_error(err, ctx))
}

async fn apply_object<M: ObjectMapper>(
    state: &AppState,
    ctx: &RequestContext,
    key: ObjectKey,
    body: ObjectRequest<M::Object>,
) -> ObjectResult<M> {
    authorize(
        state,
        ctx,
        Some(&key.project),
        Operation::CREATE | Operation::UPDATE,
    )
    .await?;
    state
        .registry
        .create_or_update::<M>(ctx, &key, body)
        .await
        .map(Json)
        .map_err(|err| api_error(err, ctx))
}

async fn create_object<M: ObjectMapper>(
    state: &AppState,
    ctx: &RequestContext,
    key: ObjectKey,
    body: ObjectRequest<M::Object>,
) -> Result<(StatusCode, Json<ObjectResponse<M::Object>>), ApiError> {
    authorize(state, ctx, Some(&key.project), Operation::CREATE).await?;
    state
        .registry
        .create::<M>(ctx, &key, body)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)))
        .map_err(|err| api_error(err, ctx))
}

async fn update_object<M: ObjectMapper>(
    state: &AppState,
    ctx: &RequestContext,
    key: ObjectKey,
    body: ObjectRequest<M::Object>,
) -> ObjectResult<M> {
    authorize(state, ctx, Some(&key.project), Operation::UPDATE).await?;
    state
        .registry
        .update::<M>(ctx, &key, body)
        .await
        .map(Json)
        .map_err(|err| api_error(err, ctx))
}

async fn delete_object<M: ObjectMapper>(
    state: &AppState,
    ctx: &RequestContext,
    key: ObjectKey,
) -> Result<StatusCode, ApiError> {
    authorize(state, ctx, Some(&key.project), Operation::DELETE).await?;
    state
        .registry
        .delete::<M>(ctx, &key)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|err| api_error(err, ctx))
}

macro_rules! object_handlers {
    (
        $module:ident,
        mapper: $mapper:ident,
        tag: $tag:tt,
        request: $request:ident,
        response: $response:ident,
        list: $list:ident,
        collection_path: $collection:tt,
        item_path: $item:tt,
        apply_path: $apply:tt $(,)?
    ) => {
        pub mod $module {
            use crate::api::error::ApiError;
            use crate::api::extract::JsonBody;
            use crate::api::types::ErrorResponse;
            use crate::app::AppState;
            use crate::context::RequestContext;
            use crate::mapper::$mapper;
            use crate::model::{$list, $request, $response, ObjectKey};
            use axum::Json;
            use axum::extract::{Path, State};
            use axum::http::StatusCode;

            #[utoipa::path(
                get,
                path = $collection,
                tag = $tag,
                params(("project" = String, Path, description = "Project name")),
                responses(
                    (status = 200, description = "Objects in the project, ordered by name", body = $list),
                    (status = 404, description = "Project not found", body = ErrorResponse)
                )
            )]
            pub(crate) async fn list(
                Path(project): Path<String>,
                State(state): State<AppState>,
                ctx: RequestContext,
            ) -> Result<Json<$list>, ApiError> {
                super::list_objects::<$mapper>(&state, &ctx, &project).await
            }

            #[utoipa::path(
                get,
                path = $item,
                tag = $tag,
                params(
                    ("project" = String, Path, description = "Project name"),
                    ("name" = String, Path, description = "Object name")
                ),
                responses(
                    (status = 200, description = "Object", body = $response),
                    (status = 404, description = "Project or object not found", body = ErrorResponse)
                )
            )]
            pub(crate) async fn get(
                Path((project, name)): Path<(String, String)>,
                State(state): State<AppState>,
                ctx: RequestContext,
            ) -> Result<Json<$response>, ApiError> {
                super::get_object::<$mapper>(&state, &ctx, ObjectKey::new(project, name)).await
            }

            #[utoipa::path(
                post,
                path = $apply,
                tag = $tag,
                request_body = $request,
                params(
                    ("project" = String, Path, description = "Project name"),
                    ("name" = String, Path, description = "Object name")
                ),
                responses(
                    (status = 200, description = "Object created or updated", body = $response),
                    (status = 400, description = "Invalid payload", body = ErrorResponse),
                    (status = 404, description = "Project not found", body = ErrorResponse)
                )
            )]
            pub(crate) async fn apply(
                Path((project, name)): Path<(String, String)>,
                State(state): State<AppState>,
                ctx: RequestContext,
                JsonBody(body): JsonBody<$request>,
            ) -> Result<Json<$response>, ApiError> {
                super::apply_object::<$mapper>(&state, &ctx, ObjectKey::new(project, name), body)
                    .await
            }

            #[utoipa::path(
                put,
                path = $item,
                tag = $tag,
                request_body = $request,
                params(
                    ("project" = String, Path, description = "Project name"),
                    ("name" = String, Path, description = "Object name")
                ),
                responses(
                    (status = 201, description = "Object created", body = $response),
                    (status = 400, description = "Invalid payload", body = ErrorResponse),
                    (status = 404, description = "Project not found", body = ErrorResponse),
                    (status = 409, description = "Object already exists", body = ErrorResponse)
                )
            )]
            pub(crate) async fn create(
                Path((project, name)): Path<(String, String)>,
                State(state): State<AppState>,
                ctx: RequestContext,
                JsonBody(body): JsonBody<$request>,
            ) -> Result<(StatusCode, Json<$response>), ApiError> {
                super::create_object::<$mapper>(&state, &ctx, ObjectKey::new(project, name), body)
                    .await
            }

            #[utoipa::path(
                patch,
                path = $item,
                tag = $tag,
                request_body = $request,
                params(
                    ("project" = String, Path, description = "Project name"),
                    ("name" = String, Path, description = "Object name")
                ),
                responses(
                    (status = 200, description = "Object updated", body = $response),
                    (status = 400, description = "Invalid payload", body = ErrorResponse),
                    (status = 404, description = "Project or object not found", body = ErrorResponse)
                )
            )]
            pub(crate) async fn update(
                Path((project, name)): Path<(String, String)>,
                State(state): State<AppState>,
                ctx: RequestContext,
                JsonBody(body): JsonBody<$request>,
            ) -> Result<Json<$response>, ApiError> {
                super::update_object::<$mapper>(&state, &ctx, ObjectKey::new(project, name), body)
                    .await
            }

            #[utoipa::path(
                delete,
                path = $item,
                tag = $tag,
                params(
                    ("project" = String, Path, description = "Project name"),
                    ("name" = String, Path, description = "Object name")
                ),
                responses(
                    (status = 204, description = "Object deleted"),
                    (status = 404, description = "Project or object not found", body = ErrorResponse)
                )
            )]
            pub(crate) async fn delete(
                Path((project, name)): Path<(String, String)>,
                State(state): State<AppState>,
                ctx: RequestContext,
            ) -> Result<StatusCode, ApiError> {
                super::delete_object::<$mapper>(&state, &ctx, ObjectKey::new(project, name)).await
            }
        }
    };
}

object_handlers!(
    entities,
    mapper: EntityMapper,
    tag: "entities",
    request: EntityRequest,
    response: EntityResponse,
    list: EntityListResponse,
    collection_path: "/projects/{project}/entities",
    item_path: "/projects/{project}/entities/{name}",
    apply_path: "/projects/{project}/entities/{name}/apply",
);

object_handlers!(
    feature_views,
    mapper: FeatureViewMapper,
    tag: "featureViews",
    request: FeatureViewRequest,
    response: FeatureViewResponse,
    list: FeatureViewListResponse,
    collection_path: "/projects/{project}/featureViews",
    item_path: "/projects/{project}/featureViews/{name}",
    apply_path: "/projects/{project}/featureViews/{name}/apply",
);

object_handlers!(
    feature_services,
    mapper: FeatureServiceMapper,
    tag: "featureservices",
    request: FeatureServiceRequest,
    response: FeatureServiceResponse,
    list: FeatureServiceListResponse,
    collection_path: "/projects/{project}/featureservices",
    item_path: "/projects/{project}/featureservices/{name}",
    apply_path: "/projects/{project}/featureservices/{name}/apply",
);
