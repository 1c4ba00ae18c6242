//! Registry HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
use crate::api;
use crate::api::objects::{entities, feature_services, feature_views};
use crate::api::openapi::ApiDoc;
use crate::registry::Registry;
use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    /// Check every object/project call against the caller's grants.
    pub enforce_access: bool,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route("/system/health", get(api::system::system_health))
        .route("/initialize", post(api::permissions::initialize))
        .route("/userpermissions/add", post(api::permissions::add_permission))
        .route(
            "/userpermissions/update",
            post(api::permissions::update_permission),
        )
        .route(
            "/userpermissions/remove",
            post(api::permissions::remove_permission),
        )
        .route(
            "/userpermissions/canaccess",
            post(api::permissions::can_access),
        )
        .route(
            "/userpermissions/:user_id",
            get(api::permissions::list_permissions),
        )
        .route("/projects", get(api::projects::list_projects))
        .route(
            "/projects/:project",
            put(api::projects::create_project)
                .patch(api::projects::update_project)
                .get(api::projects::get_project)
                .delete(api::projects::delete_project),
        )
        .route(
            "/projects/:project/apply",
            post(api::projects::apply_project),
        )
        .route("/projects/:project/entities", get(entities::list))
        .route(
            "/projects/:project/entities/:name",
            put(entities::create)
                .patch(entities::update)
                .get(entities::get)
                .delete(entities::delete),
        )
        .route(
            "/projects/:project/entities/:name/apply",
            post(entities::apply),
        )
        .route("/projects/:project/featureViews", get(feature_views::list))
        .route(
            "/projects/:project/featureViews/:name",
            put(feature_views::create)
                .patch(feature_views::update)
                .get(feature_views::get)
                .delete(feature_views::delete),
        )
        .route(
            "/projects/:project/featureViews/:name/apply",
            post(feature_views::apply),
        )
        .route(
            "/projects/:project/featureservices",
            get(feature_services::list),
        )
        .route(
            "/projects/:project/featureservices/:name",
            put(feature_services::create)
                .patch(feature_services::update)
                .get(feature_services::get)
                .delete(feature_services::delete),
        )
        .route(
            "/projects/:project/featureservices/:name/apply",
            post(feature_services::apply),
        )
        .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(trace_layer)
        .with_state(state)
}
