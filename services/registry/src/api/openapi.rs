//! OpenAPI schema aggregation for the registry API.
use crate::access::{CanAccessQuery, CanAccessResult, Role};
use crate::api::objects::{entities, feature_services, feature_views};
use crate::api::{
    permissions, projects, system,
    types::{ErrorResponse, HealthStatus},
};
use crate::model::{
    DataSource, DataSourceType, Duration, Entity, EntityListResponse, EntityMeta, EntityRequest,
    EntityResponse, EntitySpec, FeatureService, FeatureServiceListResponse, FeatureServiceMeta,
    FeatureServiceRequest, FeatureServiceResponse, FeatureServiceSpec, FeatureSpec, FeatureView,
    FeatureViewListResponse, FeatureViewMeta, FeatureViewProjection, FeatureViewRequest,
    FeatureViewResponse, FeatureViewSpec, MaterializationInterval, ProjectListResponse,
    ProjectRequest, ProjectResponse, Timestamp, UserPermissionListResponse, UserPermissionRequest,
    UserPermissionResponse, ValueType,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "feature-registry",
        version = "0.13",
        description = "Feature store metadata registry HTTP API"
    ),
    paths(
        system::system_health,
        permissions::initialize,
        permissions::add_permission,
        permissions::update_permission,
        permissions::remove_permission,
        permissions::can_access,
        permissions::list_permissions,
        projects::list_projects,
        projects::get_project,
        projects::create_project,
        projects::update_project,
        projects::apply_project,
        projects::delete_project,
        entities::list,
        entities::get,
        entities::apply,
        entities::create,
        entities::update,
        entities::delete,
        feature_views::list,
        feature_views::get,
        feature_views::apply,
        feature_views::create,
        feature_views::update,
        feature_views::delete,
        feature_services::list,
        feature_services::get,
        feature_services::apply,
        feature_services::create,
        feature_services::update,
        feature_services::delete
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        Role,
        CanAccessQuery,
        CanAccessResult,
        ProjectRequest,
        ProjectResponse,
        ProjectListResponse,
        UserPermissionRequest,
        UserPermissionResponse,
        UserPermissionListResponse,
        Timestamp,
        Duration,
        ValueType,
        Entity,
        EntitySpec,
        EntityMeta,
        EntityRequest,
        EntityResponse,
        EntityListResponse,
        FeatureView,
        FeatureViewSpec,
        FeatureViewMeta,
        FeatureSpec,
        MaterializationInterval,
        DataSource,
        DataSourceType,
        FeatureViewRequest,
        FeatureViewResponse,
        FeatureViewListResponse,
        FeatureService,
        FeatureServiceSpec,
        FeatureServiceMeta,
        FeatureViewProjection,
        FeatureServiceRequest,
        FeatureServiceResponse,
        FeatureServiceListResponse
    )),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "rbac", description = "User permissions and access decisions"),
        (name = "projects", description = "Project management"),
        (name = "entities", description = "Feature entities"),
        (name = "featureViews", description = "Feature views"),
        (name = "featureservices", description = "Feature services")
    )
)]
pub struct ApiDoc;

