//! Registry data model.
//!
//! # Purpose
//! Canonical feature-store objects (the structured form of the canonical
//! payload), the persisted records that pair each payload with its projected
//! columns, and the request/response envelopes used by the registry surface.
mod common;
mod entity;
mod feature_service;
mod feature_view;
mod payload;
mod permission;
mod project;

pub use common::{Duration, ObjectKey, ObjectKind, ScopedRecord, Timestamp};
pub use entity::{Entity, EntityMeta, EntityRecord, EntitySpec, ValueType};
pub use feature_service::{
    FeatureService, FeatureServiceMeta, FeatureServiceRecord, FeatureServiceSpec,
    FeatureViewProjection,
};
pub use feature_view::{
    DataSource, DataSourceType, FeatureSpec, FeatureView, FeatureViewMeta, FeatureViewRecord,
    FeatureViewSpec, MaterializationInterval,
};
pub use payload::{
    EntityRequest, EntityResponse, FeatureServiceRequest, FeatureServiceResponse,
    EntityListResponse, FeatureServiceListResponse, FeatureViewListResponse, FeatureViewRequest,
    FeatureViewResponse, ObjectListResponse, ObjectRequest, ObjectResponse,
};
pub use permission::{
    UserPermissionKey, UserPermissionListResponse, UserPermissionRecord, UserPermissionRequest,
    UserPermissionResponse,
};
pub use project::{ProjectListResponse, ProjectRecord, ProjectRequest, ProjectResponse};
