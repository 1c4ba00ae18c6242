//! Request/response envelopes for project-scoped objects.
//!
//! A request carries the object in structured form (`data`), as base64
//! canonical bytes (`proto`), or both. A response is always rebuilt from the
//! stored canonical bytes.
use super::entity::Entity;
use super::feature_service::FeatureService;
use super::feature_view::FeatureView;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[aliases(
    EntityRequest = ObjectRequest<Entity>,
    FeatureViewRequest = ObjectRequest<FeatureView>,
    FeatureServiceRequest = ObjectRequest<FeatureService>
)]
pub struct ObjectRequest<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub proto: Option<String>,
}

impl<T> ObjectRequest<T> {
    pub fn from_data(data: T) -> Self {
        Self {
            data: Some(data),
            proto: None,
        }
    }

    pub fn from_proto(proto: impl Into<String>) -> Self {
        Self {
            data: None,
            proto: Some(proto.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[aliases(
    EntityResponse = ObjectResponse<Entity>,
    FeatureViewResponse = ObjectResponse<FeatureView>,
    FeatureServiceResponse = ObjectResponse<FeatureService>
)]
pub struct ObjectResponse<T> {
    pub data: T,
    pub proto: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[aliases(
    EntityListResponse = ObjectListResponse<Entity>,
    FeatureViewListResponse = ObjectListResponse<FeatureView>,
    FeatureServiceListResponse = ObjectListResponse<FeatureService>
)]
pub struct ObjectListResponse<T> {
    pub items: Vec<ObjectResponse<T>>,
}
