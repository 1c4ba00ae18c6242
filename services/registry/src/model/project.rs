//! Project model: the root of the registry hierarchy.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Project create/update body.
///
/// Store settings arrive as raw JSON and are decoded by the store-config codec,
/// so a missing or unknown `type` surfaces as a codec error rather than a body
/// rejection.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct ProjectRequest {
    #[serde(rename = "projectName", default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub online_store: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub offline_store: Option<Value>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ProjectResponse {
    #[serde(rename = "projectName")]
    pub project_name: String,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub online_store: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub offline_store: Option<Value>,
    pub provider: Option<String>,
    pub flags: Option<String>,
    #[serde(rename = "isDefault")]
    pub is_default: bool,
    #[serde(rename = "createdTime")]
    pub created_time: DateTime<Utc>,
    #[serde(rename = "lastUpdatedTime")]
    pub last_updated_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectListResponse {
    pub items: Vec<ProjectResponse>,
}

/// Persisted project.
///
/// `*_store_type` is the discriminator of the matching encoded config and is
/// always written together with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub project_name: String,
    pub description: Option<String>,
    pub online_store_type: Option<String>,
    pub online_store_config: Option<Value>,
    pub offline_store_type: Option<String>,
    pub offline_store_config: Option<Value>,
    pub provider: Option<String>,
    pub flags: Option<String>,
    pub is_default: bool,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

impl ProjectRecord {
    /// Absorb a newer version, keeping the name and `created_time`.
    pub fn merge(&mut self, incoming: ProjectRecord) {
        self.description = incoming.description;
        self.online_store_type = incoming.online_store_type;
        self.online_store_config = incoming.online_store_config;
        self.offline_store_type = incoming.offline_store_type;
        self.offline_store_config = incoming.offline_store_config;
        self.provider = incoming.provider;
        self.flags = incoming.flags;
        self.is_default = incoming.is_default;
        self.last_updated_time = incoming.last_updated_time;
    }
}
