//! User permission model.
use crate::access::{Operation, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique key of a permission grant. `project_name = None` is the global scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserPermissionKey {
    pub user_id: String,
    pub project_name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserPermissionRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName", default)]
    pub user_name: String,
    pub role: Role,
    #[serde(rename = "projectName", default)]
    pub project_name: Option<String>,
    #[serde(default)]
    #[schema(value_type = u32)]
    pub permission: Operation,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct UserPermissionResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub role: Role,
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
    #[schema(value_type = u32)]
    pub permission: Operation,
    #[serde(rename = "createdTime")]
    pub created_time: DateTime<Utc>,
    #[serde(rename = "lastUpdatedTime")]
    pub last_updated_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserPermissionListResponse {
    pub items: Vec<UserPermissionResponse>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPermissionRecord {
    pub user_id: String,
    pub user_name: String,
    pub role: Role,
    pub project_name: Option<String>,
    pub permission: Operation,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

impl UserPermissionRecord {
    pub fn key(&self) -> UserPermissionKey {
        UserPermissionKey {
            user_id: self.user_id.clone(),
            project_name: self.project_name.clone(),
            role: self.role,
        }
    }

    /// Take the mutable fields of `incoming`; the key and `created_time` stay.
    pub fn merge(&mut self, incoming: UserPermissionRecord) {
        self.user_name = incoming.user_name;
        self.permission = incoming.permission;
        self.last_updated_time = incoming.last_updated_time;
    }
}
