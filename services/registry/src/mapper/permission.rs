//! User permission mapping.
use super::{MapperError, MapperResult};
use crate::model::{
    UserPermissionKey, UserPermissionRecord, UserPermissionRequest, UserPermissionResponse,
};
use chrono::{DateTime, Utc};

/// An empty project name means the global scope.
fn scope(project_name: Option<String>) -> Option<String> {
    project_name.filter(|name| !name.trim().is_empty())
}

pub fn to_key(request: &UserPermissionRequest) -> MapperResult<UserPermissionKey> {
    if request.user_id.trim().is_empty() {
        return Err(MapperError::MissingParameter("userId"));
    }
    Ok(UserPermissionKey {
        user_id: request.user_id.clone(),
        project_name: scope(request.project_name.clone()),
        role: request.role,
    })
}

pub fn to_record(
    request: UserPermissionRequest,
    now: DateTime<Utc>,
) -> MapperResult<UserPermissionRecord> {
    let key = to_key(&request)?;
    Ok(UserPermissionRecord {
        user_id: key.user_id,
        user_name: request.user_name,
        role: key.role,
        project_name: key.project_name,
        permission: request.permission,
        created_time: now,
        last_updated_time: now,
    })
}

pub fn to_response(record: UserPermissionRecord) -> UserPermissionResponse {
    UserPermissionResponse {
        user_id: record.user_id,
        user_name: record.user_name,
        role: record.role,
        project_name: record.project_name,
        permission: record.permission,
        created_time: record.created_time,
        last_updated_time: record.last_updated_time,
    }
}
