//! Registry error kinds, stable error codes, and user-facing messages.
//!
//! Every variant renders (via `Display`) the exact message returned to the
//! caller, except [`RegistryError::Store`], whose detail is only logged.
use crate::codec::CodecError;
use crate::mapper::MapperError;
use crate::model::{ObjectKey, ObjectKind, UserPermissionKey};
use crate::store::{ADMIN, PERMISSION, PROJECT, StoreError};
use thiserror::Error;

/// Stable numeric error codes carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ObjectAlreadyExists,
    ValueDoesNotMatch,
    ObjectNotFound,
    MissingParameter,
    RbacAlreadyInitialized,
    ProjectNotEmpty,
    Forbidden,
    InvalidPayload,
    Unknown,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::ObjectAlreadyExists => 100,
            ErrorCode::ValueDoesNotMatch => 101,
            ErrorCode::ObjectNotFound => 102,
            ErrorCode::MissingParameter => 103,
            ErrorCode::RbacAlreadyInitialized => 104,
            ErrorCode::ProjectNotEmpty => 105,
            ErrorCode::Forbidden => 106,
            ErrorCode::InvalidPayload => 107,
            ErrorCode::Unknown => 900,
        }
    }
}

pub const INTERNAL_SERVER_ERROR: &str =
    "The server encountered an internal error and was unable to complete your request.";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Conflict { code: ErrorCode, message: String },
    #[error("Value of {0} in the URL doesn't match the value in request body.")]
    ValueMismatch(String),
    #[error("The required parameter {0} is missing.")]
    MissingParameter(String),
    #[error("The request payload is invalid: {0}")]
    InvalidPayload(#[from] CodecError),
    #[error("{0}")]
    Forbidden(String),
    #[error("store failure: {0}")]
    Store(anyhow::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::NotFound(_) => ErrorCode::ObjectNotFound,
            RegistryError::Conflict { code, .. } => *code,
            RegistryError::ValueMismatch(_) => ErrorCode::ValueDoesNotMatch,
            RegistryError::MissingParameter(_)
            | RegistryError::InvalidPayload(CodecError::MissingDiscriminator) => {
                ErrorCode::MissingParameter
            }
            RegistryError::InvalidPayload(_) => ErrorCode::InvalidPayload,
            RegistryError::Forbidden(_) => ErrorCode::Forbidden,
            RegistryError::Store(_) => ErrorCode::Unknown,
        }
    }

    /// Short outcome label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RegistryError::NotFound(_) => "not_found",
            RegistryError::Conflict { .. } => "conflict",
            RegistryError::ValueMismatch(_)
            | RegistryError::MissingParameter(_)
            | RegistryError::InvalidPayload(_) => "invalid",
            RegistryError::Forbidden(_) => "forbidden",
            RegistryError::Store(_) => "error",
        }
    }

    pub fn project_not_found(project: &str) -> Self {
        RegistryError::NotFound(format!(
            "The project with name {project} does not exist or you don't have permission to access it."
        ))
    }

    pub fn project_already_exists(project: &str) -> Self {
        RegistryError::Conflict {
            code: ErrorCode::ObjectAlreadyExists,
            message: format!("The project with name {project} already exists."),
        }
    }

    pub fn project_not_empty(project: &str) -> Self {
        RegistryError::Conflict {
            code: ErrorCode::ProjectNotEmpty,
            message: format!(
                "The project with name {project} contains other objects and can not be deleted. Delete all objects and try again."
            ),
        }
    }

    pub fn object_not_found(kind: ObjectKind, key: &ObjectKey) -> Self {
        RegistryError::NotFound(format!(
            "The {} with name {} does not exist in project {} or you don't have permission to access it.",
            kind.label(),
            key.name,
            key.project
        ))
    }

    pub fn object_already_exists(kind: ObjectKind, key: &ObjectKey) -> Self {
        RegistryError::Conflict {
            code: ErrorCode::ObjectAlreadyExists,
            message: format!(
                "The {} with name {} already exists in project {}.",
                kind.label(),
                key.name,
                key.project
            ),
        }
    }

    pub fn permission_not_found(key: &UserPermissionKey) -> Self {
        RegistryError::NotFound(format!(
            "The user permission with user id {}, project {}, role {} does not exist or you don't have permission to access it.",
            key.user_id,
            key.project_name.as_deref().unwrap_or("NA"),
            key.role
        ))
    }

    pub fn permission_already_exists(key: &UserPermissionKey) -> Self {
        RegistryError::Conflict {
            code: ErrorCode::ObjectAlreadyExists,
            message: format!(
                "The user permission with user id {}, project {}, role {} already exists.",
                key.user_id,
                key.project_name.as_deref().unwrap_or("NA"),
                key.role
            ),
        }
    }

    pub fn rbac_already_initialized() -> Self {
        RegistryError::Conflict {
            code: ErrorCode::RbacAlreadyInitialized,
            message: "There's already one or more admins in the service.".to_string(),
        }
    }

    pub fn forbidden(user_id: &str) -> Self {
        RegistryError::Forbidden(format!(
            "The user {user_id} doesn't have permission to perform this operation."
        ))
    }

    /// Translate a store failure on a project-scoped object.
    pub(crate) fn from_object_store(kind: ObjectKind, key: &ObjectKey, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(label) if label == PROJECT => Self::project_not_found(&key.project),
            StoreError::NotFound(_) => Self::object_not_found(kind, key),
            StoreError::Conflict(_) => Self::object_already_exists(kind, key),
            StoreError::NotEmpty(_) => Self::project_not_empty(&key.project),
            StoreError::Unexpected(err) => RegistryError::Store(err),
        }
    }

    pub(crate) fn from_project_store(project: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::project_not_found(project),
            StoreError::Conflict(_) => Self::project_already_exists(project),
            StoreError::NotEmpty(_) => Self::project_not_empty(project),
            StoreError::Unexpected(err) => RegistryError::Store(err),
        }
    }

    pub(crate) fn from_permission_store(key: &UserPermissionKey, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::permission_not_found(key),
            StoreError::Conflict(label) if label == ADMIN => Self::rbac_already_initialized(),
            StoreError::Conflict(label) if label == PERMISSION => {
                Self::permission_already_exists(key)
            }
            StoreError::Conflict(label) => RegistryError::Store(anyhow::anyhow!(
                "unexpected conflict on {label} on permission write"
            )),
            StoreError::NotEmpty(label) => RegistryError::Store(anyhow::anyhow!(
                "unexpected non-empty {label} on permission write"
            )),
            StoreError::Unexpected(err) => RegistryError::Store(err),
        }
    }
}

impl From<MapperError> for RegistryError {
    fn from(err: MapperError) -> Self {
        match err {
            MapperError::ValueMismatch(field) => RegistryError::ValueMismatch(field.to_string()),
            MapperError::MissingParameter(field) => {
                RegistryError::MissingParameter(field.to_string())
            }
            MapperError::Codec(err) => RegistryError::InvalidPayload(err),
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unexpected(err) => RegistryError::Store(err),
            other => RegistryError::Store(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::ObjectAlreadyExists.as_i32(), 100);
        assert_eq!(ErrorCode::InvalidPayload.as_i32(), 107);
        assert_eq!(ErrorCode::Unknown.as_i32(), 900);
    }

    #[test]
    fn object_messages_name_kind_and_key() {
        let key = ObjectKey::new("p1", "driver_stats");
        let err = RegistryError::object_already_exists(ObjectKind::FeatureView, &key);
        assert_eq!(
            err.to_string(),
            "The feature view with name driver_stats already exists in project p1."
        );
        assert_eq!(err.code(), ErrorCode::ObjectAlreadyExists);
    }

    #[test]
    fn store_labels_pick_the_message() {
        let key = ObjectKey::new("p1", "e1");
        let missing_project = RegistryError::from_object_store(
            ObjectKind::Entity,
            &key,
            StoreError::NotFound(PROJECT.into()),
        );
        assert!(missing_project.to_string().starts_with("The project with name p1"));

        let missing_object = RegistryError::from_object_store(
            ObjectKind::Entity,
            &key,
            StoreError::NotFound("object".into()),
        );
        assert!(missing_object.to_string().starts_with("The entity with name e1"));
    }

    #[test]
    fn global_permission_renders_na_project() {
        let key = UserPermissionKey {
            user_id: "u1".to_string(),
            project_name: None,
            role: Role::Reader,
        };
        assert_eq!(
            RegistryError::permission_already_exists(&key).to_string(),
            "The user permission with user id u1, project NA, role reader already exists."
        );
    }

    #[test]
    fn unexpected_permission_conflict_is_a_store_failure() {
        let key = UserPermissionKey {
            user_id: "u1".to_string(),
            project_name: Some("p1".to_string()),
            role: Role::Reader,
        };
        let err = RegistryError::from_permission_store(&key, StoreError::Conflict("other".into()));
        assert_eq!(err.code(), ErrorCode::Unknown);
        assert!(matches!(err, RegistryError::Store(_)));
    }

    #[test]
    fn mapper_errors_keep_their_kind() {
        let err: RegistryError = MapperError::ValueMismatch("project").into();
        assert_eq!(err.code(), ErrorCode::ValueDoesNotMatch);
        assert_eq!(
            err.to_string(),
            "Value of project in the URL doesn't match the value in request body."
        );
        let err: RegistryError =
            MapperError::Codec(CodecError::UnknownDiscriminator("s3".to_string())).into();
        assert_eq!(err.code(), ErrorCode::InvalidPayload);
        let err: RegistryError = MapperError::Codec(CodecError::MissingDiscriminator).into();
        assert_eq!(err.code(), ErrorCode::MissingParameter);
    }
}
