//! Registry storage backends.
//!
//! # Contract
//! Every mutating call performs its existence checks and its write as one
//! atomic unit: the in-memory backend under a single write guard, the Postgres
//! backend inside one transaction backed by unique and foreign-key
//! constraints. Callers never check-then-write across two calls.
//!
//! Error labels name what was missing or clashing (`"project"`, `"object"`,
//! `"permission"`, `"admin"`) so the registry can pick the right message.
use crate::model::{
    EntityRecord, FeatureServiceRecord, FeatureViewRecord, ObjectKey, ProjectRecord,
    ScopedRecord, UserPermissionKey, UserPermissionRecord,
};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub const PROJECT: &str = "project";
pub const OBJECT: &str = "object";
pub const PERMISSION: &str = "permission";
pub const ADMIN: &str = "admin";

/// Name of the placeholder entity that never blocks project deletion.
pub const PLACEHOLDER_ENTITY: &str = "__dummy";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not empty: {0}")]
    NotEmpty(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Collection of one project-scoped object kind.
///
/// All calls fail with `NotFound("project")` when the owning project is absent.
#[async_trait]
pub trait ObjectCollection<R: ScopedRecord>: Send + Sync {
    /// Insert a new record; `Conflict("object")` if the key is taken.
    async fn insert(&self, record: R) -> StoreResult<R>;
    /// Insert, or merge into the existing record with the same key.
    async fn upsert(&self, record: R) -> StoreResult<R>;
    /// Merge into the existing record; `NotFound("object")` if absent.
    async fn update(&self, record: R) -> StoreResult<R>;
    async fn get(&self, key: &ObjectKey) -> StoreResult<R>;
    async fn list(&self, project: &str) -> StoreResult<Vec<R>>;
    async fn delete(&self, key: &ObjectKey) -> StoreResult<()>;
}

#[async_trait]
pub trait RegistryStore: Send + Sync {
    fn entities(&self) -> &dyn ObjectCollection<EntityRecord>;
    fn feature_views(&self) -> &dyn ObjectCollection<FeatureViewRecord>;
    fn feature_services(&self) -> &dyn ObjectCollection<FeatureServiceRecord>;

    async fn insert_project(&self, record: ProjectRecord) -> StoreResult<ProjectRecord>;
    async fn upsert_project(&self, record: ProjectRecord) -> StoreResult<ProjectRecord>;
    async fn update_project(&self, record: ProjectRecord) -> StoreResult<ProjectRecord>;
    async fn get_project(&self, project_name: &str) -> StoreResult<ProjectRecord>;
    async fn list_projects(&self) -> StoreResult<Vec<ProjectRecord>>;
    /// `NotEmpty("project")` while entities (other than the placeholder),
    /// feature views, or feature services remain. The placeholder entity is
    /// removed together with the project.
    async fn delete_project(&self, project_name: &str) -> StoreResult<()>;

    /// Insert the first admin grant; `Conflict("admin")` if any admin exists.
    async fn insert_first_admin(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord>;
    async fn insert_permission(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord>;
    async fn update_permission(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord>;
    async fn delete_permission(&self, key: &UserPermissionKey) -> StoreResult<()>;
    async fn list_permissions(&self, user_id: &str) -> StoreResult<Vec<UserPermissionRecord>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
