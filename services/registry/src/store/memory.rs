//! In-memory implementation of the registry store.
//!
//! # Purpose
//! Keeps every collection in process memory. It backs local development and
//! the test suite, and serves deployments that do not need durability.
//!
//! # Consistency
//! - **Not durable**: all state is lost on restart.
//! - All collections live behind one `tokio::sync::RwLock`. Each mutation takes
//!   the write guard once and performs its checks and its write under it, so a
//!   project delete and a concurrent object insert can never interleave.
//! - Independent instances do not share state.
use super::{
    ADMIN, OBJECT, ObjectCollection, PERMISSION, PLACEHOLDER_ENTITY, PROJECT, RegistryStore,
    StoreError, StoreResult,
};
use crate::access::Role;
use crate::model::{
    EntityRecord, FeatureServiceRecord, FeatureViewRecord, ObjectKey, ProjectRecord,
    ScopedRecord, UserPermissionKey, UserPermissionRecord,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct RegistryState {
    projects: HashMap<String, ProjectRecord>,
    entities: HashMap<ObjectKey, EntityRecord>,
    feature_views: HashMap<ObjectKey, FeatureViewRecord>,
    feature_services: HashMap<ObjectKey, FeatureServiceRecord>,
    permissions: HashMap<UserPermissionKey, UserPermissionRecord>,
}

impl RegistryState {
    fn ensure_project(&self, project: &str) -> StoreResult<()> {
        if self.projects.contains_key(project) {
            Ok(())
        } else {
            Err(StoreError::NotFound(PROJECT.into()))
        }
    }

    fn owns_objects(&self, project: &str) -> bool {
        self.entities
            .keys()
            .any(|key| key.project == project && key.name != PLACEHOLDER_ENTITY)
            || self.feature_views.keys().any(|key| key.project == project)
            || self.feature_services.keys().any(|key| key.project == project)
    }
}

/// Selects the map holding one record type.
trait MemoryTable: ScopedRecord {
    fn table(state: &RegistryState) -> &HashMap<ObjectKey, Self>;
    fn table_mut(state: &mut RegistryState) -> &mut HashMap<ObjectKey, Self>;
}

impl MemoryTable for EntityRecord {
    fn table(state: &RegistryState) -> &HashMap<ObjectKey, Self> {
        &state.entities
    }

    fn table_mut(state: &mut RegistryState) -> &mut HashMap<ObjectKey, Self> {
        &mut state.entities
    }
}

impl MemoryTable for FeatureViewRecord {
    fn table(state: &RegistryState) -> &HashMap<ObjectKey, Self> {
        &state.feature_views
    }

    fn table_mut(state: &mut RegistryState) -> &mut HashMap<ObjectKey, Self> {
        &mut state.feature_views
    }
}

impl MemoryTable for FeatureServiceRecord {
    fn table(state: &RegistryState) -> &HashMap<ObjectKey, Self> {
        &state.feature_services
    }

    fn table_mut(state: &mut RegistryState) -> &mut HashMap<ObjectKey, Self> {
        &mut state.feature_services
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<RegistryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<R: MemoryTable> ObjectCollection<R> for InMemoryStore {
    async fn insert(&self, record: R) -> StoreResult<R> {
        let mut state = self.state.write().await;
        let key = record.key();
        state.ensure_project(&key.project)?;
        let table = R::table_mut(&mut state);
        if table.contains_key(&key) {
            return Err(StoreError::Conflict(OBJECT.into()));
        }
        table.insert(key, record.clone());
        Ok(record)
    }

    async fn upsert(&self, record: R) -> StoreResult<R> {
        let mut state = self.state.write().await;
        let key = record.key();
        state.ensure_project(&key.project)?;
        let table = R::table_mut(&mut state);
        let stored = match table.get_mut(&key) {
            Some(existing) => {
                existing.merge(record);
                existing.clone()
            }
            None => {
                table.insert(key, record.clone());
                record
            }
        };
        Ok(stored)
    }

    async fn update(&self, record: R) -> StoreResult<R> {
        let mut state = self.state.write().await;
        let key = record.key();
        state.ensure_project(&key.project)?;
        let existing = R::table_mut(&mut state)
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(OBJECT.into()))?;
        existing.merge(record);
        Ok(existing.clone())
    }

    async fn get(&self, key: &ObjectKey) -> StoreResult<R> {
        let state = self.state.read().await;
        state.ensure_project(&key.project)?;
        R::table(&state)
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(OBJECT.into()))
    }

    async fn list(&self, project: &str) -> StoreResult<Vec<R>> {
        let state = self.state.read().await;
        state.ensure_project(project)?;
        let mut items: Vec<R> = R::table(&state)
            .values()
            .filter(|record| record.key().project == project)
            .cloned()
            .collect();
        items.sort_by_key(|record| record.key().name);
        Ok(items)
    }

    async fn delete(&self, key: &ObjectKey) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.ensure_project(&key.project)?;
        R::table_mut(&mut state)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(OBJECT.into()))
    }
}

#[async_trait]
impl RegistryStore for InMemoryStore {
    fn entities(&self) -> &dyn ObjectCollection<EntityRecord> {
        self
    }

    fn feature_views(&self) -> &dyn ObjectCollection<FeatureViewRecord> {
        self
    }

    fn feature_services(&self) -> &dyn ObjectCollection<FeatureServiceRecord> {
        self
    }

    async fn insert_project(&self, record: ProjectRecord) -> StoreResult<ProjectRecord> {
        let mut state = self.state.write().await;
        if state.projects.contains_key(&record.project_name) {
            return Err(StoreError::Conflict(PROJECT.into()));
        }
        state
            .projects
            .insert(record.project_name.clone(), record.clone());
        Ok(record)
    }

    async fn upsert_project(&self, record: ProjectRecord) -> StoreResult<ProjectRecord> {
        let mut state = self.state.write().await;
        let stored = match state.projects.get_mut(&record.project_name) {
            Some(existing) => {
                existing.merge(record);
                existing.clone()
            }
            None => {
                state
                    .projects
                    .insert(record.project_name.clone(), record.clone());
                record
            }
        };
        Ok(stored)
    }

    async fn update_project(&self, record: ProjectRecord) -> StoreResult<ProjectRecord> {
        let mut state = self.state.write().await;
        let existing = state
            .projects
            .get_mut(&record.project_name)
            .ok_or_else(|| StoreError::NotFound(PROJECT.into()))?;
        existing.merge(record);
        Ok(existing.clone())
    }

    async fn get_project(&self, project_name: &str) -> StoreResult<ProjectRecord> {
        self.state
            .read()
            .await
            .projects
            .get(project_name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(PROJECT.into()))
    }

    async fn list_projects(&self) -> StoreResult<Vec<ProjectRecord>> {
        let state = self.state.read().await;
        let mut items: Vec<ProjectRecord> = state.projects.values().cloned().collect();
        items.sort_by(|a, b| a.project_name.cmp(&b.project_name));
        Ok(items)
    }

    async fn delete_project(&self, project_name: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.ensure_project(project_name)?;
        if state.owns_objects(project_name) {
            return Err(StoreError::NotEmpty(PROJECT.into()));
        }
        state
            .entities
            .remove(&ObjectKey::new(project_name, PLACEHOLDER_ENTITY));
        state.projects.remove(project_name);
        Ok(())
    }

    async fn insert_first_admin(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord> {
        let mut state = self.state.write().await;
        if state
            .permissions
            .values()
            .any(|grant| grant.role == Role::Admin)
        {
            return Err(StoreError::Conflict(ADMIN.into()));
        }
        state.permissions.insert(record.key(), record.clone());
        Ok(record)
    }

    async fn insert_permission(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord> {
        let mut state = self.state.write().await;
        let key = record.key();
        if state.permissions.contains_key(&key) {
            return Err(StoreError::Conflict(PERMISSION.into()));
        }
        state.permissions.insert(key, record.clone());
        Ok(record)
    }

    async fn update_permission(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord> {
        let mut state = self.state.write().await;
        let existing = state
            .permissions
            .get_mut(&record.key())
            .ok_or_else(|| StoreError::NotFound(PERMISSION.into()))?;
        existing.merge(record);
        Ok(existing.clone())
    }

    async fn delete_permission(&self, key: &UserPermissionKey) -> StoreResult<()> {
        self.state
            .write()
            .await
            .permissions
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(PERMISSION.into()))
    }

    async fn list_permissions(&self, user_id: &str) -> StoreResult<Vec<UserPermissionRecord>> {
        let state = self.state.read().await;
        let mut items: Vec<UserPermissionRecord> = state
            .permissions
            .values()
            .filter(|grant| grant.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.project_name
                .cmp(&b.project_name)
                .then_with(|| a.role.as_str().cmp(b.role.as_str()))
        });
        Ok(items)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Operation;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).expect("time")
    }

    fn project(name: &str) -> ProjectRecord {
        ProjectRecord {
            project_name: name.to_string(),
            description: None,
            online_store_type: None,
            online_store_config: None,
            offline_store_type: None,
            offline_store_config: None,
            provider: None,
            flags: None,
            is_default: false,
            created_time: at(1),
            last_updated_time: at(1),
        }
    }

    fn entity(project: &str, name: &str, description: &str, time: i64) -> EntityRecord {
        EntityRecord {
            project: project.to_string(),
            name: name.to_string(),
            value_type: 2,
            description: description.to_string(),
            join_key: name.to_string(),
            labels: json!({}),
            payload: description.as_bytes().to_vec(),
            created_time: at(time),
            last_updated_time: at(time),
        }
    }

    fn grant(user: &str, project: Option<&str>, role: Role) -> UserPermissionRecord {
        UserPermissionRecord {
            user_id: user.to_string(),
            user_name: user.to_uppercase(),
            role,
            project_name: project.map(str::to_string),
            permission: Operation::READ,
            created_time: at(1),
            last_updated_time: at(1),
        }
    }

    #[tokio::test]
    async fn object_insert_requires_project_and_unique_key() {
        let store = InMemoryStore::new();
        let err = store
            .entities()
            .insert(entity("p1", "e1", "a", 1))
            .await
            .expect_err("no project");
        assert!(matches!(err, StoreError::NotFound(label) if label == PROJECT));

        store.insert_project(project("p1")).await.expect("project");
        store
            .entities()
            .insert(entity("p1", "e1", "a", 1))
            .await
            .expect("insert");
        let err = store
            .entities()
            .insert(entity("p1", "e1", "b", 2))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::Conflict(label) if label == OBJECT));
        assert_eq!(store.entities().list("p1").await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn upsert_merges_and_keeps_created_time() {
        let store = InMemoryStore::new();
        store.insert_project(project("p1")).await.expect("project");
        store
            .entities()
            .upsert(entity("p1", "e1", "first", 10))
            .await
            .expect("create");
        let merged = store
            .entities()
            .upsert(entity("p1", "e1", "second", 20))
            .await
            .expect("merge");
        assert_eq!(merged.description, "second");
        assert_eq!(merged.payload, b"second".to_vec());
        assert_eq!(merged.created_time, at(10));
        assert_eq!(merged.last_updated_time, at(20));
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_object() {
        let store = InMemoryStore::new();
        store.insert_project(project("p1")).await.expect("project");
        let err = store
            .entities()
            .update(entity("p1", "e1", "a", 1))
            .await
            .expect_err("missing");
        assert!(matches!(err, StoreError::NotFound(label) if label == OBJECT));
        let err = store
            .entities()
            .delete(&ObjectKey::new("p1", "e1"))
            .await
            .expect_err("missing");
        assert!(matches!(err, StoreError::NotFound(label) if label == OBJECT));
    }

    #[tokio::test]
    async fn project_delete_ignores_placeholder_entity() {
        let store = InMemoryStore::new();
        store.insert_project(project("p1")).await.expect("project");
        store
            .entities()
            .insert(entity("p1", PLACEHOLDER_ENTITY, "", 1))
            .await
            .expect("placeholder");
        store
            .entities()
            .insert(entity("p1", "driver", "", 1))
            .await
            .expect("entity");

        let err = store.delete_project("p1").await.expect_err("not empty");
        assert!(matches!(err, StoreError::NotEmpty(_)));

        store
            .entities()
            .delete(&ObjectKey::new("p1", "driver"))
            .await
            .expect("delete entity");
        store.delete_project("p1").await.expect("delete project");
        assert!(store.list_projects().await.expect("list").is_empty());

        store.insert_project(project("p1")).await.expect("recreate");
        assert!(store.entities().list("p1").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn first_admin_only_once() {
        let store = InMemoryStore::new();
        store
            .insert_first_admin(grant("u1", None, Role::Admin))
            .await
            .expect("first admin");
        let err = store
            .insert_first_admin(grant("u2", None, Role::Admin))
            .await
            .expect_err("second admin");
        assert!(matches!(err, StoreError::Conflict(label) if label == ADMIN));
    }

    #[tokio::test]
    async fn permission_key_includes_scope_and_role() {
        let store = InMemoryStore::new();
        store
            .insert_permission(grant("u1", None, Role::Reader))
            .await
            .expect("global");
        store
            .insert_permission(grant("u1", Some("p1"), Role::Reader))
            .await
            .expect("scoped");
        let err = store
            .insert_permission(grant("u1", Some("p1"), Role::Reader))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::Conflict(label) if label == PERMISSION));
        assert_eq!(store.list_permissions("u1").await.expect("list").len(), 2);
        assert!(store.list_permissions("u2").await.expect("list").is_empty());
    }
}
