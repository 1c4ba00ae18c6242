//! Operations shared by every project-scoped object kind.
//!
//! Each operation is generic over an [`ObjectMapper`]; the kind is a type
//! parameter, never a branch.
use super::{Registry, RegistryError, RegistryResult, observe};
use crate::context::RequestContext;
use crate::mapper::{self, ObjectMapper};
use crate::model::{ObjectKey, ObjectListResponse, ObjectRequest, ObjectResponse};
use crate::store::StoreError;
use tracing::instrument;

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Upsert,
    Insert,
    Update,
}

impl Registry {
    /// Create the object, or merge into the existing one with the same key.
    #[instrument(
        name = "registry.object.apply",
        skip_all,
        fields(
            kind = M::KIND.metric_label(),
            project = %key.project,
            name = %key.name,
            trace_id = %ctx.trace_id,
            user_id = %ctx.user_id
        )
    )]
    pub async fn create_or_update<M: ObjectMapper>(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
        request: ObjectRequest<M::Object>,
    ) -> RegistryResult<ObjectResponse<M::Object>> {
        let result = self.write::<M>(key, request, WriteMode::Upsert).await;
        observe(M::KIND.metric_label(), "apply", &result);
        result
    }

    /// Create the object; `Conflict` if the key is taken.
    #[instrument(
        name = "registry.object.create",
        skip_all,
        fields(
            kind = M::KIND.metric_label(),
            project = %key.project,
            name = %key.name,
            trace_id = %ctx.trace_id,
            user_id = %ctx.user_id
        )
    )]
    pub async fn create<M: ObjectMapper>(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
        request: ObjectRequest<M::Object>,
    ) -> RegistryResult<ObjectResponse<M::Object>> {
        let result = self.write::<M>(key, request, WriteMode::Insert).await;
        if result.is_ok() {
            tracing::info!("object created");
        }
        observe(M::KIND.metric_label(), "create", &result);
        result
    }

    /// Merge into the existing object; `NotFound` if it is absent.
    #[instrument(
        name = "registry.object.update",
        skip_all,
        fields(
            kind = M::KIND.metric_label(),
            project = %key.project,
            name = %key.name,
            trace_id = %ctx.trace_id,
            user_id = %ctx.user_id
        )
    )]
    pub async fn update<M: ObjectMapper>(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
        request: ObjectRequest<M::Object>,
    ) -> RegistryResult<ObjectResponse<M::Object>> {
        let result = self.write::<M>(key, request, WriteMode::Update).await;
        observe(M::KIND.metric_label(), "update", &result);
        result
    }

    #[instrument(
        name = "registry.object.delete",
        skip_all,
        fields(
            kind = M::KIND.metric_label(),
            project = %key.project,
            name = %key.name,
            trace_id = %ctx.trace_id,
            user_id = %ctx.user_id
        )
    )]
    pub async fn delete<M: ObjectMapper>(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
    ) -> RegistryResult<()> {
        let result = M::collection(self.store.as_ref())
            .delete(key)
            .await
            .map_err(|err| object_error::<M>(key, err));
        if result.is_ok() {
            tracing::info!("object deleted");
        }
        observe(M::KIND.metric_label(), "delete", &result);
        result
    }

    pub async fn get<M: ObjectMapper>(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
    ) -> RegistryResult<ObjectResponse<M::Object>> {
        tracing::debug!(
            kind = M::KIND.metric_label(),
            project = %key.project,
            name = %key.name,
            trace_id = %ctx.trace_id,
            "get object"
        );
        let result = self.fetch::<M>(key).await;
        observe(M::KIND.metric_label(), "get", &result);
        result
    }

    /// All objects of kind `M` in `project`, ordered by name.
    pub async fn list<M: ObjectMapper>(
        &self,
        ctx: &RequestContext,
        project: &str,
    ) -> RegistryResult<ObjectListResponse<M::Object>> {
        tracing::debug!(
            kind = M::KIND.metric_label(),
            project,
            trace_id = %ctx.trace_id,
            "list objects"
        );
        let result = self.fetch_all::<M>(project).await;
        observe(M::KIND.metric_label(), "list", &result);
        result
    }

    async fn write<M: ObjectMapper>(
        &self,
        key: &ObjectKey,
        request: ObjectRequest<M::Object>,
        mode: WriteMode,
    ) -> RegistryResult<ObjectResponse<M::Object>> {
        let record = mapper::to_record::<M>(key, request, self.clock.now())?;
        let collection = M::collection(self.store.as_ref());
        let stored = match mode {
            WriteMode::Upsert => collection.upsert(record).await,
            WriteMode::Insert => collection.insert(record).await,
            WriteMode::Update => collection.update(record).await,
        }
        .map_err(|err| object_error::<M>(key, err))?;
        Ok(mapper::to_response::<M>(&stored)?)
    }

    async fn fetch<M: ObjectMapper>(
        &self,
        key: &ObjectKey,
    ) -> RegistryResult<ObjectResponse<M::Object>> {
        let stored = M::collection(self.store.as_ref())
            .get(key)
            .await
            .map_err(|err| object_error::<M>(key, err))?;
        Ok(mapper::to_response::<M>(&stored)?)
    }

    async fn fetch_all<M: ObjectMapper>(
        &self,
        project: &str,
    ) -> RegistryResult<ObjectListResponse<M::Object>> {
        let records = M::collection(self.store.as_ref())
            .list(project)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => RegistryError::project_not_found(project),
                other => RegistryError::from(other),
            })?;
        let items = records
            .iter()
            .map(mapper::to_response::<M>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ObjectListResponse { items })
    }
}

fn object_error<M: ObjectMapper>(key: &ObjectKey, err: StoreError) -> RegistryError {
    RegistryError::from_object_store(M::KIND, key, err)
}
