//! User permission operations and access decisions.
use super::{Registry, RegistryError, RegistryResult, observe};
use crate::access::{CanAccessQuery, CanAccessResult, Operation, Role, resolve_access};
use crate::context::RequestContext;
use crate::mapper::permission as mapper;
use crate::model::{
    UserPermissionListResponse, UserPermissionRecord, UserPermissionRequest,
    UserPermissionResponse,
};
use tracing::instrument;

const KIND: &str = "user_permission";

impl Registry {
    /// Grant the caller a global admin role, once.
    ///
    /// # Errors
    /// - `Conflict` (`RbacAlreadyInitialized`) when any admin grant exists.
    /// - `MissingParameter` when the caller has no user id.
    #[instrument(
        name = "registry.rbac.initialize",
        skip_all,
        fields(trace_id = %ctx.trace_id, user_id = %ctx.user_id)
    )]
    pub async fn init_rbac(&self, ctx: &RequestContext) -> RegistryResult<UserPermissionResponse> {
        let result = async {
            if ctx.user_id.is_empty() {
                return Err(RegistryError::MissingParameter("userId".to_string()));
            }
            let now = self.clock.now();
            let record = UserPermissionRecord {
                user_id: ctx.user_id.clone(),
                user_name: ctx.user_name.clone(),
                role: Role::Admin,
                project_name: None,
                permission: Operation::ALL,
                created_time: now,
                last_updated_time: now,
            };
            let key = record.key();
            let stored = self
                .store
                .insert_first_admin(record)
                .await
                .map_err(|err| RegistryError::from_permission_store(&key, err))?;
            tracing::info!("rbac initialized");
            Ok::<_, RegistryError>(mapper::to_response(stored))
        }
        .await;
        observe(KIND, "initialize", &result);
        result
    }

    #[instrument(
        name = "registry.permission.add",
        skip_all,
        fields(trace_id = %ctx.trace_id, user_id = %ctx.user_id, target = %request.user_id)
    )]
    pub async fn add_permission(
        &self,
        ctx: &RequestContext,
        request: UserPermissionRequest,
    ) -> RegistryResult<UserPermissionResponse> {
        let result = async {
            let record = mapper::to_record(request, self.clock.now())?;
            let key = record.key();
            let stored = self
                .store
                .insert_permission(record)
                .await
                .map_err(|err| RegistryError::from_permission_store(&key, err))?;
            Ok::<_, RegistryError>(mapper::to_response(stored))
        }
        .await;
        observe(KIND, "create", &result);
        result
    }

    /// Replace the user name and operation mask of an existing grant.
    #[instrument(
        name = "registry.permission.update",
        skip_all,
        fields(trace_id = %ctx.trace_id, user_id = %ctx.user_id, target = %request.user_id)
    )]
    pub async fn update_permission(
        &self,
        ctx: &RequestContext,
        request: UserPermissionRequest,
    ) -> RegistryResult<UserPermissionResponse> {
        let result = async {
            let record = mapper::to_record(request, self.clock.now())?;
            let key = record.key();
            let stored = self
                .store
                .update_permission(record)
                .await
                .map_err(|err| RegistryError::from_permission_store(&key, err))?;
            Ok::<_, RegistryError>(mapper::to_response(stored))
        }
        .await;
        observe(KIND, "update", &result);
        result
    }

    #[instrument(
        name = "registry.permission.remove",
        skip_all,
        fields(trace_id = %ctx.trace_id, user_id = %ctx.user_id, target = %request.user_id)
    )]
    pub async fn remove_permission(
        &self,
        ctx: &RequestContext,
        request: &UserPermissionRequest,
    ) -> RegistryResult<()> {
        let result = async {
            let key = mapper::to_key(request)?;
            self.store
                .delete_permission(&key)
                .await
                .map_err(|err| RegistryError::from_permission_store(&key, err))?;
            Ok::<_, RegistryError>(())
        }
        .await;
        observe(KIND, "delete", &result);
        result
    }

    /// Every grant held by `user_id`, global grants first.
    pub async fn list_permissions(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> RegistryResult<UserPermissionListResponse> {
        tracing::debug!(trace_id = %ctx.trace_id, target = user_id, "list user permissions");
        let result = self
            .store
            .list_permissions(user_id)
            .await
            .map(|records| UserPermissionListResponse {
                items: records.into_iter().map(mapper::to_response).collect(),
            })
            .map_err(RegistryError::from);
        observe(KIND, "list", &result);
        result
    }

    /// Decide whether `query.user_id` may perform `query.operations`.
    pub async fn can_access(
        &self,
        ctx: &RequestContext,
        query: &CanAccessQuery,
    ) -> RegistryResult<CanAccessResult> {
        let grants = self
            .store
            .list_permissions(&query.user_id)
            .await
            .map_err(RegistryError::from)?;
        let decision = resolve_access(query, &grants);
        tracing::debug!(
            trace_id = %ctx.trace_id,
            target = %query.user_id,
            project = query.project_name.as_deref().unwrap_or("*"),
            operations = query.operations.bits(),
            allowed = decision.allowed,
            "access decision"
        );
        Ok(decision)
    }

    /// Fail with `Forbidden` unless the caller may perform `operations`.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        project_name: Option<&str>,
        operations: Operation,
        require_admin: bool,
    ) -> RegistryResult<()> {
        let query = CanAccessQuery {
            user_id: ctx.user_id.clone(),
            project_name: project_name.map(str::to_string),
            operations,
            require_admin,
        };
        let decision = self.can_access(ctx, &query).await?;
        if decision.allowed {
            Ok(())
        } else {
            tracing::warn!(
                trace_id = %ctx.trace_id,
                user_id = %ctx.user_id,
                project = project_name.unwrap_or("*"),
                "access denied"
            );
            Err(RegistryError::forbidden(&ctx.user_id))
        }
    }
}

