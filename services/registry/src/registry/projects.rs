//! Project operations.
use super::{Registry, RegistryError, RegistryResult, observe};
use crate::context::RequestContext;
use crate::mapper::project as mapper;
use crate::model::{ProjectListResponse, ProjectRequest, ProjectResponse};
use tracing::instrument;

const KIND: &str = "project";

impl Registry {
    #[instrument(
        name = "registry.project.create",
        skip_all,
        fields(project = %project_name, trace_id = %ctx.trace_id, user_id = %ctx.user_id)
    )]
    pub async fn create_project(
        &self,
        ctx: &RequestContext,
        project_name: &str,
        request: ProjectRequest,
    ) -> RegistryResult<ProjectResponse> {
        let result = async {
            let record = mapper::to_record(project_name, request, self.clock.now())?;
            let stored = self
                .store
                .insert_project(record)
                .await
                .map_err(|err| RegistryError::from_project_store(project_name, err))?;
            tracing::info!("project created");
            Ok::<_, RegistryError>(mapper::to_response(stored)?)
        }
        .await;
        observe(KIND, "create", &result);
        result
    }

    #[instrument(
        name = "registry.project.update",
        skip_all,
        fields(project = %project_name, trace_id = %ctx.trace_id, user_id = %ctx.user_id)
    )]
    pub async fn update_project(
        &self,
        ctx: &RequestContext,
        project_name: &str,
        request: ProjectRequest,
    ) -> RegistryResult<ProjectResponse> {
        let result = async {
            let record = mapper::to_record(project_name, request, self.clock.now())?;
            let stored = self
                .store
                .update_project(record)
                .await
                .map_err(|err| RegistryError::from_project_store(project_name, err))?;
            Ok::<_, RegistryError>(mapper::to_response(stored)?)
        }
        .await;
        observe(KIND, "update", &result);
        result
    }

    /// Create the project, or merge into the existing one.
    #[instrument(
        name = "registry.project.apply",
        skip_all,
        fields(project = %project_name, trace_id = %ctx.trace_id, user_id = %ctx.user_id)
    )]
    pub async fn apply_project(
        &self,
        ctx: &RequestContext,
        project_name: &str,
        request: ProjectRequest,
    ) -> RegistryResult<ProjectResponse> {
        let result = async {
            let record = mapper::to_record(project_name, request, self.clock.now())?;
            let stored = self
                .store
                .upsert_project(record)
                .await
                .map_err(|err| RegistryError::from_project_store(project_name, err))?;
            Ok::<_, RegistryError>(mapper::to_response(stored)?)
        }
        .await;
        observe(KIND, "apply", &result);
        result
    }

    /// Delete an empty project. The `__dummy` placeholder entity does not
    /// count as content and is removed with it.
    #[instrument(
        name = "registry.project.delete",
        skip_all,
        fields(project = %project_name, trace_id = %ctx.trace_id, user_id = %ctx.user_id)
    )]
    pub async fn delete_project(
        &self,
        ctx: &RequestContext,
        project_name: &str,
    ) -> RegistryResult<()> {
        let result = self
            .store
            .delete_project(project_name)
            .await
            .map_err(|err| RegistryError::from_project_store(project_name, err));
        if result.is_ok() {
            tracing::info!("project deleted");
        }
        observe(KIND, "delete", &result);
        result
    }

    pub async fn get_project(
        &self,
        ctx: &RequestContext,
        project_name: &str,
    ) -> RegistryResult<ProjectResponse> {
        tracing::debug!(project = project_name, trace_id = %ctx.trace_id, "get project");
        let result = async {
            let stored = self
                .store
                .get_project(project_name)
                .await
                .map_err(|err| RegistryError::from_project_store(project_name, err))?;
            Ok::<_, RegistryError>(mapper::to_response(stored)?)
        }
        .await;
        observe(KIND, "get", &result);
        result
    }

    pub async fn list_projects(&self, ctx: &RequestContext) -> RegistryResult<ProjectListResponse> {
        tracing::debug!(trace_id = %ctx.trace_id, "list projects");
        let result = async {
            let records = self.store.list_projects().await?;
            let items = records
                .into_iter()
                .map(mapper::to_response)
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, RegistryError>(ProjectListResponse { items })
        }
        .await;
        observe(KIND, "list", &result);
        result
    }
}
