//! Registry HTTP API.
//!
//! # Purpose
//! Maps routes onto registry operations and registry errors onto HTTP
//! responses. Handlers stay thin: they build the request context, optionally
//! authorize the caller, and delegate.
pub mod error;
pub mod extract;
pub mod objects;
pub mod openapi;
pub mod permissions;
pub mod projects;
pub mod system;
pub mod types;

use crate::access::Operation;
use crate::api::error::{ApiError, api_error};
use crate::app::AppState;
use crate::context::RequestContext;

/// Check the caller against its grants when access enforcement is enabled.
pub(crate) async fn authorize(
    state: &AppState,
    ctx: &RequestContext,
    project_name: Option<&str>,
    operations: Operation,
) -> Result<(), ApiError> {
    authorize_with(state, ctx, project_name, operations, false).await
}

/// Like [`authorize`], but only admin grants qualify.
pub(crate) async fn authorize_admin(
    state: &AppState,
    ctx: &RequestContext,
    project_name: Option<&str>,
) -> Result<(), ApiError> {
    authorize_with(state, ctx, project_name, Operation::ALL, true).await
}

async fn authorize_with(
    state: &AppState,
    ctx: &RequestContext,
    project_name: Option<&str>,
    operations: Operation,
    require_admin: bool,
) -> Result<(), ApiError> {
    if !state.enforce_access {
        return Ok(());
    }
    state
        .registry
        .authorize(ctx, project_name, operations, require_admin)
        .await
        .map_err(|err| api_error(err, ctx))
}
