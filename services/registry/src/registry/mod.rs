//! Registry operations.
//!
//! # Purpose
//! The create/update/delete/get/list logic for projects, the project-scoped
//! object kinds, and user permissions, plus access decisions.
//!
//! # Key invariants
//! - Objects are only written into existing projects.
//! - `(project, name)` is unique per object kind; strict creates report a
//!   conflict, applies merge.
//! - `created_time` is set once; `last_updated_time` moves on every mutation.
//! - Payload and projected columns are produced together by the mapper and
//!   written together by the store.
//!
//! Atomicity is delegated to the store: every mutation is a single store call.
use crate::context::Clock;
use crate::store::RegistryStore;
use std::sync::Arc;

pub mod error;
mod objects;
mod permissions;
mod projects;

pub use error::{ErrorCode, INTERNAL_SERVER_ERROR, RegistryError, RegistryResult};

/// Entry point for every registry operation.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn RegistryStore>,
    clock: Arc<dyn Clock>,
}

impl Registry {
    pub fn new(store: Arc<dyn RegistryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        &self.store
    }
}

/// Count one operation outcome.
fn observe<T>(kind: &'static str, op: &'static str, result: &RegistryResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.outcome(),
    };
    metrics::counter!(
        "registry_operations_total",
        "kind" => kind,
        "op" => op,
        "outcome" => outcome
    )
    .increment(1);
}
