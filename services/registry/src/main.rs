//! Registry HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, and the HTTP router, then serves the API and
//! the metrics endpoint until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use registry::app::{AppState, build_router};
use registry::config::{self, RegistryConfig};
use registry::context::SystemClock;
use registry::observability;
use registry::registry::Registry;
use registry::store::{RegistryStore, memory::InMemoryStore, postgres::PostgresStore};
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RegistryConfig::from_env_or_yaml().context("registry config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: RegistryConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("registry")?;
    let state = build_state(config.clone()).await?;
    let backend = state.registry.store().backend_name();
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, backend, enforce_access = config.enforce_access, "registry listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: RegistryConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn RegistryStore> = match config.storage {
        config::StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        config::StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(
                PostgresStore::connect(pg)
                    .await
                    .context("connect postgres store")?,
            )
        }
    };

    Ok(AppState {
        registry: Registry::new(store, Arc::new(SystemClock)),
        enforce_access: config.enforce_access,
    })
}
