//! Registry configuration sourced from environment variables, optionally
//! overridden by a YAML file named in `REGISTRY_CONFIG`.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend `{other}` (expected memory or postgres)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub enforce_access: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    postgres: Option<PostgresConfigOverride>,
    enforce_access: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PostgresConfigOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    connect_timeout_ms: Option<u64>,
    acquire_timeout_ms: Option<u64>,
}

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("parse {key}")),
        Err(_) => Ok(None),
    }
}

impl RegistryConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("REGISTRY_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse REGISTRY_BIND")?;
        let metrics_bind = std::env::var("REGISTRY_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse REGISTRY_METRICS_BIND")?;
        let storage = match std::env::var("REGISTRY_STORAGE") {
            Ok(value) => StorageBackend::parse(&value).with_context(|| "parse REGISTRY_STORAGE")?,
            Err(_) => StorageBackend::Memory,
        };
        let postgres = match std::env::var("REGISTRY_DATABASE_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse("REGISTRY_PG_MAX_CONNECTIONS")?
                    .unwrap_or(DEFAULT_MAX_CONNECTIONS),
                connect_timeout_ms: env_parse("REGISTRY_PG_CONNECT_TIMEOUT_MS")?
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
                acquire_timeout_ms: env_parse("REGISTRY_PG_ACQUIRE_TIMEOUT_MS")?
                    .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_MS),
            }),
            Err(_) => None,
        };
        let enforce_access = env_parse("REGISTRY_ENFORCE_ACCESS")?.unwrap_or(false);
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            enforce_access,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("REGISTRY_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read REGISTRY_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    /// Apply the values present in a YAML override document.
    pub fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: RegistryConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse registry config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = StorageBackend::parse(&value)?;
        }
        if let Some(value) = override_cfg.enforce_access {
            self.enforce_access = value;
        }
        if let Some(pg) = override_cfg.postgres {
            let current = self.postgres.take();
            let url = match (pg.url, current.as_ref()) {
                (Some(url), _) => url,
                (None, Some(current)) => current.url.clone(),
                (None, None) => bail!("postgres override requires a url"),
            };
            self.postgres = Some(PostgresConfig {
                url,
                max_connections: pg
                    .max_connections
                    .or(current.as_ref().map(|c| c.max_connections))
                    .unwrap_or(DEFAULT_MAX_CONNECTIONS),
                connect_timeout_ms: pg
                    .connect_timeout_ms
                    .or(current.as_ref().map(|c| c.connect_timeout_ms))
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
                acquire_timeout_ms: pg
                    .acquire_timeout_ms
                    .or(current.as_ref().map(|c| c.acquire_timeout_ms))
                    .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_MS),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    fn clear_env() -> Vec<EnvGuard> {
        [
            "REGISTRY_BIND",
            "REGISTRY_METRICS_BIND",
            "REGISTRY_STORAGE",
            "REGISTRY_DATABASE_URL",
            "REGISTRY_PG_MAX_CONNECTIONS",
            "REGISTRY_PG_CONNECT_TIMEOUT_MS",
            "REGISTRY_PG_ACQUIRE_TIMEOUT_MS",
            "REGISTRY_ENFORCE_ACCESS",
            "REGISTRY_CONFIG",
        ]
        .into_iter()
        .map(EnvGuard::unset)
        .collect()
    }

    #[test]
    #[serial]
    fn defaults_use_memory_backend() {
        let _guards = clear_env();
        let config = RegistryConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.postgres.is_none());
        assert!(!config.enforce_access);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    #[serial]
    fn env_selects_postgres() {
        let _guards = clear_env();
        let _storage = EnvGuard::set("REGISTRY_STORAGE", "postgres");
        let _url = EnvGuard::set("REGISTRY_DATABASE_URL", "postgres://localhost/registry");
        let _max = EnvGuard::set("REGISTRY_PG_MAX_CONNECTIONS", "4");
        let config = RegistryConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.max_connections, 4);
        assert_eq!(pg.acquire_timeout_ms, DEFAULT_ACQUIRE_TIMEOUT_MS);
    }

    #[test]
    #[serial]
    fn invalid_values_are_reported() {
        let _guards = clear_env();
        let _storage = EnvGuard::set("REGISTRY_STORAGE", "sqlite");
        let err = RegistryConfig::from_env().unwrap_err();
        assert!(format!("{err:#}").contains("REGISTRY_STORAGE"));
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() {
        let _guards = clear_env();
        let mut config = RegistryConfig::from_env().expect("config");
        config
            .apply_yaml(
                r#"
bind_addr: "127.0.0.1:9000"
storage: postgres
enforce_access: true
postgres:
  url: postgres://db/registry
  max_connections: 2
"#,
            )
            .expect("yaml");
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert!(config.enforce_access);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.url, "postgres://db/registry");
        assert_eq!(pg.max_connections, 2);
        assert_eq!(pg.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
    }
}
