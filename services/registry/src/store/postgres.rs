//! Postgres-backed implementation of the registry store.
//!
//! # Data model
//! One table per collection (`projects`, `entities`, `feature_views`,
//! `feature_services`, `user_permissions`). Object rows carry the canonical
//! payload (`BYTEA`) and its projected columns in the same row; both are
//! always written by the same statement.
//!
//! # Consistency
//! - Every check-then-write runs inside one transaction.
//! - Object writes lock the owning project row `FOR SHARE`; project deletion
//!   locks it `FOR UPDATE`, so a delete and a concurrent insert serialize.
//! - `(project, name)` primary keys and the permission unique index turn
//!   concurrent duplicate inserts into SQLSTATE 23505, reported as `Conflict`.
//! - Foreign keys from object tables to `projects` back up the existence check
//!   (SQLSTATE 23503 is reported as a missing project).
//! - First-admin initialization serializes on a transaction-scoped advisory lock.
//!
//! # Operational notes
//! - Migrations run at connect time via `sqlx::migrate!("./migrations")`.
//! - Pool size and acquire timeout are explicit; store calls fail instead of
//!   hanging when the database is unavailable.
//! - Database URLs may contain credentials; they are never logged.
use super::{
    ADMIN, OBJECT, ObjectCollection, PERMISSION, PLACEHOLDER_ENTITY, PROJECT, RegistryStore,
    StoreError, StoreResult,
};
use crate::access::{Operation, Role};
use crate::config::PostgresConfig;
use crate::model::{
    EntityRecord, FeatureServiceRecord, FeatureViewRecord, ObjectKey, ProjectRecord,
    ScopedRecord, UserPermissionKey, UserPermissionRecord,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// Advisory lock key guarding first-admin initialization.
const ADMIN_INIT_LOCK: i64 = 0x7265_6769_7374_7279;

type PgQueryAs<'q, O> = QueryAs<'q, Postgres, O, PgArguments>;

/// Durable registry store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use registry::config::PostgresConfig;
/// use registry::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct DbProject {
    project_name: String,
    description: Option<String>,
    online_store_type: Option<String>,
    online_store_config: Option<Value>,
    offline_store_type: Option<String>,
    offline_store_config: Option<Value>,
    provider: Option<String>,
    flags: Option<String>,
    is_default: bool,
    created_time: DateTime<Utc>,
    last_updated_time: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbEntity {
    project: String,
    name: String,
    value_type: i32,
    description: String,
    join_key: String,
    labels: Value,
    payload: Vec<u8>,
    created_time: DateTime<Utc>,
    last_updated_time: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbFeatureView {
    project: String,
    name: String,
    entities: Value,
    features: Value,
    tags: Value,
    ttl_ms: i64,
    online: bool,
    batch_source: Option<Value>,
    stream_source: Option<Value>,
    materialization_intervals: Value,
    payload: Vec<u8>,
    created_time: DateTime<Utc>,
    last_updated_time: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbFeatureService {
    project: String,
    name: String,
    features: Value,
    tags: Value,
    description: String,
    payload: Vec<u8>,
    created_time: DateTime<Utc>,
    last_updated_time: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbUserPermission {
    user_id: String,
    user_name: String,
    role: String,
    project_name: Option<String>,
    permission: i32,
    created_time: DateTime<Utc>,
    last_updated_time: DateTime<Utc>,
}

/// Table mapping for one project-scoped record type.
///
/// `COLUMNS` lists the mutable projected columns in the order `bind_columns`
/// binds them. Table and column names are compile-time constants; nothing from
/// a request is ever formatted into SQL.
trait PgTable: ScopedRecord {
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn bind_columns<'q, O>(&self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O>;
    fn from_row(row: Self::Row) -> Self;
}

impl PgTable for EntityRecord {
    type Row = DbEntity;
    const TABLE: &'static str = "entities";
    const COLUMNS: &'static [&'static str] = &["value_type", "description", "join_key", "labels"];

    fn bind_columns<'q, O>(&self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query
            .bind(self.value_type)
            .bind(self.description.clone())
            .bind(self.join_key.clone())
            .bind(self.labels.clone())
    }

    fn from_row(row: DbEntity) -> Self {
        EntityRecord {
            project: row.project,
            name: row.name,
            value_type: row.value_type,
            description: row.description,
            join_key: row.join_key,
            labels: row.labels,
            payload: row.payload,
            created_time: row.created_time,
            last_updated_time: row.last_updated_time,
        }
    }
}

impl PgTable for FeatureViewRecord {
    type Row = DbFeatureView;
    const TABLE: &'static str = "feature_views";
    const COLUMNS: &'static [&'static str] = &[
        "entities",
        "features",
        "tags",
        "ttl_ms",
        "online",
        "batch_source",
        "stream_source",
        "materialization_intervals",
    ];

    fn bind_columns<'q, O>(&self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query
            .bind(self.entities.clone())
            .bind(self.features.clone())
            .bind(self.tags.clone())
            .bind(self.ttl_ms)
            .bind(self.online)
            .bind(self.batch_source.clone())
            .bind(self.stream_source.clone())
            .bind(self.materialization_intervals.clone())
    }

    fn from_row(row: DbFeatureView) -> Self {
        FeatureViewRecord {
            project: row.project,
            name: row.name,
            entities: row.entities,
            features: row.features,
            tags: row.tags,
            ttl_ms: row.ttl_ms,
            online: row.online,
            batch_source: row.batch_source,
            stream_source: row.stream_source,
            materialization_intervals: row.materialization_intervals,
            payload: row.payload,
            created_time: row.created_time,
            last_updated_time: row.last_updated_time,
        }
    }
}

impl PgTable for FeatureServiceRecord {
    type Row = DbFeatureService;
    const TABLE: &'static str = "feature_services";
    const COLUMNS: &'static [&'static str] = &["features", "tags", "description"];

    fn bind_columns<'q, O>(&self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query
            .bind(self.features.clone())
            .bind(self.tags.clone())
            .bind(self.description.clone())
    }

    fn from_row(row: DbFeatureService) -> Self {
        FeatureServiceRecord {
            project: row.project,
            name: row.name,
            features: row.features,
            tags: row.tags,
            description: row.description,
            payload: row.payload,
            created_time: row.created_time,
            last_updated_time: row.last_updated_time,
        }
    }
}

fn all_columns(columns: &[&str]) -> Vec<String> {
    let mut all = vec!["project".to_string(), "name".to_string()];
    all.extend(columns.iter().map(|column| column.to_string()));
    all.extend(
        ["payload", "created_time", "last_updated_time"]
            .iter()
            .map(|column| column.to_string()),
    );
    all
}

fn select_sql(table: &str, columns: &[&str]) -> String {
    format!("SELECT {} FROM {table}", all_columns(columns).join(", "))
}

/// Bind order: project, name, columns, payload, created_time, last_updated_time.
fn insert_sql(table: &str, columns: &[&str], merge_on_conflict: bool) -> String {
    let all = all_columns(columns);
    let placeholders: Vec<String> = (1..=all.len()).map(|i| format!("${i}")).collect();
    let mut sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        all.join(", "),
        placeholders.join(", ")
    );
    if merge_on_conflict {
        // created_time keeps its first value on merge.
        let updates: Vec<String> = columns
            .iter()
            .copied()
            .chain(["payload", "last_updated_time"])
            .map(|column| format!("{column} = EXCLUDED.{column}"))
            .collect();
        sql.push_str(&format!(
            " ON CONFLICT (project, name) DO UPDATE SET {}",
            updates.join(", ")
        ));
    }
    sql.push_str(&format!(" RETURNING {}", all.join(", ")));
    sql
}

/// Bind order: project, name, columns, payload, last_updated_time.
fn update_sql(table: &str, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .copied()
        .chain(["payload", "last_updated_time"])
        .enumerate()
        .map(|(i, column)| format!("{column} = ${}", i + 3))
        .collect();
    format!(
        "UPDATE {table} SET {} WHERE project = $1 AND name = $2 RETURNING {}",
        assignments.join(", "),
        all_columns(columns).join(", ")
    )
}

impl PostgresStore {
    /// Connect, run migrations, and return a ready store.
    ///
    /// # Errors
    /// - Connection, pool setup, or migration failures.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let store = Self::connect_without_migrations(pg).await?;
        // Handlers assume the schema exists; fail startup rather than serve a partial API.
        sqlx::migrate!("./migrations").run(&store.pool).await?;
        Ok(store)
    }

    /// Connect without touching the schema.
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let connect = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connect)
            .await
            .map_err(|_| StoreError::Unexpected(anyhow!("postgres connect timed out")))??;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn lock_project_for_share(
    tx: &mut Transaction<'_, Postgres>,
    project: &str,
) -> StoreResult<()> {
    let row: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM projects WHERE project_name = $1 FOR SHARE")
            .bind(project)
            .fetch_optional(&mut **tx)
            .await?;
    match row {
        Some(_) => Ok(()),
        None => Err(StoreError::NotFound(PROJECT.into())),
    }
}

async fn project_exists(pool: &PgPool, project: &str) -> StoreResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE project_name = $1)")
            .bind(project)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

fn write_error(err: sqlx::Error, conflict_label: &str) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::Conflict(conflict_label.into());
    }
    if is_foreign_key_violation(&err) {
        return StoreError::NotFound(PROJECT.into());
    }
    StoreError::from(err)
}

#[async_trait]
impl<R: PgTable> ObjectCollection<R> for PostgresStore {
    async fn insert(&self, record: R) -> StoreResult<R> {
        self.write_object(record, false).await
    }

    async fn upsert(&self, record: R) -> StoreResult<R> {
        self.write_object(record, true).await
    }

    async fn update(&self, record: R) -> StoreResult<R> {
        let key = record.key();
        let sql = update_sql(R::TABLE, R::COLUMNS);
        let mut tx = self.pool.begin().await?;
        lock_project_for_share(&mut tx, &key.project).await?;
        let query = sqlx::query_as::<_, R::Row>(&sql)
            .bind(key.project.clone())
            .bind(key.name.clone());
        let row = record
            .bind_columns(query)
            .bind(record.payload().to_vec())
            .bind(record.last_updated_time())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(OBJECT.into()))?;
        tx.commit().await?;
        Ok(R::from_row(row))
    }

    async fn get(&self, key: &ObjectKey) -> StoreResult<R> {
        let sql = format!(
            "{} WHERE project = $1 AND name = $2",
            select_sql(R::TABLE, R::COLUMNS)
        );
        let row = sqlx::query_as::<_, R::Row>(&sql)
            .bind(&key.project)
            .bind(&key.name)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(R::from_row(row)),
            None if project_exists(&self.pool, &key.project).await? => {
                Err(StoreError::NotFound(OBJECT.into()))
            }
            None => Err(StoreError::NotFound(PROJECT.into())),
        }
    }

    async fn list(&self, project: &str) -> StoreResult<Vec<R>> {
        if !project_exists(&self.pool, project).await? {
            return Err(StoreError::NotFound(PROJECT.into()));
        }
        let sql = format!(
            "{} WHERE project = $1 ORDER BY name",
            select_sql(R::TABLE, R::COLUMNS)
        );
        let rows = sqlx::query_as::<_, R::Row>(&sql)
            .bind(project)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(R::from_row).collect())
    }

    async fn delete(&self, key: &ObjectKey) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE project = $1 AND name = $2", R::TABLE);
        let mut tx = self.pool.begin().await?;
        lock_project_for_share(&mut tx, &key.project).await?;
        let result = sqlx::query(&sql)
            .bind(&key.project)
            .bind(&key.name)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(OBJECT.into()));
        }
        tx.commit().await?;
        Ok(())
    }
}

impl PostgresStore {
    async fn write_object<R: PgTable>(&self, record: R, merge_on_conflict: bool) -> StoreResult<R> {
        let key = record.key();
        let sql = insert_sql(R::TABLE, R::COLUMNS, merge_on_conflict);
        let mut tx = self.pool.begin().await?;
        lock_project_for_share(&mut tx, &key.project).await?;
        let query = sqlx::query_as::<_, R::Row>(&sql)
            .bind(key.project.clone())
            .bind(key.name.clone());
        let row = record
            .bind_columns(query)
            .bind(record.payload().to_vec())
            .bind(record.created_time())
            .bind(record.last_updated_time())
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| write_error(err, OBJECT))?;
        tx.commit().await?;
        Ok(R::from_row(row))
    }
}

const PROJECT_COLUMNS: &str = "project_name, description, online_store_type, online_store_config, \
    offline_store_type, offline_store_config, provider, flags, is_default, created_time, last_updated_time";

fn project_from_db(row: DbProject) -> ProjectRecord {
    ProjectRecord {
        project_name: row.project_name,
        description: row.description,
        online_store_type: row.online_store_type,
        online_store_config: row.online_store_config,
        offline_store_type: row.offline_store_type,
        offline_store_config: row.offline_store_config,
        provider: row.provider,
        flags: row.flags,
        is_default: row.is_default,
        created_time: row.created_time,
        last_updated_time: row.last_updated_time,
    }
}

const PERMISSION_COLUMNS: &str =
    "user_id, user_name, role, project_name, permission, created_time, last_updated_time";

fn permission_from_db(row: DbUserPermission) -> StoreResult<UserPermissionRecord> {
    let role = Role::parse(&row.role)
        .ok_or_else(|| StoreError::Unexpected(anyhow!("unknown role {}", row.role)))?;
    let permission = Operation::from_bits(row.permission as u32).ok_or_else(|| {
        StoreError::Unexpected(anyhow!("unknown permission bits {}", row.permission))
    })?;
    Ok(UserPermissionRecord {
        user_id: row.user_id,
        user_name: row.user_name,
        role,
        project_name: row.project_name,
        permission,
        created_time: row.created_time,
        last_updated_time: row.last_updated_time,
    })
}

async fn insert_permission_row(
    tx: &mut Transaction<'_, Postgres>,
    record: &UserPermissionRecord,
) -> StoreResult<UserPermissionRecord> {
    let sql = format!(
        "INSERT INTO user_permissions ({PERMISSION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {PERMISSION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, DbUserPermission>(&sql)
        .bind(&record.user_id)
        .bind(&record.user_name)
        .bind(record.role.as_str())
        .bind(&record.project_name)
        .bind(record.permission.bits() as i32)
        .bind(record.created_time)
        .bind(record.last_updated_time)
        .fetch_one(&mut **tx)
        .await
        .map_err(|err| write_error(err, PERMISSION))?;
    permission_from_db(row)
}

#[async_trait]
impl RegistryStore for PostgresStore {
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
        self.write_project(record, false).await
    }

    async fn upsert_project(&self, record: ProjectRecord) -> StoreResult<ProjectRecord> {
        self.write_project(record, true).await
    }

    async fn update_project(&self, record: ProjectRecord) -> StoreResult<ProjectRecord> {
        let sql = format!(
            "UPDATE projects SET description = $2, online_store_type = $3, online_store_config = $4, \
             offline_store_type = $5, offline_store_config = $6, provider = $7, flags = $8, \
             is_default = $9, last_updated_time = $10 WHERE project_name = $1 \
             RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbProject>(&sql)
            .bind(&record.project_name)
            .bind(&record.description)
            .bind(&record.online_store_type)
            .bind(&record.online_store_config)
            .bind(&record.offline_store_type)
            .bind(&record.offline_store_config)
            .bind(&record.provider)
            .bind(&record.flags)
            .bind(record.is_default)
            .bind(record.last_updated_time)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(PROJECT.into()))?;
        Ok(project_from_db(row))
    }

    async fn get_project(&self, project_name: &str) -> StoreResult<ProjectRecord> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_name = $1");
        let row = sqlx::query_as::<_, DbProject>(&sql)
            .bind(project_name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(PROJECT.into()))?;
        Ok(project_from_db(row))
    }

    async fn list_projects(&self) -> StoreResult<Vec<ProjectRecord>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY project_name");
        let rows = sqlx::query_as::<_, DbProject>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(project_from_db).collect())
    }

    async fn delete_project(&self, project_name: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let locked: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM projects WHERE project_name = $1 FOR UPDATE")
                .bind(project_name)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound(PROJECT.into()));
        }
        let owns_objects: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM entities WHERE project = $1 AND name <> $2)
                   OR EXISTS(SELECT 1 FROM feature_views WHERE project = $1)
                   OR EXISTS(SELECT 1 FROM feature_services WHERE project = $1)"#,
        )
        .bind(project_name)
        .bind(PLACEHOLDER_ENTITY)
        .fetch_one(&mut *tx)
        .await?;
        if owns_objects {
            return Err(StoreError::NotEmpty(PROJECT.into()));
        }
        sqlx::query("DELETE FROM entities WHERE project = $1 AND name = $2")
            .bind(project_name)
            .bind(PLACEHOLDER_ENTITY)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM projects WHERE project_name = $1")
            .bind(project_name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_first_admin(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ADMIN_INIT_LOCK)
            .execute(&mut *tx)
            .await?;
        let admin_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user_permissions WHERE role = $1)")
                .bind(Role::Admin.as_str())
                .fetch_one(&mut *tx)
                .await?;
        if admin_exists {
            return Err(StoreError::Conflict(ADMIN.into()));
        }
        let inserted = insert_permission_row(&mut tx, &record).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn insert_permission(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord> {
        let mut tx = self.pool.begin().await?;
        let inserted = insert_permission_row(&mut tx, &record).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn update_permission(
        &self,
        record: UserPermissionRecord,
    ) -> StoreResult<UserPermissionRecord> {
        let sql = format!(
            "UPDATE user_permissions SET user_name = $4, permission = $5, last_updated_time = $6 \
             WHERE user_id = $1 AND project_name IS NOT DISTINCT FROM $2 AND role = $3 \
             RETURNING {PERMISSION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbUserPermission>(&sql)
            .bind(&record.user_id)
            .bind(&record.project_name)
            .bind(record.role.as_str())
            .bind(&record.user_name)
            .bind(record.permission.bits() as i32)
            .bind(record.last_updated_time)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(PERMISSION.into()))?;
        permission_from_db(row)
    }

    async fn delete_permission(&self, key: &UserPermissionKey) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM user_permissions \
             WHERE user_id = $1 AND project_name IS NOT DISTINCT FROM $2 AND role = $3",
        )
        .bind(&key.user_id)
        .bind(&key.project_name)
        .bind(key.role.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(PERMISSION.into()));
        }
        Ok(())
    }

    async fn list_permissions(&self, user_id: &str) -> StoreResult<Vec<UserPermissionRecord>> {
        let sql = format!(
            "SELECT {PERMISSION_COLUMNS} FROM user_permissions WHERE user_id = $1 \
             ORDER BY project_name NULLS FIRST, role"
        );
        let rows = sqlx::query_as::<_, DbUserPermission>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(permission_from_db).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

impl PostgresStore {
    async fn write_project(
        &self,
        record: ProjectRecord,
        merge_on_conflict: bool,
    ) -> StoreResult<ProjectRecord> {
        let on_conflict = if merge_on_conflict {
            " ON CONFLICT (project_name) DO UPDATE SET description = EXCLUDED.description, \
              online_store_type = EXCLUDED.online_store_type, \
              online_store_config = EXCLUDED.online_store_config, \
              offline_store_type = EXCLUDED.offline_store_type, \
              offline_store_config = EXCLUDED.offline_store_config, \
              provider = EXCLUDED.provider, flags = EXCLUDED.flags, \
              is_default = EXCLUDED.is_default, last_updated_time = EXCLUDED.last_updated_time"
        } else {
            ""
        };
        let sql = format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11){on_conflict} \
             RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbProject>(&sql)
            .bind(&record.project_name)
            .bind(&record.description)
            .bind(&record.online_store_type)
            .bind(&record.online_store_config)
            .bind(&record.offline_store_type)
            .bind(&record.offline_store_config)
            .bind(&record.provider)
            .bind(&record.flags)
            .bind(record.is_default)
            .bind(record.created_time)
            .bind(record.last_updated_time)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| write_error(err, PROJECT))?;
        Ok(project_from_db(row))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_sqlstate(err, "23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    has_sqlstate(err, "23503")
}

fn has_sqlstate(err: &sqlx::Error, state: &str) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == state).unwrap_or(false);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_binds_every_column_once() {
        let sql = insert_sql("entities", EntityRecord::COLUMNS, false);
        assert!(sql.starts_with(
            "INSERT INTO entities (project, name, value_type, description, join_key, labels, payload, created_time, last_updated_time)"
        ));
        assert!(sql.contains("VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"));
        assert!(!sql.contains("ON CONFLICT"));
    }

    #[test]
    fn upsert_sql_never_rewrites_created_time() {
        let sql = insert_sql("feature_services", FeatureServiceRecord::COLUMNS, true);
        assert!(sql.contains("ON CONFLICT (project, name) DO UPDATE SET"));
        assert!(sql.contains("payload = EXCLUDED.payload"));
        assert!(sql.contains("last_updated_time = EXCLUDED.last_updated_time"));
        assert!(!sql.contains("created_time = EXCLUDED"));
    }

    #[test]
    fn update_sql_numbers_placeholders_after_key() {
        let sql = update_sql("feature_services", FeatureServiceRecord::COLUMNS);
        assert!(sql.contains(
            "SET features = $3, tags = $4, description = $5, payload = $6, last_updated_time = $7"
        ));
        assert!(sql.contains("WHERE project = $1 AND name = $2"));
    }

    #[test]
    fn unique_violation_detection_ignores_other_errors() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
        assert!(!is_foreign_key_violation(&err));
        assert!(matches!(write_error(err, OBJECT), StoreError::Unexpected(_)));
    }
}
