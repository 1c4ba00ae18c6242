//! Project mapping. Store settings pass through the store-config codec in both
//! directions, so only registered store types are ever persisted.
use super::{MapperResult, backfill};
use crate::codec::StoreConfig;
use crate::model::{ProjectRecord, ProjectRequest, ProjectResponse};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decoded store setting: `(discriminator, canonical JSON)`.
type StoreColumns = (Option<String>, Option<Value>);

fn store_columns(config: Option<&Value>) -> MapperResult<StoreColumns> {
    match config {
        None | Some(Value::Null) => Ok((None, None)),
        Some(json) => {
            let config = StoreConfig::decode(json)?;
            Ok((
                Some(config.discriminator().to_string()),
                Some(config.encode()?),
            ))
        }
    }
}

fn reencode(config: Option<&Value>) -> MapperResult<Option<Value>> {
    match config {
        None => Ok(None),
        Some(json) => Ok(Some(StoreConfig::decode(json)?.encode()?)),
    }
}

/// Build a project record named by the path; both timestamps are `now`.
pub fn to_record(
    project_name: &str,
    request: ProjectRequest,
    now: DateTime<Utc>,
) -> MapperResult<ProjectRecord> {
    let mut name = request.project_name.unwrap_or_default();
    backfill("projectName", &mut name, project_name)?;
    let (online_store_type, online_store_config) = store_columns(request.online_store.as_ref())?;
    let (offline_store_type, offline_store_config) =
        store_columns(request.offline_store.as_ref())?;
    Ok(ProjectRecord {
        project_name: name,
        description: request.description,
        online_store_type,
        online_store_config,
        offline_store_type,
        offline_store_config,
        provider: request.provider,
        flags: request.flags,
        is_default: request.is_default,
        created_time: now,
        last_updated_time: now,
    })
}

pub fn to_response(record: ProjectRecord) -> MapperResult<ProjectResponse> {
    Ok(ProjectResponse {
        online_store: reencode(record.online_store_config.as_ref())?,
        offline_store: reencode(record.offline_store_config.as_ref())?,
        project_name: record.project_name,
        description: record.description,
        provider: record.provider,
        flags: record.flags,
        is_default: record.is_default,
        created_time: record.created_time,
        last_updated_time: record.last_updated_time,
    })
}
