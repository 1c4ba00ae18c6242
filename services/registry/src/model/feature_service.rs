//! Feature service model: canonical object and persisted record.
use super::common::{ObjectKey, ScopedRecord, Timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(
    Debug,
    Serialize,
    Deserialize,
    ToSchema,
    Clone,
    Default,
    PartialEq,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct FeatureService {
    pub spec: FeatureServiceSpec,
    #[serde(default)]
    pub meta: FeatureServiceMeta,
}

#[derive(
    Debug,
    Serialize,
    Deserialize,
    ToSchema,
    Clone,
    Default,
    PartialEq,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct FeatureServiceSpec {
    pub name: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub features: Vec<FeatureViewProjection>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub description: String,
}

#[derive(
    Debug,
    Serialize,
    Deserialize,
    ToSchema,
    Clone,
    Default,
    PartialEq,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct FeatureServiceMeta {
    pub created_timestamp: Option<Timestamp>,
    pub last_updated_timestamp: Option<Timestamp>,
}

/// Selection of columns from one feature view served by a feature service.
#[derive(
    Debug,
    Serialize,
    Deserialize,
    ToSchema,
    Clone,
    Default,
    PartialEq,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct FeatureViewProjection {
    pub feature_view_name: String,
    #[serde(default)]
    pub feature_columns: Vec<String>,
}

/// Persisted feature service: canonical payload plus projected columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureServiceRecord {
    pub project: String,
    pub name: String,
    pub features: Value,
    pub tags: Value,
    pub description: String,
    pub payload: Vec<u8>,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

impl ScopedRecord for FeatureServiceRecord {
    fn key(&self) -> ObjectKey {
        ObjectKey::new(&self.project, &self.name)
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn created_time(&self) -> DateTime<Utc> {
        self.created_time
    }

    fn last_updated_time(&self) -> DateTime<Utc> {
        self.last_updated_time
    }

    fn merge(&mut self, incoming: Self) {
        self.features = incoming.features;
        self.tags = incoming.tags;
        self.description = incoming.description;
        self.payload = incoming.payload;
        self.last_updated_time = incoming.last_updated_time;
    }
}
