//! Feature view model: canonical object, data sources, and persisted record.
use super::common::{Duration, ObjectKey, ScopedRecord, Timestamp};
use super::entity::ValueType;
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
pub struct FeatureView {
    pub spec: FeatureViewSpec,
    #[serde(default)]
    pub meta: FeatureViewMeta,
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
pub struct FeatureViewSpec {
    pub name: String,
    #[serde(default)]
    pub project: String,
    /// Names of the entities this view is keyed on.
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub ttl: Option<Duration>,
    #[serde(default)]
    pub online: bool,
    pub batch_source: Option<DataSource>,
    pub stream_source: Option<DataSource>,
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
pub struct FeatureViewMeta {
    pub created_timestamp: Option<Timestamp>,
    pub last_updated_timestamp: Option<Timestamp>,
    #[serde(default)]
    pub materialization_intervals: Vec<MaterializationInterval>,
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
pub struct FeatureSpec {
    pub name: String,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
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
pub struct MaterializationInterval {
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

/// Origin of the rows backing a feature view.
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
pub struct DataSource {
    #[serde(rename = "type", default)]
    pub source_type: DataSourceType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub timestamp_field: String,
    #[serde(default)]
    pub created_timestamp_column: String,
    #[serde(default)]
    pub date_partition_column: String,
    #[serde(default)]
    pub data_source_class_type: String,
    /// Source-specific options (file path, table, topic, ...).
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(
    Debug,
    Serialize,
    Deserialize,
    ToSchema,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceType {
    #[default]
    Invalid,
    BatchFile,
    BatchBigquery,
    StreamKafka,
    StreamKinesis,
    BatchRedshift,
    CustomSource,
    BatchSnowflake,
    RequestSource,
}

impl DataSourceType {
    pub fn code(self) -> i32 {
        match self {
            DataSourceType::Invalid => 0,
            DataSourceType::BatchFile => 1,
            DataSourceType::BatchBigquery => 2,
            DataSourceType::StreamKafka => 3,
            DataSourceType::StreamKinesis => 4,
            DataSourceType::BatchRedshift => 5,
            DataSourceType::CustomSource => 6,
            DataSourceType::BatchSnowflake => 7,
            DataSourceType::RequestSource => 8,
        }
    }
}

/// Persisted feature view: canonical payload plus projected columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureViewRecord {
    pub project: String,
    pub name: String,
    pub entities: Value,
    pub features: Value,
    pub tags: Value,
    pub ttl_ms: i64,
    pub online: bool,
    pub batch_source: Option<Value>,
    pub stream_source: Option<Value>,
    pub materialization_intervals: Value,
    pub payload: Vec<u8>,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

impl ScopedRecord for FeatureViewRecord {
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
        self.entities = incoming.entities;
        self.features = incoming.features;
        self.tags = incoming.tags;
        self.ttl_ms = incoming.ttl_ms;
        self.online = incoming.online;
        self.batch_source = incoming.batch_source;
        self.stream_source = incoming.stream_source;
        self.materialization_intervals = incoming.materialization_intervals;
        self.payload = incoming.payload;
        self.last_updated_time = incoming.last_updated_time;
    }
}
