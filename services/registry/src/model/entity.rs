//! Feature entity model: canonical object and persisted record.
use super::common::{ObjectKey, ScopedRecord, Timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Primitive value types understood by the feature store.
///
/// The integer codes are the stable persisted form (`value_type` column).
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
pub enum ValueType {
    #[default]
    Invalid,
    Bytes,
    String,
    Int32,
    Int64,
    Double,
    Float,
    Bool,
    UnixTimestamp,
    BytesList,
    StringList,
    Int32List,
    Int64List,
    DoubleList,
    FloatList,
    BoolList,
    UnixTimestampList,
    Null,
}

impl ValueType {
    pub fn code(self) -> i32 {
        match self {
            ValueType::Invalid => 0,
            ValueType::Bytes => 1,
            ValueType::String => 2,
            ValueType::Int32 => 3,
            ValueType::Int64 => 4,
            ValueType::Double => 5,
            ValueType::Float => 6,
            ValueType::Bool => 7,
            ValueType::UnixTimestamp => 8,
            ValueType::BytesList => 11,
            ValueType::StringList => 12,
            ValueType::Int32List => 13,
            ValueType::Int64List => 14,
            ValueType::DoubleList => 15,
            ValueType::FloatList => 16,
            ValueType::BoolList => 17,
            ValueType::UnixTimestampList => 18,
            ValueType::Null => 19,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let value = match code {
            0 => ValueType::Invalid,
            1 => ValueType::Bytes,
            2 => ValueType::String,
            3 => ValueType::Int32,
            4 => ValueType::Int64,
            5 => ValueType::Double,
            6 => ValueType::Float,
            7 => ValueType::Bool,
            8 => ValueType::UnixTimestamp,
            11 => ValueType::BytesList,
            12 => ValueType::StringList,
            13 => ValueType::Int32List,
            14 => ValueType::Int64List,
            15 => ValueType::DoubleList,
            16 => ValueType::FloatList,
            17 => ValueType::BoolList,
            18 => ValueType::UnixTimestampList,
            19 => ValueType::Null,
            _ => return None,
        };
        Some(value)
    }
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
pub struct Entity {
    pub spec: EntitySpec,
    #[serde(default)]
    pub meta: EntityMeta,
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
pub struct EntitySpec {
    pub name: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub join_key: String,
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
pub struct EntityMeta {
    pub created_timestamp: Option<Timestamp>,
    pub last_updated_timestamp: Option<Timestamp>,
}

/// Persisted entity: canonical payload plus projected columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub project: String,
    pub name: String,
    pub value_type: i32,
    pub description: String,
    pub join_key: String,
    pub labels: Value,
    pub payload: Vec<u8>,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

impl ScopedRecord for EntityRecord {
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
        self.value_type = incoming.value_type;
        self.description = incoming.description;
        self.join_key = incoming.join_key;
        self.labels = incoming.labels;
        self.payload = incoming.payload;
        self.last_updated_time = incoming.last_updated_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_codes_are_stable() {
        for code in (0..=8).chain(11..=19) {
            let value = ValueType::from_code(code).expect("known code");
            assert_eq!(value.code(), code);
        }
        assert!(ValueType::from_code(9).is_none());
        assert!(ValueType::from_code(42).is_none());
    }

    #[test]
    fn value_type_uses_wire_names() {
        let json = serde_json::to_value(ValueType::UnixTimestampList).expect("json");
        assert_eq!(json, serde_json::json!("UNIX_TIMESTAMP_LIST"));
    }
}
