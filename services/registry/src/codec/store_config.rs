//! Store-configuration codec for project online/offline stores.
//!
//! A configuration is a JSON object whose concrete shape is chosen by its
//! `type` field. Supported shapes are listed once in [`STORE_KINDS`]; adding a
//! store type means adding a variant and one table row.
use super::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DISCRIMINATOR_FIELD: &str = "type";
pub const REDIS_ONLINE_STORE: &str = "redis";
pub const MSSQL_OFFLINE_STORE: &str = "feast_azure_provider.mssqlserver.MsSqlServerOfflineStore";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RedisOnlineStore {
    #[serde(default)]
    pub redis_type: Option<String>,
    pub connection_string: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MsSqlServerOfflineStore {
    pub connection_string: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Redis(RedisOnlineStore),
    MsSqlServer(MsSqlServerOfflineStore),
}

struct StoreKind {
    discriminator: &'static str,
    decode: fn(Value) -> CodecResult<StoreConfig>,
}

static STORE_KINDS: &[StoreKind] = &[
    StoreKind {
        discriminator: REDIS_ONLINE_STORE,
        decode: |json| fields(json).map(StoreConfig::Redis),
    },
    StoreKind {
        discriminator: MSSQL_OFFLINE_STORE,
        decode: |json| fields(json).map(StoreConfig::MsSqlServer),
    },
];

fn fields<T: DeserializeOwned>(json: Value) -> CodecResult<T> {
    serde_json::from_value(json).map_err(|err| CodecError::MalformedPayload(err.to_string()))
}

impl StoreConfig {
    pub fn discriminator(&self) -> &'static str {
        match self {
            StoreConfig::Redis(_) => REDIS_ONLINE_STORE,
            StoreConfig::MsSqlServer(_) => MSSQL_OFFLINE_STORE,
        }
    }

    pub fn decode(json: &Value) -> CodecResult<Self> {
        let object = json.as_object().ok_or_else(|| {
            CodecError::MalformedPayload("store configuration must be a JSON object".to_string())
        })?;
        let tag = match object.get(DISCRIMINATOR_FIELD) {
            None | Some(Value::Null) => return Err(CodecError::MissingDiscriminator),
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => {
                return Err(CodecError::MalformedPayload(format!(
                    "store configuration `type` must be a string, got {other}"
                )));
            }
        };
        let kind = STORE_KINDS
            .iter()
            .find(|kind| kind.discriminator == tag)
            .ok_or_else(|| CodecError::UnknownDiscriminator(tag.to_string()))?;
        let mut body = object.clone();
        body.remove(DISCRIMINATOR_FIELD);
        (kind.decode)(Value::Object(body))
    }

    /// Encode to JSON; the result always carries the discriminator.
    pub fn encode(&self) -> CodecResult<Value> {
        let body = match self {
            StoreConfig::Redis(config) => serde_json::to_value(config),
            StoreConfig::MsSqlServer(config) => serde_json::to_value(config),
        }
        .map_err(|err| CodecError::Encode(err.to_string()))?;
        let mut object = match body {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        object.insert(
            DISCRIMINATOR_FIELD.to_string(),
            Value::String(self.discriminator().to_string()),
        );
        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redis_config_decodes_to_redis_variant() {
        let config = StoreConfig::decode(&json!({
            "type": "redis",
            "redis_type": "redis_cluster",
            "connection_string": "cache:6379,ssl=true"
        }))
        .expect("decode");
        assert_eq!(
            config,
            StoreConfig::Redis(RedisOnlineStore {
                redis_type: Some("redis_cluster".to_string()),
                connection_string: "cache:6379,ssl=true".to_string(),
            })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = StoreConfig::decode(&json!({"type": "unknown", "connection_string": "x"}))
            .expect_err("unknown");
        assert!(matches!(err, CodecError::UnknownDiscriminator(tag) if tag == "unknown"));
    }

    #[test]
    fn missing_type_is_rejected() {
        let err = StoreConfig::decode(&json!({"connection_string": "x"})).expect_err("missing");
        assert!(matches!(err, CodecError::MissingDiscriminator));
        let err = StoreConfig::decode(&json!({"type": null})).expect_err("null");
        assert!(matches!(err, CodecError::MissingDiscriminator));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let err = StoreConfig::decode(&json!({"type": "redis"})).expect_err("no connection");
        assert!(matches!(err, CodecError::MalformedPayload(_)));
        let err = StoreConfig::decode(&json!("redis")).expect_err("not an object");
        assert!(matches!(err, CodecError::MalformedPayload(_)));
    }

    #[test]
    fn encode_carries_discriminator() {
        let config = StoreConfig::MsSqlServer(MsSqlServerOfflineStore {
            connection_string: "Server=sql;Database=feast".to_string(),
        });
        let json = config.encode().expect("encode");
        assert_eq!(json["type"], MSSQL_OFFLINE_STORE);
        assert_eq!(StoreConfig::decode(&json).expect("decode"), config);
    }
}
