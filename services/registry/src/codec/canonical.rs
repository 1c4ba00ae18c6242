//! Canonical binary codec for feature-store objects.
//!
//! Objects are archived with `rkyv`; decoding validates the archive before
//! deserializing, so arbitrary bytes fail with
//! [`CodecError::MalformedPayload`] instead of being trusted. In JSON bodies
//! the bytes travel as standard base64.
use super::{CodecError, CodecResult};
use crate::model::{Entity, FeatureService, FeatureView};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rkyv::api::high::{HighSerializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::de::Pool;
use rkyv::rancor::Strategy;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

macro_rules! canonical_objects {
    ($($name:ident),+ $(,)?) => {
        $(
            impl CanonicalObject for $name {}
        )+
    };
}

/// Round-trip law: `decode(&x.encode()?)? == x` for every implementor.
pub trait CanonicalObject:
    Sized
    + for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, rkyv::rancor::Error>>
    + Archive<
        Archived: for<'a> CheckBytes<HighValidator<'a, rkyv::rancor::Error>>
                      + Deserialize<Self, Strategy<Pool, rkyv::rancor::Error>>,
    >
{
    fn encode(&self) -> CodecResult<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|err| CodecError::Encode(err.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        // Archives must be read from aligned memory; callers hand us plain slices.
        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|err| CodecError::MalformedPayload(err.to_string()))
    }
}

canonical_objects!(Entity, FeatureView, FeatureService);

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(value: &str) -> CodecResult<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .map_err(|err| CodecError::MalformedPayload(format!("invalid base64: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DataSource, DataSourceType, Duration, EntityMeta, EntitySpec, FeatureServiceSpec,
        FeatureSpec, FeatureViewMeta, FeatureViewProjection, FeatureViewSpec,
        MaterializationInterval, Timestamp, ValueType,
    };
    use std::collections::BTreeMap;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample_entity() -> Entity {
        Entity {
            spec: EntitySpec {
                name: "driver".to_string(),
                project: "p1".to_string(),
                value_type: ValueType::Int64,
                description: "driver id".to_string(),
                join_key: "driver_id".to_string(),
                labels: labels(&[("owner", "ml")]),
            },
            meta: EntityMeta {
                created_timestamp: Some(Timestamp {
                    seconds: 1_700_000_000,
                    nanos: 5,
                }),
                last_updated_timestamp: None,
            },
        }
    }

    fn sample_feature_view() -> FeatureView {
        FeatureView {
            spec: FeatureViewSpec {
                name: "driver_stats".to_string(),
                project: "p1".to_string(),
                entities: vec!["driver".to_string()],
                features: vec![FeatureSpec {
                    name: "conv_rate".to_string(),
                    value_type: ValueType::Float,
                    labels: BTreeMap::new(),
                }],
                tags: labels(&[("team", "rides")]),
                ttl: Some(Duration::from_millis(86_400_000)),
                online: true,
                batch_source: Some(DataSource {
                    source_type: DataSourceType::BatchFile,
                    name: "driver_hourly".to_string(),
                    timestamp_field: "event_timestamp".to_string(),
                    options: labels(&[("path", "data/driver.parquet")]),
                    ..DataSource::default()
                }),
                stream_source: None,
            },
            meta: FeatureViewMeta {
                created_timestamp: None,
                last_updated_timestamp: None,
                materialization_intervals: vec![MaterializationInterval {
                    start_time: Some(Timestamp {
                        seconds: 10,
                        nanos: 0,
                    }),
                    end_time: Some(Timestamp {
                        seconds: 20,
                        nanos: 0,
                    }),
                }],
            },
        }
    }

    #[test]
    fn entity_round_trips() {
        let entity = sample_entity();
        let bytes = entity.encode().expect("encode");
        assert_eq!(Entity::decode(&bytes).expect("decode"), entity);
    }

    #[test]
    fn feature_view_round_trips_nested_sources() {
        let view = sample_feature_view();
        let bytes = view.encode().expect("encode");
        assert_eq!(FeatureView::decode(&bytes).expect("decode"), view);
    }

    #[test]
    fn feature_service_round_trips() {
        let service = FeatureService {
            spec: FeatureServiceSpec {
                name: "driver_activity".to_string(),
                project: "p1".to_string(),
                features: vec![FeatureViewProjection {
                    feature_view_name: "driver_stats".to_string(),
                    feature_columns: vec!["conv_rate".to_string()],
                }],
                tags: BTreeMap::new(),
                description: "serving".to_string(),
            },
            ..FeatureService::default()
        };
        let bytes = service.encode().expect("encode");
        assert_eq!(FeatureService::decode(&bytes).expect("decode"), service);
    }

    #[test]
    fn decode_survives_unaligned_input() {
        let bytes = sample_entity().encode().expect("encode");
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&bytes);
        assert_eq!(
            Entity::decode(&shifted[1..]).expect("decode"),
            sample_entity()
        );
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = Entity::decode(&[0xde, 0xad, 0xbe, 0xef, 0x01]).expect_err("garbage");
        assert!(matches!(err, CodecError::MalformedPayload(_)));
        let err = FeatureView::decode(&[]).expect_err("empty");
        assert!(matches!(err, CodecError::MalformedPayload(_)));
    }

    #[test]
    fn base64_transport() {
        let bytes = sample_entity().encode().expect("encode");
        let text = encode_base64(&bytes);
        assert_eq!(decode_base64(&text).expect("decode"), bytes);
        assert!(matches!(
            decode_base64("not base64!!"),
            Err(CodecError::MalformedPayload(_))
        ));
    }
}
