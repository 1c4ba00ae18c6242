//! Projection mapper: keeps canonical payloads and projected columns in step.
//!
//! # Purpose
//! Turns request envelopes into persistable records and persisted records back
//! into response envelopes. Every record produced here carries the canonical
//! bytes and the columns derived from the very same structured object, so the
//! two representations can never drift apart.
//!
//! # Precedence rules
//! - A request must carry `data`, `proto`, or both. With both, `proto` is
//!   decoded and must equal `data`.
//! - The URL path fills an empty `project`/`name` in the object. A non-empty
//!   value that differs from the path is rejected.
//! - The canonical bytes are always re-encoded from the final object.
//! - Responses are rebuilt from the stored bytes only; projected columns are
//!   never echoed back.
//! - Merging an incoming record into an existing one is [`ScopedRecord::merge`];
//!   stores apply it inside the same atomic unit as the existence check.
use crate::codec::{CanonicalObject, CodecError, decode_base64, encode_base64};
use crate::model::{ObjectKey, ObjectKind, ObjectRequest, ObjectResponse, ScopedRecord};
use crate::store::{ObjectCollection, RegistryStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub mod entity;
pub mod feature_service;
pub mod feature_view;
pub mod permission;
pub mod project;

pub use entity::EntityMapper;
pub use feature_service::FeatureServiceMapper;
pub use feature_view::FeatureViewMapper;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("value of {0} in the URL does not match the request body")]
    ValueMismatch(&'static str),
    #[error("missing required parameter {0}")]
    MissingParameter(&'static str),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type MapperResult<T> = Result<T, MapperError>;

/// Mapping between one canonical object kind and its persisted record.
///
/// Implementors are zero-sized markers; registry operations are generic over
/// them, so every kind goes through identical create/update/delete logic.
pub trait ObjectMapper: Send + Sync + 'static {
    type Object: CanonicalObject
        + Serialize
        + DeserializeOwned
        + Clone
        + PartialEq
        + Send
        + Sync
        + 'static;
    type Record: ScopedRecord;

    const KIND: ObjectKind;

    /// Mutable `(project, name)` identity fields of the object.
    fn identity_mut(object: &mut Self::Object) -> (&mut String, &mut String);

    /// Derive the projected columns from `object` and pair them with `payload`.
    fn project(
        object: &Self::Object,
        payload: Vec<u8>,
        created_time: DateTime<Utc>,
        last_updated_time: DateTime<Utc>,
    ) -> MapperResult<Self::Record>;

    fn collection(store: &dyn RegistryStore) -> &dyn ObjectCollection<Self::Record>;
}

/// Settle the object a request describes and its canonical bytes.
pub fn resolve_request<M: ObjectMapper>(
    key: &ObjectKey,
    request: ObjectRequest<M::Object>,
) -> MapperResult<(M::Object, Vec<u8>)> {
    let mut object = match (request.data, request.proto) {
        (None, None) => return Err(MapperError::MissingParameter("data")),
        (Some(data), None) => data,
        (None, Some(proto)) => M::Object::decode(&decode_base64(&proto)?)?,
        (Some(data), Some(proto)) => {
            let decoded = M::Object::decode(&decode_base64(&proto)?)?;
            if decoded != data {
                return Err(CodecError::MalformedPayload(
                    "`data` and `proto` describe different objects".to_string(),
                )
                .into());
            }
            data
        }
    };
    let (project, name) = M::identity_mut(&mut object);
    backfill("project", project, &key.project)?;
    backfill("name", name, &key.name)?;
    let payload = object.encode()?;
    Ok((object, payload))
}

/// Build a fresh record for `request`; both timestamps are `now`.
pub fn to_record<M: ObjectMapper>(
    key: &ObjectKey,
    request: ObjectRequest<M::Object>,
    now: DateTime<Utc>,
) -> MapperResult<M::Record> {
    let (object, payload) = resolve_request::<M>(key, request)?;
    M::project(&object, payload, now, now)
}

/// Rebuild the response envelope from the stored canonical bytes.
pub fn to_response<M: ObjectMapper>(record: &M::Record) -> MapperResult<ObjectResponse<M::Object>> {
    let payload = record.payload();
    Ok(ObjectResponse {
        data: M::Object::decode(payload)?,
        proto: encode_base64(payload),
    })
}

/// Fill `field` from the path when empty; reject a differing non-empty value.
pub(crate) fn backfill(label: &'static str, field: &mut String, path: &str) -> MapperResult<()> {
    if field.is_empty() {
        *field = path.to_string();
        return Ok(());
    }
    if field != path {
        return Err(MapperError::ValueMismatch(label));
    }
    Ok(())
}

pub(crate) fn column<T: Serialize>(value: &T) -> MapperResult<Value> {
    serde_json::to_value(value).map_err(|err| CodecError::Encode(err.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, EntityRecord, EntitySpec, ValueType};

    fn entity(project: &str, name: &str) -> Entity {
        Entity {
            spec: EntitySpec {
                name: name.to_string(),
                project: project.to_string(),
                value_type: ValueType::Int64,
                description: "driver".to_string(),
                join_key: "driver_id".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("time")
    }

    #[test]
    fn path_fills_empty_identity_and_payload_follows() {
        let key = ObjectKey::new("p1", "driver");
        let record: EntityRecord =
            to_record::<EntityMapper>(&key, ObjectRequest::from_data(entity("", "")), now())
                .expect("record");
        assert_eq!(record.project, "p1");
        assert_eq!(record.name, "driver");
        let stored = Entity::decode(&record.payload).expect("decode");
        assert_eq!(stored.spec.project, "p1");
        assert_eq!(stored.spec.name, "driver");
    }

    #[test]
    fn differing_identity_is_rejected() {
        let key = ObjectKey::new("p1", "driver");
        let err = to_record::<EntityMapper>(&key, ObjectRequest::from_data(entity("p2", "")), now())
            .unwrap_err();
        assert!(matches!(err, MapperError::ValueMismatch("project")));
    }

    #[test]
    fn empty_request_is_missing_parameter() {
        let key = ObjectKey::new("p1", "driver");
        let request = ObjectRequest::<Entity> {
            data: None,
            proto: None,
        };
        let err = to_record::<EntityMapper>(&key, request, now()).unwrap_err();
        assert!(matches!(err, MapperError::MissingParameter("data")));
    }

    #[test]
    fn proto_only_request_is_decoded() {
        let key = ObjectKey::new("p1", "driver");
        let bytes = entity("p1", "driver").encode().expect("encode");
        let record = to_record::<EntityMapper>(
            &key,
            ObjectRequest::from_proto(encode_base64(&bytes)),
            now(),
        )
        .expect("record");
        assert_eq!(record.join_key, "driver_id");
        assert_eq!(record.value_type, ValueType::Int64.code());
    }

    #[test]
    fn mismatched_data_and_proto_are_rejected() {
        let key = ObjectKey::new("p1", "driver");
        let bytes = entity("p1", "driver").encode().expect("encode");
        let mut other = entity("p1", "driver");
        other.spec.description = "something else".to_string();
        let request = ObjectRequest {
            data: Some(other),
            proto: Some(encode_base64(&bytes)),
        };
        let err = to_record::<EntityMapper>(&key, request, now()).unwrap_err();
        assert!(matches!(
            err,
            MapperError::Codec(CodecError::MalformedPayload(_))
        ));
    }

    #[test]
    fn response_is_rebuilt_from_payload() {
        let key = ObjectKey::new("p1", "driver");
        let mut record =
            to_record::<EntityMapper>(&key, ObjectRequest::from_data(entity("p1", "driver")), now())
                .expect("record");
        // Projected columns are write-side only.
        record.description = "stale column".to_string();
        let response = to_response::<EntityMapper>(&record).expect("response");
        assert_eq!(response.data.spec.description, "driver");
        assert_eq!(decode_base64(&response.proto).expect("base64"), record.payload);
    }

    #[test]
    fn merge_keeps_identity_and_created_time() {
        let key = ObjectKey::new("p1", "driver");
        let first =
            to_record::<EntityMapper>(&key, ObjectRequest::from_data(entity("p1", "driver")), now())
                .expect("record");
        let mut changed = entity("p1", "driver");
        changed.spec.description = "updated".to_string();
        let later = now() + chrono::Duration::seconds(30);
        let second =
            to_record::<EntityMapper>(&key, ObjectRequest::from_data(changed), later).expect("record");
        let mut merged = first.clone();
        merged.merge(second.clone());
        assert_eq!(merged.created_time, first.created_time);
        assert_eq!(merged.last_updated_time, later);
        assert_eq!(merged.description, "updated");
        assert_eq!(merged.payload, second.payload);
    }
}
