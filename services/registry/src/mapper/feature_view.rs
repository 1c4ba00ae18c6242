use super::{MapperResult, ObjectMapper, column};
use crate::model::{FeatureView, FeatureViewRecord, ObjectKind};
use crate::store::{ObjectCollection, RegistryStore};
use chrono::{DateTime, Utc};

pub struct FeatureViewMapper;

impl ObjectMapper for FeatureViewMapper {
    type Object = FeatureView;
    type Record = FeatureViewRecord;

    const KIND: ObjectKind = ObjectKind::FeatureView;

    fn identity_mut(object: &mut FeatureView) -> (&mut String, &mut String) {
        (&mut object.spec.project, &mut object.spec.name)
    }

    fn project(
        object: &FeatureView,
        payload: Vec<u8>,
        created_time: DateTime<Utc>,
        last_updated_time: DateTime<Utc>,
    ) -> MapperResult<FeatureViewRecord> {
        let spec = &object.spec;
        Ok(FeatureViewRecord {
            project: spec.project.clone(),
            name: spec.name.clone(),
            entities: column(&spec.entities)?,
            features: column(&spec.features)?,
            tags: column(&spec.tags)?,
            // No TTL is stored as zero, which readers treat as "never expires".
            ttl_ms: spec.ttl.map(|ttl| ttl.as_millis()).unwrap_or(0),
            online: spec.online,
            batch_source: spec.batch_source.as_ref().map(column).transpose()?,
            stream_source: spec.stream_source.as_ref().map(column).transpose()?,
            materialization_intervals: column(&object.meta.materialization_intervals)?,
            payload,
            created_time,
            last_updated_time,
        })
    }

    fn collection(store: &dyn RegistryStore) -> &dyn ObjectCollection<FeatureViewRecord> {
        store.feature_views()
    }
}
