use super::{MapperResult, ObjectMapper, column};
use crate::model::{FeatureService, FeatureServiceRecord, ObjectKind};
use crate::store::{ObjectCollection, RegistryStore};
use chrono::{DateTime, Utc};

pub struct FeatureServiceMapper;

impl ObjectMapper for FeatureServiceMapper {
    type Object = FeatureService;
    type Record = FeatureServiceRecord;

    const KIND: ObjectKind = ObjectKind::FeatureService;

    fn identity_mut(object: &mut FeatureService) -> (&mut String, &mut String) {
        (&mut object.spec.project, &mut object.spec.name)
    }

    fn project(
        object: &FeatureService,
        payload: Vec<u8>,
        created_time: DateTime<Utc>,
        last_updated_time: DateTime<Utc>,
    ) -> MapperResult<FeatureServiceRecord> {
        let spec = &object.spec;
        Ok(FeatureServiceRecord {
            project: spec.project.clone(),
            name: spec.name.clone(),
            features: column(&spec.features)?,
            tags: column(&spec.tags)?,
            description: spec.description.clone(),
            payload,
            created_time,
            last_updated_time,
        })
    }

    fn collection(store: &dyn RegistryStore) -> &dyn ObjectCollection<FeatureServiceRecord> {
        store.feature_services()
    }
}
