use super::{MapperResult, ObjectMapper, column};
use crate::model::{Entity, EntityRecord, ObjectKind};
use crate::store::{ObjectCollection, RegistryStore};
use chrono::{DateTime, Utc};

pub struct EntityMapper;

impl ObjectMapper for EntityMapper {
    type Object = Entity;
    type Record = EntityRecord;

    const KIND: ObjectKind = ObjectKind::Entity;

    fn identity_mut(object: &mut Entity) -> (&mut String, &mut String) {
        (&mut object.spec.project, &mut object.spec.name)
    }

    fn project(
        object: &Entity,
        payload: Vec<u8>,
        created_time: DateTime<Utc>,
        last_updated_time: DateTime<Utc>,
    ) -> MapperResult<EntityRecord> {
        let spec = &object.spec;
        Ok(EntityRecord {
            project: spec.project.clone(),
            name: spec.name.clone(),
            value_type: spec.value_type.code(),
            description: spec.description.clone(),
            join_key: spec.join_key.clone(),
            labels: column(&spec.labels)?,
            payload,
            created_time,
            last_updated_time,
        })
    }

    fn collection(store: &dyn RegistryStore) -> &dyn ObjectCollection<EntityRecord> {
        store.entities()
    }
}
