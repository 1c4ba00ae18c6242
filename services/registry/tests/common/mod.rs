#![allow(dead_code)]

use chrono::{DateTime, Utc};
use registry::context::ManualClock;
use registry::model::{Entity, EntitySpec, ValueType};
use registry::registry::Registry;
use registry::store::memory::InMemoryStore;
use std::sync::Arc;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("time")
}

/// Registry over a fresh in-memory store, with a clock the test can move.
pub fn memory_registry() -> (Registry, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let registry = Registry::new(Arc::new(InMemoryStore::new()), clock.clone());
    (registry, clock)
}

pub fn entity(name: &str, description: &str) -> Entity {
    Entity {
        spec: EntitySpec {
            name: name.to_string(),
            value_type: ValueType::Int64,
            description: description.to_string(),
            join_key: format!("{name}_id"),
            ..Default::default()
        },
        ..Default::default()
    }
}
