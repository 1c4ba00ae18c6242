//! Shared model primitives: keys, object kinds, and wire time values.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Key of a project-scoped object: unique per object kind.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub project: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
        }
    }
}

/// Project-scoped object kinds managed by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Entity,
    FeatureView,
    FeatureService,
}

impl ObjectKind {
    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Entity => "entity",
            ObjectKind::FeatureView => "feature view",
            ObjectKind::FeatureService => "feature service",
        }
    }

    /// Stable label used for metrics and log fields.
    pub fn metric_label(self) -> &'static str {
        match self {
            ObjectKind::Entity => "entity",
            ObjectKind::FeatureView => "feature_view",
            ObjectKind::FeatureService => "feature_service",
        }
    }
}

/// A persisted record for a project-scoped object.
///
/// Every record carries the canonical payload next to its projected columns.
/// `merge` is the only way an existing record absorbs a newer version: it
/// replaces every mutable projected column and the payload together, keeps the
/// key and `created_time`, and takes the incoming `last_updated_time`.
pub trait ScopedRecord: Clone + Send + Sync + 'static {
    fn key(&self) -> ObjectKey;
    fn payload(&self) -> &[u8];
    fn created_time(&self) -> DateTime<Utc>;
    fn last_updated_time(&self) -> DateTime<Utc>;
    fn merge(&mut self, incoming: Self);
}

/// Point in time on the wire: seconds and nanoseconds since the Unix epoch.
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
pub struct Timestamp {
    pub seconds: i64,
    #[serde(default)]
    pub nanos: i32,
}

impl Timestamp {
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self {
            seconds: value.timestamp(),
            nanos: value.timestamp_subsec_nanos() as i32,
        }
    }

    /// Returns `None` when the value is outside the representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if self.nanos < 0 {
            return None;
        }
        DateTime::from_timestamp(self.seconds, self.nanos as u32)
    }
}

/// Signed span of time on the wire, used for feature view TTLs.
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
pub struct Duration {
    pub seconds: i64,
    #[serde(default)]
    pub nanos: i32,
}

impl Duration {
    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1_000),
            nanos: (millis.rem_euclid(1_000) * 1_000_000) as i32,
        }
    }

    pub fn as_millis(self) -> i64 {
        self.seconds
            .saturating_mul(1_000)
            .saturating_add(i64::from(self.nanos) / 1_000_000)
    }
}
