//! Access model: roles, operation bitmasks, and access decisions.
//!
//! # Purpose
//! Describes who may do what on which project. A grant is a
//! `(user, project-or-global, role)` tuple carrying an [`Operation`] mask.
//!
//! # Resolution
//! [`resolve_access`] decides a [`CanAccessQuery`] against a user's grants:
//! 1. A global `Admin` grant allows everything.
//! 2. An `Admin` grant on the target project allows everything on it.
//! 3. Otherwise the query is allowed when a single grant on the target project
//!    or a single global grant carries every required bit. Masks of different
//!    grants are never combined. Project grants are checked first, so when both
//!    scopes qualify the reported role and project come from the project grant.
//!
//! A query with `require_admin` is only satisfied by steps 1 and 2. A denial
//! reports no role, project or operations.
use crate::model::UserPermissionRecord;
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Contributor,
    Reader,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Contributor => "contributor",
            Role::Reader => "reader",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "contributor" => Some(Role::Contributor),
            "reader" => Some(Role::Reader),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Registry operations a grant may allow. Serialized as its integer mask.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Operation: u32 {
        const CREATE = 1;
        const UPDATE = 2;
        const READ = 4;
        const DELETE = 8;
        const LIST = 16;
        const ALL = Self::CREATE.bits()
            | Self::UPDATE.bits()
            | Self::READ.bits()
            | Self::DELETE.bits()
            | Self::LIST.bits();
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Operation::from_bits(bits)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown operation bits in {bits}")))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CanAccessQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "projectName", default)]
    pub project_name: Option<String>,
    #[schema(value_type = u32)]
    pub operations: Operation,
    #[serde(rename = "requireAdminPermission", default)]
    pub require_admin: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct CanAccessResult {
    #[serde(rename = "canAccess")]
    pub allowed: bool,
    pub role: Option<Role>,
    #[serde(rename = "projectName")]
    pub matched_project: Option<String>,
    #[schema(value_type = u32)]
    pub operations: Operation,
}

impl CanAccessResult {
    fn denied() -> Self {
        Self {
            allowed: false,
            role: None,
            matched_project: None,
            operations: Operation::empty(),
        }
    }
}

/// Decide `query` against `grants`, which must all belong to `query.user_id`.
pub fn resolve_access(query: &CanAccessQuery, grants: &[UserPermissionRecord]) -> CanAccessResult {
    if grants
        .iter()
        .any(|grant| grant.role == Role::Admin && grant.project_name.is_none())
    {
        return CanAccessResult {
            allowed: true,
            role: Some(Role::Admin),
            matched_project: None,
            operations: Operation::ALL,
        };
    }

    let target = query.project_name.as_deref();
    let scoped: Vec<&UserPermissionRecord> = match target {
        Some(project) => grants
            .iter()
            .filter(|grant| grant.project_name.as_deref() == Some(project))
            .collect(),
        None => Vec::new(),
    };

    if scoped.iter().any(|grant| grant.role == Role::Admin) {
        return CanAccessResult {
            allowed: true,
            role: Some(Role::Admin),
            matched_project: target.map(str::to_string),
            operations: Operation::ALL,
        };
    }
    if query.require_admin {
        return CanAccessResult::denied();
    }

    let global = grants.iter().filter(|grant| grant.project_name.is_none());
    scoped
        .into_iter()
        .chain(global)
        .find(|grant| grant.permission.contains(query.operations))
        .map(|grant| CanAccessResult {
            allowed: true,
            role: Some(grant.role),
            matched_project: grant.project_name.clone(),
            operations: grant.permission,
        })
        .unwrap_or_else(CanAccessResult::denied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn grant(project: Option<&str>, role: Role, permission: Operation) -> UserPermissionRecord {
        let now = Utc::now();
        UserPermissionRecord {
            user_id: "u1".to_string(),
            user_name: "User One".to_string(),
            role,
            project_name: project.map(str::to_string),
            permission,
            created_time: now,
            last_updated_time: now,
        }
    }

    fn query(project: Option<&str>, operations: Operation) -> CanAccessQuery {
        CanAccessQuery {
            user_id: "u1".to_string(),
            project_name: project.map(str::to_string),
            operations,
            require_admin: false,
        }
    }

    #[test]
    fn all_is_union_of_single_operations() {
        assert_eq!(Operation::ALL.bits(), 31);
        assert_eq!(
            Operation::CREATE | Operation::UPDATE | Operation::READ | Operation::DELETE | Operation::LIST,
            Operation::ALL
        );
    }

    #[test]
    fn operation_serializes_as_mask() {
        let json = serde_json::to_value(Operation::READ | Operation::LIST).expect("json");
        assert_eq!(json, serde_json::json!(20));
        let parsed: Operation = serde_json::from_value(serde_json::json!(5)).expect("parse");
        assert_eq!(parsed, Operation::CREATE | Operation::READ);
        assert!(serde_json::from_value::<Operation>(serde_json::json!(64)).is_err());
    }

    #[test]
    fn global_admin_bypasses_everything() {
        let grants = vec![grant(None, Role::Admin, Operation::empty())];
        let result = resolve_access(&query(Some("p1"), Operation::DELETE), &grants);
        assert!(result.allowed);
        assert_eq!(result.role, Some(Role::Admin));
        assert_eq!(result.operations, Operation::ALL);
    }

    #[test]
    fn project_admin_only_covers_its_project() {
        let grants = vec![grant(Some("p1"), Role::Admin, Operation::empty())];
        assert!(resolve_access(&query(Some("p1"), Operation::DELETE), &grants).allowed);
        assert!(!resolve_access(&query(Some("p2"), Operation::READ), &grants).allowed);
    }

    #[test]
    fn global_grant_still_applies_next_to_narrower_project_grant() {
        let grants = vec![
            grant(None, Role::Contributor, Operation::ALL),
            grant(Some("p1"), Role::Reader, Operation::READ | Operation::LIST),
        ];
        let create = resolve_access(&query(Some("p1"), Operation::CREATE), &grants);
        assert!(create.allowed);
        assert_eq!(create.role, Some(Role::Contributor));
        assert_eq!(create.matched_project, None);

        let other = resolve_access(&query(Some("p2"), Operation::UPDATE), &grants);
        assert!(other.allowed);
        assert_eq!(other.matched_project, None);
    }

    #[test]
    fn project_grant_is_reported_when_both_scopes_qualify() {
        let grants = vec![
            grant(None, Role::Contributor, Operation::ALL),
            grant(Some("p1"), Role::Reader, Operation::READ | Operation::LIST),
        ];
        let read = resolve_access(&query(Some("p1"), Operation::READ), &grants);
        assert!(read.allowed);
        assert_eq!(read.role, Some(Role::Reader));
        assert_eq!(read.matched_project.as_deref(), Some("p1"));
        assert_eq!(read.operations, Operation::READ | Operation::LIST);
    }

    #[test]
    fn masks_of_separate_grants_are_not_combined() {
        let grants = vec![
            grant(Some("p1"), Role::Reader, Operation::READ),
            grant(None, Role::Contributor, Operation::LIST),
        ];
        let result = resolve_access(&query(Some("p1"), Operation::READ | Operation::LIST), &grants);
        assert_eq!(result, CanAccessResult::denied());
    }

    #[test]
    fn every_required_bit_must_be_granted() {
        let grants = vec![grant(Some("p1"), Role::Contributor, Operation::READ)];
        let result = resolve_access(&query(Some("p1"), Operation::READ | Operation::LIST), &grants);
        assert!(!result.allowed);
        assert_eq!(result.operations, Operation::empty());
    }

    #[test]
    fn project_grants_do_not_answer_global_queries() {
        let grants = vec![grant(Some("p1"), Role::Contributor, Operation::ALL)];
        assert!(!resolve_access(&query(None, Operation::LIST), &grants).allowed);
    }

    #[test]
    fn require_admin_rejects_non_admin_grants() {
        let grants = vec![grant(Some("p1"), Role::Contributor, Operation::ALL)];
        let mut q = query(Some("p1"), Operation::READ);
        q.require_admin = true;
        assert!(!resolve_access(&q, &grants).allowed);
    }

    #[test]
    fn no_grants_means_denied() {
        let result = resolve_access(&query(Some("p1"), Operation::READ), &[]);
        assert_eq!(result, CanAccessResult::denied());
    }
}
