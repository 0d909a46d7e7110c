use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;
use utoipa::ToSchema;

use super::capability::{Capability, CapabilitySet};
use super::roles;

#[derive(thiserror::Error, Debug)]
pub enum RoleTableError {
    #[error("failed to read role table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid role table json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("role '{role}' references unknown capability '{capability}'")]
    UnknownCapability { role: String, capability: String },
}

/// Default capability grant per role.
///
/// Mirrors the server-side authorization table. Unknown roles resolve to the
/// empty set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleCapabilityMap {
    grants: BTreeMap<String, CapabilitySet>,
}

impl RoleCapabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: impl Into<String>, caps: impl IntoIterator<Item = Capability>) -> Self {
        self.grants.insert(role.into(), caps.into_iter().collect());
        self
    }

    /// The table shipped with the workbench.
    pub fn builtin() -> Self {
        use Capability::*;

        Self::new()
            .with_role(roles::SPONSOR, [ViewBacklog, ViewWbs, ViewKpi, ApproveDeliverable])
            .with_role(
                roles::PRODUCT_OWNER,
                [ViewBacklog, EditBacklog, ViewStory, EditStory, ManageSprint, ViewWbs, ApproveDeliverable],
            )
            .with_role(
                roles::PROJECT_MANAGER,
                [ViewBacklog, ViewStory, EditStory, ManageSprint, ViewWbs, EditWbs, ApproveDeliverable, ManageMembers],
            )
            .with_role(
                roles::PMO_HEAD,
                [ViewBacklog, ViewStory, ViewWbs, ViewKpi, ViewDataQuality, ViewAuditLog],
            )
            .with_role(roles::DEVELOPER, [ViewBacklog, ViewStory, EditStory, ViewWbs])
            .with_role(roles::QA, [ViewBacklog, ViewStory, EditStory, ViewDataQuality])
            .with_role(roles::BUSINESS_ANALYST, [ViewBacklog, EditBacklog, ViewStory, EditStory, ViewWbs])
            .with_role(roles::MEMBER, [ViewBacklog, ViewStory])
    }

    /// Parse a table of the form `{"role": ["CAPABILITY", ...]}`.
    pub fn from_json_str(raw: &str) -> Result<Self, RoleTableError> {
        let table: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;

        let mut grants = BTreeMap::new();
        for (role, names) in table {
            let mut caps = CapabilitySet::new();
            for name in names {
                let cap = name.parse::<Capability>().map_err(|_| RoleTableError::UnknownCapability {
                    role: role.clone(),
                    capability: name.clone(),
                })?;
                caps.insert(cap);
            }
            grants.insert(role, caps);
        }

        Ok(Self { grants })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RoleTableError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RoleTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Exact configured set for `role`; empty for a role the table does not know.
    pub fn capabilities_for_role(&self, role: &str) -> CapabilitySet {
        self.grants.get(role).cloned().unwrap_or_default()
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.grants.contains_key(role)
    }

    /// Well-known roles this table has no entry for.
    pub fn missing_known_roles(&self) -> BTreeSet<&'static str> {
        roles::ALL.iter().copied().filter(|role| !self.contains_role(role)).collect()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.grants.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilitySet)> {
        self.grants.iter().map(|(role, caps)| (role.as_str(), caps))
    }

    /// Compare this table against `other` (usually the server's copy).
    pub fn drift(&self, other: &RoleCapabilityMap) -> TableDrift {
        let mut drift = TableDrift::default();

        for (role, caps) in &self.grants {
            match other.grants.get(role) {
                None => drift.missing_roles.push(role.clone()),
                Some(theirs) => {
                    let added: Vec<Capability> = theirs.difference(caps).copied().collect();
                    let removed: Vec<Capability> = caps.difference(theirs).copied().collect();
                    if !added.is_empty() || !removed.is_empty() {
                        drift.changed_roles.push(RoleDrift {
                            role: role.clone(),
                            added,
                            removed,
                        });
                    }
                }
            }
        }

        drift.extra_roles = other
            .grants
            .keys()
            .filter(|role| !self.grants.contains_key(*role))
            .cloned()
            .collect();

        drift
    }
}

impl Serialize for RoleCapabilityMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.grants.serialize(serializer)
    }
}

/// Difference between two role tables, seen from the left-hand table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TableDrift {
    /// Roles present here but absent from the other table
    pub missing_roles: Vec<String>,
    /// Roles only the other table knows
    pub extra_roles: Vec<String>,
    pub changed_roles: Vec<RoleDrift>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoleDrift {
    pub role: String,
    /// Granted by the other table only
    pub added: Vec<Capability>,
    /// Granted by this table only
    pub removed: Vec<Capability>,
}

impl TableDrift {
    pub fn is_empty(&self) -> bool {
        self.missing_roles.is_empty() && self.extra_roles.is_empty() && self.changed_roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Capability::*;

    fn expected_table() -> Vec<(&'static str, Vec<Capability>)> {
        vec![
            ("sponsor", vec![ViewBacklog, ViewWbs, ViewKpi, ApproveDeliverable]),
            ("po", vec![ViewBacklog, EditBacklog, ViewStory, EditStory, ManageSprint, ViewWbs, ApproveDeliverable]),
            ("pm", vec![ViewBacklog, ViewStory, EditStory, ManageSprint, ViewWbs, EditWbs, ApproveDeliverable, ManageMembers]),
            ("pmo_head", vec![ViewBacklog, ViewStory, ViewWbs, ViewKpi, ViewDataQuality, ViewAuditLog]),
            ("developer", vec![ViewBacklog, ViewStory, EditStory, ViewWbs]),
            ("qa", vec![ViewBacklog, ViewStory, EditStory, ViewDataQuality]),
            ("business_analyst", vec![ViewBacklog, EditBacklog, ViewStory, EditStory, ViewWbs]),
            ("member", vec![ViewBacklog, ViewStory]),
        ]
    }

    #[test]
    fn builtin_roles_get_exactly_their_configured_set() {
        let map = RoleCapabilityMap::builtin();
        for (role, caps) in expected_table() {
            let expected: CapabilitySet = caps.into_iter().collect();
            assert_eq!(map.capabilities_for_role(role), expected, "role {role}");
        }
        assert_eq!(map.roles().count(), expected_table().len());
    }

    #[test]
    fn every_well_known_role_has_an_entry() {
        assert!(RoleCapabilityMap::builtin().missing_known_roles().is_empty());
        assert!(RoleCapabilityMap::new().with_role("pm", [ViewKpi]).missing_known_roles().contains("qa"));
    }

    #[test]
    fn unknown_role_is_empty() {
        let map = RoleCapabilityMap::builtin();
        for role in ["", "admin", "PM", "super_admin", "pm "] {
            assert!(map.capabilities_for_role(role).is_empty(), "role {role:?}");
        }
    }

    #[test]
    fn json_table_round_trips_through_serialize() {
        let map = RoleCapabilityMap::builtin();
        let raw = serde_json::to_string(&map).unwrap();
        assert_eq!(RoleCapabilityMap::from_json_str(&raw).unwrap(), map);
    }

    #[test]
    fn json_table_rejects_unknown_capability() {
        let err = RoleCapabilityMap::from_json_str(r#"{"pm": ["VIEW_BACKLOG", "LAUNCH_ROCKET"]}"#).unwrap_err();
        match err {
            RoleTableError::UnknownCapability { role, capability } => {
                assert_eq!(role, "pm");
                assert_eq!(capability, "LAUNCH_ROCKET");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn json_table_allows_empty_role() {
        let map = RoleCapabilityMap::from_json_str(r#"{"observer": []}"#).unwrap();
        assert!(map.contains_role("observer"));
        assert!(map.capabilities_for_role("observer").is_empty());
    }

    #[test]
    fn drift_reports_roles_and_capabilities() {
        let client = RoleCapabilityMap::new()
            .with_role("pm", [ViewBacklog, ViewStory])
            .with_role("qa", [ViewStory]);
        let server = RoleCapabilityMap::new()
            .with_role("pm", [ViewBacklog, ViewKpi])
            .with_role("auditor", [ViewAuditLog]);

        let drift = client.drift(&server);
        assert_eq!(drift.missing_roles, vec!["qa".to_string()]);
        assert_eq!(drift.extra_roles, vec!["auditor".to_string()]);
        assert_eq!(
            drift.changed_roles,
            vec![RoleDrift { role: "pm".to_string(), added: vec![ViewKpi], removed: vec![ViewStory] }]
        );
        assert!(!drift.is_empty());
    }

    #[test]
    fn identical_tables_have_no_drift() {
        let map = RoleCapabilityMap::builtin();
        assert!(map.drift(&map.clone()).is_empty());
    }
}
