use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fine-grained permission identifier used by the workbench views.
///
/// The set is closed: anything not listed here cannot be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    // Backlog
    ViewBacklog,
    EditBacklog,

    // Stories and sprints
    ViewStory,
    EditStory,
    ManageSprint,

    // WBS
    ViewWbs,
    EditWbs,

    // PMO dashboards
    ViewKpi,
    ViewDataQuality,
    ViewAuditLog,

    // Governance
    ApproveDeliverable,
    ManageMembers,
}

pub type CapabilitySet = BTreeSet<Capability>;

impl Capability {
    pub const ALL: [Capability; 12] = [
        Capability::ViewBacklog,
        Capability::EditBacklog,
        Capability::ViewStory,
        Capability::EditStory,
        Capability::ManageSprint,
        Capability::ViewWbs,
        Capability::EditWbs,
        Capability::ViewKpi,
        Capability::ViewDataQuality,
        Capability::ViewAuditLog,
        Capability::ApproveDeliverable,
        Capability::ManageMembers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewBacklog => "VIEW_BACKLOG",
            Capability::EditBacklog => "EDIT_BACKLOG",
            Capability::ViewStory => "VIEW_STORY",
            Capability::EditStory => "EDIT_STORY",
            Capability::ManageSprint => "MANAGE_SPRINT",
            Capability::ViewWbs => "VIEW_WBS",
            Capability::EditWbs => "EDIT_WBS",
            Capability::ViewKpi => "VIEW_KPI",
            Capability::ViewDataQuality => "VIEW_DATA_QUALITY",
            Capability::ViewAuditLog => "VIEW_AUDIT_LOG",
            Capability::ApproveDeliverable => "APPROVE_DELIVERABLE",
            Capability::ManageMembers => "MANAGE_MEMBERS",
        }
    }
}

/// Every capability in the registry. Used for the admin override.
pub fn all_capabilities() -> CapabilitySet {
    Capability::ALL.into_iter().collect()
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown capability: {0}")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_twelve_distinct_identifiers() {
        let names: BTreeSet<&str> = Capability::ALL.iter().map(Capability::as_str).collect();
        assert_eq!(names.len(), 12);
        assert_eq!(all_capabilities().len(), 12);
    }

    #[test]
    fn parse_matches_serde_names() {
        for cap in Capability::ALL {
            let json = serde_json::to_value(cap).unwrap();
            assert_eq!(json, serde_json::Value::String(cap.as_str().to_string()));
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
    }

    #[test]
    fn unlisted_identifier_is_rejected() {
        let err = "DELETE_EVERYTHING".parse::<Capability>().unwrap_err();
        assert_eq!(err, UnknownCapability("DELETE_EVERYTHING".to_string()));
        assert!("view_backlog".parse::<Capability>().is_err());
    }
}
