use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::capability::{all_capabilities, Capability, CapabilitySet};
use super::role_map::RoleCapabilityMap;

/// How the capability set of a context was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
pub enum Grant {
    /// Every capability in the registry, whatever the role.
    Admin,
    /// Table lookup for the role. `None` means no role could be resolved.
    RoleBased(Option<String>),
}

/// Effective capabilities of the current user in the current project.
///
/// Derived state only: build a new one whenever the inputs change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    project_id: Option<Uuid>,
    grant: Grant,
    capabilities: CapabilitySet,
}

impl AuthorizationContext {
    pub fn admin(project_id: Option<Uuid>) -> Self {
        Self {
            project_id,
            grant: Grant::Admin,
            capabilities: all_capabilities(),
        }
    }

    pub fn role_based(project_id: Option<Uuid>, role: Option<&str>, table: &RoleCapabilityMap) -> Self {
        let capabilities = role.map(|r| table.capabilities_for_role(r)).unwrap_or_default();
        Self {
            project_id,
            grant: Grant::RoleBased(role.map(str::to_string)),
            capabilities,
        }
    }

    /// No admin flag, no role: nothing is granted.
    pub fn empty() -> Self {
        Self {
            project_id: None,
            grant: Grant::RoleBased(None),
            capabilities: CapabilitySet::new(),
        }
    }

    pub fn project_id(&self) -> Option<Uuid> {
        self.project_id
    }

    pub fn grant(&self) -> &Grant {
        &self.grant
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.grant, Grant::Admin)
    }

    /// Role used for the table lookup. Always `None` for admins.
    pub fn role(&self) -> Option<&str> {
        match &self.grant {
            Grant::Admin => None,
            Grant::RoleBased(role) => role.as_deref(),
        }
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    /// False for an empty list.
    pub fn has_any_capability(&self, caps: &[Capability]) -> bool {
        caps.iter().any(|cap| self.capabilities.contains(cap))
    }

    /// True for an empty list.
    pub fn has_all_capabilities(&self, caps: &[Capability]) -> bool {
        caps.iter().all(|cap| self.capabilities.contains(cap))
    }
}

impl Default for AuthorizationContext {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Capability::*;

    #[test]
    fn admin_holds_full_registry() {
        let ctx = AuthorizationContext::admin(None);
        assert!(ctx.is_admin());
        assert_eq!(ctx.role(), None);
        assert_eq!(ctx.capabilities().len(), Capability::ALL.len());
        assert!(ctx.has_all_capabilities(&Capability::ALL));
    }

    #[test]
    fn missing_role_holds_nothing() {
        let table = RoleCapabilityMap::builtin();
        let ctx = AuthorizationContext::role_based(Some(Uuid::new_v4()), None, &table);
        assert!(ctx.capabilities().is_empty());
        assert_eq!(ctx.grant(), &Grant::RoleBased(None));
        assert_eq!(AuthorizationContext::default(), AuthorizationContext::empty());
    }

    #[test]
    fn predicates_agree_with_membership_for_every_role() {
        let table = RoleCapabilityMap::builtin();
        let roles: Vec<Option<&str>> = table.roles().map(Some).chain([None, Some("ghost")]).collect();
        let project = Some(Uuid::new_v4());

        let mut contexts: Vec<AuthorizationContext> = roles
            .into_iter()
            .flat_map(|role| {
                [
                    AuthorizationContext::role_based(None, role, &table),
                    AuthorizationContext::role_based(project, role, &table),
                ]
            })
            .collect();
        contexts.push(AuthorizationContext::admin(None));
        contexts.push(AuthorizationContext::admin(project));
        contexts.push(AuthorizationContext::empty());

        for ctx in &contexts {
            for cap in Capability::ALL {
                assert_eq!(ctx.has_capability(cap), ctx.capabilities().contains(&cap), "{:?} {cap}", ctx.grant());
            }
        }
        assert!(contexts.iter().filter(|c| c.is_admin()).all(|c| Capability::ALL.iter().all(|&cap| c.has_capability(cap))));
    }

    #[test]
    fn any_and_all_quantify_over_the_list() {
        let table = RoleCapabilityMap::builtin();
        let dev = AuthorizationContext::role_based(None, Some("developer"), &table);

        assert!(dev.has_any_capability(&[ViewBacklog, ViewKpi]));
        assert!(!dev.has_all_capabilities(&[ViewBacklog, ViewKpi]));
        assert!(dev.has_all_capabilities(&[ViewBacklog, ViewStory]));
        assert!(!dev.has_any_capability(&[ViewKpi, ViewAuditLog]));

        assert!(dev.has_all_capabilities(&[]));
        assert!(!dev.has_any_capability(&[]));
    }

    #[test]
    fn grant_serializes_tagged() {
        let admin = serde_json::to_value(Grant::Admin).unwrap();
        assert_eq!(admin, serde_json::json!({"kind": "admin"}));

        let pm = serde_json::to_value(Grant::RoleBased(Some("pm".to_string()))).unwrap();
        assert_eq!(pm, serde_json::json!({"kind": "role_based", "role": "pm"}));
    }
}
