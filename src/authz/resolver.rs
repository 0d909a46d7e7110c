use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::AuthorizationContext;
use super::role_map::RoleCapabilityMap;

/// Upstream project/session state. Read-only from the resolver's side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub current_project_id: Option<Uuid>,
    /// The user's role in `current_project_id`, once loaded
    pub role: Option<String>,
    pub is_admin: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project_id: Uuid) -> Self {
        self.current_project_id = Some(project_id);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}

/// Derives the authorization context from session state and an injected table.
#[derive(Debug, Clone)]
pub struct AuthzResolver {
    table: Arc<RoleCapabilityMap>,
}

impl AuthzResolver {
    pub fn new(table: Arc<RoleCapabilityMap>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoleCapabilityMap {
        &self.table
    }

    /// Evaluation order:
    /// 1. admin flag -> every capability
    /// 2. no project selected or no role -> nothing
    /// 3. table lookup for the role (unknown role -> nothing)
    pub fn resolve(&self, session: &SessionContext) -> AuthorizationContext {
        let project_id = session.current_project_id;

        if session.is_admin {
            tracing::debug!(project_id = ?project_id, "admin override");
            return AuthorizationContext::admin(project_id);
        }

        let role = match (project_id, session.role.as_deref()) {
            (Some(_), Some(role)) => Some(role),
            _ => None,
        };

        let ctx = AuthorizationContext::role_based(project_id, role, &self.table);
        match role {
            Some(role) if !self.table.contains_role(role) => {
                tracing::debug!(project_id = ?project_id, role = %role, "unknown role, no capabilities granted");
            }
            Some(role) => {
                tracing::debug!(
                    project_id = ?project_id,
                    role = %role,
                    capabilities = ctx.capabilities().len(),
                    "role capabilities resolved"
                );
            }
            None => {
                tracing::debug!(project_id = ?project_id, "no role resolved");
            }
        }
        ctx
    }
}

/// Holds the last input tuple and its resolved context.
///
/// A different tuple always recomputes; nothing older than the last tuple is kept.
#[derive(Debug)]
pub struct ContextMemo {
    resolver: AuthzResolver,
    last: Option<(SessionContext, AuthorizationContext)>,
    recomputations: usize,
}

impl ContextMemo {
    pub fn new(resolver: AuthzResolver) -> Self {
        Self {
            resolver,
            last: None,
            recomputations: 0,
        }
    }

    pub fn get(&mut self, session: &SessionContext) -> &AuthorizationContext {
        if matches!(&self.last, Some((input, _)) if input != session) {
            self.last = None;
        }

        let resolver = &self.resolver;
        let recomputations = &mut self.recomputations;
        let (_, ctx) = self.last.get_or_insert_with(|| {
            *recomputations += 1;
            (session.clone(), resolver.resolve(session))
        });
        ctx
    }

    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}
