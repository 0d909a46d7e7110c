use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{
    AuthorizationContext, Capability, CapabilityGate, GateMode, Grant, RoleCapabilityMap, SessionContext,
};
use crate::views::WorkbenchView;

/// Resolved capabilities of the caller, as handed to the front-end.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthzContextResponse {
    pub project_id: Option<Uuid>,
    /// Role stored for the caller in the project, if any
    pub role: Option<String>,
    pub is_admin: bool,
    #[schema(value_type = Object)]
    pub grant: Grant,
    pub capabilities: Vec<Capability>,
    /// Views whose data requests the client should issue
    pub views: Vec<WorkbenchView>,
}

impl AuthzContextResponse {
    pub fn new(session: &SessionContext, ctx: &AuthorizationContext) -> Self {
        Self {
            project_id: ctx.project_id(),
            role: session.role.clone(),
            is_admin: ctx.is_admin(),
            grant: ctx.grant().clone(),
            capabilities: ctx.capabilities().iter().copied().collect(),
            views: WorkbenchView::visible_for(ctx),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GateCheckRequest {
    #[schema(example = json!(["VIEW_BACKLOG", "VIEW_KPI"]))]
    pub required: Vec<Capability>,
    #[serde(default)]
    pub mode: GateMode,
}

impl GateCheckRequest {
    pub fn gate(&self) -> CapabilityGate {
        CapabilityGate::new(self.required.iter().copied(), self.mode)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GateCheckResponse {
    /// Whether protected content should be shown. Advisory only.
    pub visible: bool,
    pub mode: GateMode,
    /// Required capabilities the caller does not hold
    pub missing: Vec<Capability>,
}

impl GateCheckResponse {
    pub fn evaluate(request: &GateCheckRequest, ctx: &AuthorizationContext) -> Self {
        let gate = request.gate();
        Self {
            visible: gate.allows(ctx),
            mode: gate.mode(),
            missing: gate
                .required()
                .iter()
                .copied()
                .filter(|cap| !ctx.has_capability(*cap))
                .collect(),
        }
    }
}

/// Role table as published to clients, for keeping their copy in sync.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleTableResponse {
    pub roles: BTreeMap<String, Vec<Capability>>,
}

impl From<&RoleCapabilityMap> for RoleTableResponse {
    fn from(table: &RoleCapabilityMap) -> Self {
        Self {
            roles: table
                .iter()
                .map(|(role, caps)| (role.to_string(), caps.iter().copied().collect()))
                .collect(),
        }
    }
}
