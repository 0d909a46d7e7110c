//! Workbench views and the capability check that guards their data loaders.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{AuthorizationContext, Capability, CapabilityGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkbenchView {
    Backlog,
    StoryBoard,
    SprintPlanning,
    WbsLinking,
    Kpi,
    DataQuality,
    AuditLog,
    Members,
}

impl WorkbenchView {
    pub const ALL: [WorkbenchView; 8] = [
        WorkbenchView::Backlog,
        WorkbenchView::StoryBoard,
        WorkbenchView::SprintPlanning,
        WorkbenchView::WbsLinking,
        WorkbenchView::Kpi,
        WorkbenchView::DataQuality,
        WorkbenchView::AuditLog,
        WorkbenchView::Members,
    ];

    /// Capability the view's data request needs.
    pub fn required_capability(&self) -> Capability {
        match self {
            WorkbenchView::Backlog => Capability::ViewBacklog,
            WorkbenchView::StoryBoard => Capability::ViewStory,
            WorkbenchView::SprintPlanning => Capability::ManageSprint,
            WorkbenchView::WbsLinking => Capability::ViewWbs,
            WorkbenchView::Kpi => Capability::ViewKpi,
            WorkbenchView::DataQuality => Capability::ViewDataQuality,
            WorkbenchView::AuditLog => Capability::ViewAuditLog,
            WorkbenchView::Members => Capability::ManageMembers,
        }
    }

    pub fn gate(&self) -> CapabilityGate {
        CapabilityGate::all([self.required_capability()])
    }

    /// Views whose data request would be issued for `ctx`.
    pub fn visible_for(ctx: &AuthorizationContext) -> Vec<WorkbenchView> {
        Self::ALL
            .into_iter()
            .filter(|view| ctx.has_capability(view.required_capability()))
            .collect()
    }
}

/// Fetches the data behind a view. Implemented by the API client layer.
#[async_trait]
pub trait ViewLoader: Send + Sync {
    type Error: Send;

    async fn load(&self, view: WorkbenchView, project_id: Uuid) -> Result<Value, Self::Error>;
}

/// Request options for one view in one authorization context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewQuery {
    pub view: WorkbenchView,
    /// False means the request must not be sent at all.
    pub enabled: bool,
}

impl ViewQuery {
    pub fn for_view(ctx: &AuthorizationContext, view: WorkbenchView) -> Self {
        Self {
            view,
            enabled: ctx.has_capability(view.required_capability()),
        }
    }

    /// Runs the loader when enabled; `Ok(None)` without touching the loader otherwise.
    pub async fn run<L: ViewLoader>(&self, loader: &L, project_id: Uuid) -> Result<Option<Value>, L::Error> {
        if !self.enabled {
            tracing::debug!(view = ?self.view, project_id = %project_id, "view query disabled");
            return Ok(None);
        }

        loader.load(self.view, project_id).await.map(Some)
    }
}
