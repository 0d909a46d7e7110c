use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::capability::{Capability, CapabilitySet};
use super::context::AuthorizationContext;

/// How the required capabilities are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// Every required capability must be held. Vacuously true for an empty list.
    #[default]
    All,
    /// At least one required capability must be held. False for an empty list.
    Any,
}

/// Chooses between protected content and a fallback based on capabilities.
///
/// Hides affordances a role cannot use. It is not a security boundary: the
/// server rejects unauthorized requests on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityGate {
    required: Vec<Capability>,
    mode: GateMode,
}

impl CapabilityGate {
    pub fn new(required: impl IntoIterator<Item = Capability>, mode: GateMode) -> Self {
        Self {
            required: required.into_iter().collect(),
            mode,
        }
    }

    pub fn all(required: impl IntoIterator<Item = Capability>) -> Self {
        Self::new(required, GateMode::All)
    }

    pub fn any(required: impl IntoIterator<Item = Capability>) -> Self {
        Self::new(required, GateMode::Any)
    }

    pub fn required(&self) -> &[Capability] {
        &self.required
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }

    pub fn evaluate(&self, held: &CapabilitySet) -> bool {
        match self.mode {
            GateMode::All => self.required.iter().all(|cap| held.contains(cap)),
            GateMode::Any => self.required.iter().any(|cap| held.contains(cap)),
        }
    }

    pub fn allows(&self, ctx: &AuthorizationContext) -> bool {
        self.evaluate(ctx.capabilities())
    }

    /// Protected content when allowed, nothing otherwise.
    pub fn render<T>(&self, ctx: &AuthorizationContext, protected: impl FnOnce() -> T) -> Option<T> {
        self.allows(ctx).then(protected)
    }

    /// Protected content when allowed, the fallback otherwise. Only the chosen
    /// branch is built.
    pub fn render_or<T>(
        &self,
        ctx: &AuthorizationContext,
        protected: impl FnOnce() -> T,
        fallback: impl FnOnce() -> T,
    ) -> T {
        if self.allows(ctx) {
            protected()
        } else {
            fallback()
        }
    }
}
