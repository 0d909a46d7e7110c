//! Authorization module - capability gating for the workbench
//!
//! This module implements:
//! - The closed capability registry
//! - The injected role -> capability table
//! - Context resolution with admin override and fail-closed defaults
//! - The advisory capability gate

mod capability;
mod context;
mod gate;
mod resolver;
mod role_map;

pub use capability::{all_capabilities, Capability, CapabilitySet, UnknownCapability};
pub use context::{AuthorizationContext, Grant};
pub use gate::{CapabilityGate, GateMode};
pub use resolver::{AuthzResolver, ContextMemo, SessionContext};
pub use role_map::{RoleCapabilityMap, RoleDrift, RoleTableError, TableDrift};

/// Well-known role names
pub mod roles {
    pub const SPONSOR: &str = "sponsor";
    pub const PRODUCT_OWNER: &str = "po";
    pub const PROJECT_MANAGER: &str = "pm";
    pub const PMO_HEAD: &str = "pmo_head";
    pub const DEVELOPER: &str = "developer";
    pub const QA: &str = "qa";
    pub const BUSINESS_ANALYST: &str = "business_analyst";
    pub const MEMBER: &str = "member";

    pub const ALL: [&str; 8] = [
        SPONSOR,
        PRODUCT_OWNER,
        PROJECT_MANAGER,
        PMO_HEAD,
        DEVELOPER,
        QA,
        BUSINESS_ANALYST,
        MEMBER,
    ];
}
