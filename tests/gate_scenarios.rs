use std::sync::Arc;

use uuid::Uuid;

use workbench_authz::authz::{
    all_capabilities, AuthzResolver, Capability, CapabilityGate, ContextMemo, GateMode, RoleCapabilityMap,
    SessionContext,
};

#[derive(Debug, PartialEq, Eq)]
enum Rendered {
    Protected,
    Fallback,
}

fn resolver() -> AuthzResolver {
    AuthzResolver::new(Arc::new(RoleCapabilityMap::builtin()))
}

fn session(role: &str) -> SessionContext {
    SessionContext::new().with_project(Uuid::new_v4()).with_role(role)
}

fn render(gate: &CapabilityGate, session: &SessionContext) -> Rendered {
    let ctx = resolver().resolve(session);
    gate.render_or(&ctx, || Rendered::Protected, || Rendered::Fallback)
}

#[test]
fn pm_with_view_story_sees_protected_content() {
    let gate = CapabilityGate::new([Capability::ViewStory], GateMode::All);
    assert_eq!(render(&gate, &session("pm")), Rendered::Protected);
}

#[test]
fn pm_without_view_kpi_sees_fallback() {
    let gate = CapabilityGate::new([Capability::ViewKpi], GateMode::All);
    assert_eq!(render(&gate, &session("pm")), Rendered::Fallback);
}

#[test]
fn developer_any_of_backlog_or_kpi_sees_protected_content() {
    let gate = CapabilityGate::new([Capability::ViewBacklog, Capability::ViewKpi], GateMode::Any);
    assert_eq!(render(&gate, &session("developer")), Rendered::Protected);
}

#[test]
fn admin_member_sees_audit_log() {
    let gate = CapabilityGate::new([Capability::ViewAuditLog], GateMode::All);
    let admin = session("member").with_admin(true);
    assert_eq!(render(&gate, &admin), Rendered::Protected);

    // same role without the flag
    assert_eq!(render(&gate, &session("member")), Rendered::Fallback);
}

#[test]
fn no_fallback_renders_nothing() {
    let ctx = resolver().resolve(&session("qa"));
    assert_eq!(CapabilityGate::all([Capability::ManageSprint]).render(&ctx, || "sprint"), None);
    assert_eq!(CapabilityGate::all([Capability::ViewDataQuality]).render(&ctx, || "dq"), Some("dq"));
}

#[test]
fn unresolved_context_hides_everything() {
    let ctx = resolver().resolve(&SessionContext::new());
    for cap in Capability::ALL {
        assert!(!CapabilityGate::all([cap]).allows(&ctx), "{cap}");
        assert!(!CapabilityGate::any([cap]).allows(&ctx), "{cap}");
    }
}

#[test]
fn admin_resolution_ignores_role_value() {
    let r = resolver();
    let roles = [None, Some("member"), Some("unknown-role"), Some("pmo_head")];
    for role in roles {
        let mut s = SessionContext::new().with_admin(true);
        s.role = role.map(str::to_string);
        assert_eq!(r.resolve(&s).capabilities(), &all_capabilities(), "{role:?}");
    }
}

#[test]
fn gate_branch_follows_role_changes_without_stale_results() {
    let mut memo = ContextMemo::new(resolver());
    let gate = CapabilityGate::all([Capability::ViewKpi]);
    let project = Uuid::new_v4();

    let mut inputs = SessionContext::new().with_project(project).with_role("pm");
    assert!(!gate.allows(memo.get(&inputs)));

    inputs.role = Some("sponsor".to_string());
    assert!(gate.allows(memo.get(&inputs)));

    inputs.role = Some("developer".to_string());
    assert!(!gate.allows(memo.get(&inputs)));

    inputs.is_admin = true;
    assert!(gate.allows(memo.get(&inputs)));

    inputs.is_admin = false;
    inputs.current_project_id = None;
    assert!(!gate.allows(memo.get(&inputs)));

    assert_eq!(memo.recomputations(), 5);
}
