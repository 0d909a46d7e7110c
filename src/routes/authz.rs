//! Authorization context API
//!
//! Hands the front-end what it needs to gate views: the capability registry,
//! the active role table, and the caller's resolved context. Nothing here
//! rejects a request for lack of a capability.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Capability;
use crate::db::members::{fetch_project, load_session};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::authz::{AuthzContextResponse, GateCheckRequest, GateCheckResponse, RoleTableResponse};

// =============================================================================
// ROUTER
// =============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/authz/capabilities", get(list_capabilities))
        .route("/authz/roles", get(list_roles))
        .route("/authz/me", get(my_context))
        .route("/projects/:project_id/authz", get(project_context))
        .route("/projects/:project_id/authz/check", post(check_gate))
}

// =============================================================================
// REGISTRY & TABLE
// =============================================================================

/// List every capability identifier
#[utoipa::path(
    get,
    path = "/authz/capabilities",
    tag = "Authz",
    responses((status = 200, description = "Capability registry", body = [Capability]))
)]
pub async fn list_capabilities() -> Json<Vec<Capability>> {
    Json(Capability::ALL.to_vec())
}

/// The role table the service resolves against
#[utoipa::path(
    get,
    path = "/authz/roles",
    tag = "Authz",
    responses((status = 200, description = "Role to capability table", body = RoleTableResponse))
)]
pub async fn list_roles(State(state): State<AppState>) -> Json<RoleTableResponse> {
    Json(RoleTableResponse::from(state.resolver.table()))
}

// =============================================================================
// RESOLVED CONTEXT
// =============================================================================

/// Context of the caller with no project selected
#[utoipa::path(
    get,
    path = "/authz/me",
    tag = "Authz",
    responses(
        (status = 200, description = "Resolved context", body = AuthzContextResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_context(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<AuthzContextResponse>> {
    let session = load_session(&state.pool, auth.user_id, None).await?;
    let ctx = state.resolver.resolve(&session);
    Ok(Json(AuthzContextResponse::new(&session, &ctx)))
}

/// Context of the caller in a project
#[utoipa::path(
    get,
    path = "/projects/{project_id}/authz",
    tag = "Authz",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Resolved context", body = AuthzContextResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Project not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn project_context(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<AuthzContextResponse>> {
    ensure_project(&state, project_id).await?;

    let session = load_session(&state.pool, auth.user_id, Some(project_id)).await?;
    let ctx = state.resolver.resolve(&session);
    Ok(Json(AuthzContextResponse::new(&session, &ctx)))
}

/// Evaluate a capability gate for the caller. Advisory only.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/authz/check",
    tag = "Authz",
    params(("project_id" = Uuid, Path, description = "Project id")),
    request_body = GateCheckRequest,
    responses(
        (status = 200, description = "Gate decision", body = GateCheckResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Project not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn check_gate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<GateCheckRequest>,
) -> AppResult<Json<GateCheckResponse>> {
    ensure_project(&state, project_id).await?;

    let session = load_session(&state.pool, auth.user_id, Some(project_id)).await?;
    let ctx = state.resolver.resolve(&session);
    let decision = GateCheckResponse::evaluate(&req, &ctx);

    tracing::debug!(
        user_id = %auth.user_id,
        project_id = %project_id,
        mode = ?decision.mode,
        visible = decision.visible,
        "gate evaluated"
    );

    Ok(Json(decision))
}

async fn ensure_project(state: &AppState, project_id: Uuid) -> AppResult<()> {
    match fetch_project(&state.pool, project_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found(format!("project {}", project_id))),
    }
}
