//! Users, projects and project memberships: the upstream source of the
//! session context.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::SessionContext;
use crate::db::row_parsers::{member_from_row, project_from_row, user_from_row};
use crate::errors::{AppError, AppResult};
use crate::models::project::{Project, ProjectMember};
use crate::models::user::User;

pub async fn insert_user(pool: &SqlitePool, name: &str, email: &str, is_admin: bool) -> AppResult<User> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email, is_admin, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(email)
        .bind(is_admin as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    fetch_user(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("user missing after insert"))
}

pub async fn fetch_user(pool: &SqlitePool, id: Uuid) -> AppResult<Option<User>> {
    let row = sqlx::query("SELECT id, name, email, is_admin, created_at FROM users WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn set_admin(pool: &SqlitePool, id: Uuid, is_admin: bool) -> AppResult<()> {
    let result = sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
        .bind(is_admin as i64)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("user {}", id)));
    }
    Ok(())
}

pub async fn insert_project(pool: &SqlitePool, name: &str) -> AppResult<Project> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO projects (id, name, created_at) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    fetch_project(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("project missing after insert"))
}

pub async fn fetch_project(pool: &SqlitePool, id: Uuid) -> AppResult<Option<Project>> {
    let row = sqlx::query("SELECT id, name, created_at FROM projects WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(project_from_row).transpose()
}

/// Assign `role` to the user in the project, replacing any previous role.
///
/// The role is stored exactly as given; blank roles are rejected.
pub async fn upsert_member(pool: &SqlitePool, project_id: Uuid, user_id: Uuid, role: &str) -> AppResult<ProjectMember> {
    if role.trim().is_empty() {
        return Err(AppError::bad_request("role must not be empty"));
    }

    sqlx::query(
        r#"
        INSERT INTO project_members (project_id, user_id, role, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (project_id, user_id) DO UPDATE SET role = excluded.role
        "#,
    )
    .bind(project_id.to_string())
    .bind(user_id.to_string())
    .bind(role)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    fetch_member(pool, project_id, user_id)
        .await?
        .ok_or_else(|| AppError::internal("membership missing after upsert"))
}

pub async fn fetch_member(pool: &SqlitePool, project_id: Uuid, user_id: Uuid) -> AppResult<Option<ProjectMember>> {
    let row = sqlx::query(
        "SELECT project_id, user_id, role, created_at FROM project_members WHERE project_id = ? AND user_id = ?",
    )
    .bind(project_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(member_from_row).transpose()
}

/// Memberships of the project, oldest first.
pub async fn list_members(pool: &SqlitePool, project_id: Uuid) -> AppResult<Vec<ProjectMember>> {
    let rows = sqlx::query(
        "SELECT project_id, user_id, role, created_at FROM project_members WHERE project_id = ? ORDER BY created_at",
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(member_from_row).collect()
}

/// Session inputs for `user_id`, optionally within a project.
///
/// A user the database does not know is treated as a non-admin without role.
pub async fn load_session(pool: &SqlitePool, user_id: Uuid, project_id: Option<Uuid>) -> AppResult<SessionContext> {
    let is_admin = fetch_user(pool, user_id).await?.map(|u| u.is_admin).unwrap_or(false);

    let mut session = SessionContext::new().with_admin(is_admin);
    if let Some(project_id) = project_id {
        session = session.with_project(project_id);
        if let Some(member) = fetch_member(pool, project_id, user_id).await? {
            session = session.with_role(member.role);
        }
    }

    Ok(session)
}
