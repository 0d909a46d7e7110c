use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{project::Project, project::ProjectMember, user::User};

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339 (e.g. 2025-11-19T12:34:56Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP: "YYYY-MM-DD HH:MM:SS" (optional fractional seconds)
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn get_string(row: &SqliteRow, col: &str) -> Result<String, AppError> {
    row.try_get(col).map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))
}

fn get_uuid(row: &SqliteRow, col: &str) -> Result<Uuid, AppError> {
    let raw = get_string(row, col)?;
    Uuid::parse_str(&raw).map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", col, e)))
}

pub fn user_from_row(row: &SqliteRow) -> Result<User, AppError> {
    let is_admin: i64 = row
        .try_get("is_admin")
        .map_err(|e| AppError::internal(format!("missing is_admin: {}", e)))?;

    Ok(User {
        id: get_uuid(row, "id")?,
        name: get_string(row, "name")?,
        email: get_string(row, "email")?,
        is_admin: is_admin != 0,
        created_at: parse_datetime(&get_string(row, "created_at")?)?,
    })
}

pub fn project_from_row(row: &SqliteRow) -> Result<Project, AppError> {
    Ok(Project {
        id: get_uuid(row, "id")?,
        name: get_string(row, "name")?,
        created_at: parse_datetime(&get_string(row, "created_at")?)?,
    })
}

pub fn member_from_row(row: &SqliteRow) -> Result<ProjectMember, AppError> {
    Ok(ProjectMember {
        project_id: get_uuid(row, "project_id")?,
        user_id: get_uuid(row, "user_id")?,
        role: get_string(row, "role")?,
        created_at: parse_datetime(&get_string(row, "created_at")?)?,
    })
}
