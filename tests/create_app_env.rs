//! `create_app` reads its settings from the process environment, so this file
//! holds a single test to keep env mutation away from other tests.

use std::io::Write;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, NamedTempFile};
use tower::util::ServiceExt; // for `oneshot`

use workbench_authz::authz::{Capability, RoleCapabilityMap};
use workbench_authz::create_app;
use workbench_authz::db::members;
use workbench_authz::jwt::JwtConfig;

async fn get(app: &axum::Router, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let resp = app.clone().oneshot(builder.body(Body::empty())?).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn create_app_uses_env_secret_and_role_table() -> Result<()> {
    let mut table_file = NamedTempFile::new()?;
    write!(table_file, r#"{{"pm": ["VIEW_KPI", "VIEW_STORY"], "auditor": ["VIEW_AUDIT_LOG"]}}"#)?;

    std::env::set_var("JWT_SECRET", "env-secret");
    std::env::set_var("ROLE_TABLE_PATH", table_file.path());

    let dir = tempdir()?;
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;

    let app = create_app(pool.clone()).await?;

    let (status, v) = get(&app, "/authz/roles", None).await?;
    assert_eq!(status, StatusCode::OK);
    let published = RoleCapabilityMap::from_json_str(&v["roles"].to_string())?;
    let expected = RoleCapabilityMap::new()
        .with_role("pm", [Capability::ViewKpi, Capability::ViewStory])
        .with_role("auditor", [Capability::ViewAuditLog]);
    assert!(published.drift(&expected).is_empty(), "{}", v);

    let user = members::insert_user(&pool, "Auditor", "auditor@example.com", false).await?;
    let project = members::insert_project(&pool, "Voyager").await?;
    members::upsert_member(&pool, project.id, user.id, "auditor").await?;

    // tokens signed with the env secret are accepted
    let token = JwtConfig::new("env-secret", 1).encode(user.id)?;
    let (status, v) = get(&app, &format!("/projects/{}/authz", project.id), Some(&token)).await?;
    assert_eq!(status, StatusCode::OK, "{}", v);
    assert_eq!(v["capabilities"], json!(["VIEW_AUDIT_LOG"]));

    // and tokens signed with anything else are not
    let foreign = JwtConfig::new("other-secret", 1).encode(user.id)?;
    let (status, _) = get(&app, &format!("/projects/{}/authz", project.id), Some(&foreign)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
