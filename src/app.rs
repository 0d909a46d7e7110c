use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{AuthzResolver, RoleCapabilityMap};
use crate::config::{load_role_table, role_table_path_from_env};
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{authz, health};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub resolver: AuthzResolver,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, table: RoleCapabilityMap) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            resolver: AuthzResolver::new(Arc::new(table)),
        }
    }
}

/// Router configured from the environment (`JWT_SECRET`, `ROLE_TABLE_PATH`).
pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let table = load_role_table(role_table_path_from_env().as_ref())?;
    Ok(build_router(AppState::new(pool, jwt_config, table)))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .merge(authz::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
