use std::path::PathBuf;

use crate::authz::RoleCapabilityMap;
use crate::errors::AppError;

const DEFAULT_PORT: u16 = 8000;

/// Server bootstrap settings; token and role table settings are read by `app::create_app`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| AppError::configuration("DATABASE_URL not set"))?;

        Ok(Self {
            database_url,
            port: port_from_env()?,
        })
    }
}

pub fn port_from_env() -> Result<u16, AppError> {
    match std::env::var("APP_PORT") {
        Ok(raw) => raw
            .parse::<u16>()
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number")),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

pub fn role_table_path_from_env() -> Option<PathBuf> {
    std::env::var("ROLE_TABLE_PATH")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
}

/// The built-in table, or the file at `path` when one is configured.
pub fn load_role_table(path: Option<&PathBuf>) -> Result<RoleCapabilityMap, AppError> {
    let Some(path) = path else {
        return Ok(RoleCapabilityMap::builtin());
    };

    let table = RoleCapabilityMap::from_json_file(path)?;
    let missing = table.missing_known_roles();
    if !missing.is_empty() {
        tracing::warn!(
            path = %path.display(),
            missing = ?missing,
            "role table has no entry for well-known roles; they resolve to no capabilities"
        );
    }
    tracing::info!(path = %path.display(), roles = table.roles().count(), "loaded role table");

    Ok(table)
}

/// Load `.env` from the working directory, falling back to the crate's own.
pub fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}
