use sqlx::Row;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use workbench_authz::authz::{AuthzResolver, RoleCapabilityMap};
use workbench_authz::config::{self, load_role_table, role_table_path_from_env};
use workbench_authz::db::members;
use workbench_authz::jwt::JwtConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "workbench-authz admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Create a user
    AddUser {
        name: String,
        email: String,
        #[arg(long)]
        admin: bool,
    },
    /// Grant or revoke the workspace admin flag
    SetAdmin {
        user_id: Uuid,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Create a project
    AddProject { name: String },
    /// Assign a role to a user within a project
    AssignRole { project_id: Uuid, user_id: Uuid, role: String },
    /// List a project's members with their roles and resolved capabilities
    ListMembers { project_id: Uuid },
    /// Print a bearer token for a user
    IssueToken { user_id: Uuid },
    /// Print the active role table as JSON
    ShowRoles,
    /// Compare the active role table with another table file (e.g. the server's)
    CheckDrift { other: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env();

    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::AddUser { name, email, admin } => {
            let pool = get_pool().await?;
            let user = members::insert_user(&pool, &name, &email, admin).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Commands::SetAdmin { user_id, value } => {
            let pool = get_pool().await?;
            members::set_admin(&pool, user_id, value).await?;
            println!("User {} admin = {}", user_id, value);
        }
        Commands::AddProject { name } => {
            let pool = get_pool().await?;
            let project = members::insert_project(&pool, &name).await?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        Commands::AssignRole { project_id, user_id, role } => {
            let pool = get_pool().await?;
            let table = active_table()?;
            if !table.contains_role(&role) {
                eprintln!("warning: role '{}' is not in the role table; it will grant no capabilities", role);
            }
            let member = members::upsert_member(&pool, project_id, user_id, &role).await?;
            println!("{}", serde_json::to_string_pretty(&member)?);
        }
        Commands::ListMembers { project_id } => {
            let pool = get_pool().await?;
            if members::fetch_project(&pool, project_id).await?.is_none() {
                anyhow::bail!("project {} not found", project_id);
            }
            let resolver = AuthzResolver::new(Arc::new(active_table()?));
            for member in members::list_members(&pool, project_id).await? {
                let session = members::load_session(&pool, member.user_id, Some(project_id)).await?;
                let ctx = resolver.resolve(&session);
                let caps: Vec<&str> = ctx.capabilities().iter().map(|c| c.as_str()).collect();
                println!("{}  {:<18} {}", member.user_id, member.role, caps.join(","));
            }
        }
        Commands::IssueToken { user_id } => {
            let jwt = JwtConfig::from_env()?;
            println!("{}", jwt.encode(user_id)?);
        }
        Commands::ShowRoles => {
            let table = active_table()?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Commands::CheckDrift { other } => {
            let table = active_table()?;
            let other_table = RoleCapabilityMap::from_json_file(&other)?;
            let drift = table.drift(&other_table);
            if drift.is_empty() {
                println!("No drift against {}", other.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&drift)?);
                anyhow::bail!("role table drift detected against {}", other.display());
            }
        }
    }

    Ok(())
}

fn active_table() -> anyhow::Result<RoleCapabilityMap> {
    Ok(load_role_table(role_table_path_from_env().as_ref())?)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let options = database_url
        .parse::<SqliteConnectOptions>()
        .context("invalid DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let db_applied = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if db_applied.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let status = if applied_versions.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when run from the repo root, else the crate's own folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
