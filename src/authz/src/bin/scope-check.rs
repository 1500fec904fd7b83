//! scope-check - query the access engine from the command line
//!
//! Loads an org/role/assignment snapshot from JSON, evaluates one question
//! for one user and prints the answer as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use orgscope_authz::repository::{ConfigData, InMemoryConfigRepository, StaticSubordinates};
use orgscope_authz::{AccessEngine, EngineConfig, ResourceDescriptor, User, UserId};

/// OrgScope access check CLI
#[derive(Parser)]
#[command(name = "scope-check")]
#[command(about = "Evaluate data-scope access decisions against a configuration snapshot")]
#[command(version)]
struct Cli {
    /// Snapshot JSON with org_units, roles and scope_assignments
    #[arg(short, long, env = "ORGSCOPE_DATA")]
    data: PathBuf,

    /// User JSON (id, active, superuser, memberships, roles)
    #[arg(short, long)]
    user: PathBuf,

    /// Engine configuration (TOML)
    #[arg(short, long, env = "ORGSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Direct reports of the user, for TEAM scope
    #[arg(long, value_delimiter = ',')]
    subordinates: Vec<UserId>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the effective scope
    Resolve {
        #[arg(short, long)]
        resource: String,
    },

    /// Build the query filter
    Filter {
        #[arg(short, long)]
        resource: String,

        #[arg(long)]
        owner_field: Option<String>,

        #[arg(long)]
        org_field: Option<String>,

        #[arg(long)]
        manager_field: Option<String>,

        /// Override finance tagging (defaults to the configured resource types)
        #[arg(long)]
        finance_tagged: Option<bool>,
    },

    /// Check one entity
    Entity {
        #[arg(short, long)]
        resource: String,

        #[arg(long)]
        owner: Option<UserId>,

        #[arg(long)]
        org: Option<i64>,
    },

    /// Check approval rights on one step
    Approve {
        #[arg(short, long)]
        resource: String,

        #[arg(short, long, default_value_t = 1)]
        level: u32,

        #[arg(long)]
        required_role: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},orgscope_authz={}", log_level, log_level).into()),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load engine config {:?}", path))?,
        None => EngineConfig::default(),
    };

    let data = ConfigData::from_file(&cli.data)
        .with_context(|| format!("failed to load snapshot {:?}", cli.data))?;
    let user = load_user(&cli.user)?;
    info!(
        units = data.org_units.len(),
        roles = data.roles.len(),
        assignments = data.scope_assignments.len(),
        user_id = user.id,
        "snapshot loaded"
    );

    let subordinates = cli
        .subordinates
        .iter()
        .fold(StaticSubordinates::new(), |lookup, &report| lookup.with_report(user.id, report));

    let engine = AccessEngine::new(
        config,
        Arc::new(InMemoryConfigRepository::from_data(data)),
        Arc::new(subordinates),
    )?;

    let output = match cli.command {
        Command::Resolve { resource } => {
            let decision = engine.resolve_scope(&user, &resource).await?;
            json!({ "decision": decision })
        }
        Command::Filter {
            resource,
            owner_field,
            org_field,
            manager_field,
            finance_tagged,
        } => {
            let descriptor = ResourceDescriptor {
                resource_type: resource.clone(),
                owner_field,
                org_field,
                manager_field,
                finance_tagged,
            };
            let decision = engine.resolve_scope(&user, &resource).await?;
            let filter = engine.build_filter(&user, &resource, &descriptor).await?;
            json!({ "decision": decision, "filter": filter })
        }
        Command::Entity { resource, owner, org } => {
            let allowed = engine.can_access_entity(&user, &resource, owner, org).await?;
            json!({ "resource_type": resource, "owner_id": owner, "org_unit_id": org, "allowed": allowed })
        }
        Command::Approve {
            resource,
            level,
            required_role,
        } => {
            let allowed = engine
                .can_approve(&user, level, required_role.as_deref(), &resource)
                .await?;
            json!({
                "resource_type": resource,
                "level": level,
                "required_role": required_role,
                "can_approve": allowed,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_user(path: &Path) -> Result<User> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read user file {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("invalid user JSON in {:?}", path))
}
