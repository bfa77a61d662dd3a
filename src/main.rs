use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use glacier_drain::core::{Orchestrator, TracingReporter};
use glacier_drain::{adapters, config, context, db, logging, vault_list};

#[derive(Parser)]
#[command(name = "glacier-drain")]
#[command(about = "Delete every archive in a list of Glacier vaults, then the vaults", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./glacier-drain.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run against an in-memory storage tier instead of AWS
    #[arg(long, global = true)]
    simulation: Option<bool>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drain every vault named in the vault list
    Drain(DrainArgs),
    /// Show recent drains recorded in the ledger
    History {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Args)]
struct DrainArgs {
    #[arg(long)]
    vault_list: Option<PathBuf>,

    #[arg(long)]
    region: Option<String>,

    #[arg(long)]
    delete_vault: Option<bool>,

    #[arg(long)]
    verbose: Option<bool>,

    #[arg(long)]
    json: Option<bool>,

    #[arg(long)]
    max_poll_wait_secs: Option<u64>,
}

/// CLI values layered over file and environment configuration.
#[derive(Serialize, Default)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    vault_list: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_vault: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    simulation: Option<bool>,
    logging: LoggingOverrides,
    polling: PollingOverrides,
}

#[derive(Serialize, Default)]
struct LoggingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    json: Option<bool>,
}

#[derive(Serialize, Default)]
struct PollingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_wait_secs: Option<u64>,
}

impl Overrides {
    fn new(simulation: Option<bool>, args: Option<&DrainArgs>) -> Self {
        let mut overrides = Self {
            simulation,
            ..Default::default()
        };
        if let Some(args) = args {
            overrides.vault_list = args.vault_list.clone();
            overrides.region = args.region.clone();
            overrides.delete_vault = args.delete_vault;
            overrides.logging.verbose = args.verbose;
            overrides.logging.json = args.json;
            overrides.polling.max_wait_secs = args.max_poll_wait_secs;
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let drain_args = match &cli.command {
        Commands::Drain(args) => Some(args),
        Commands::History { .. } => None,
    };
    let overrides = Overrides::new(cli.simulation, drain_args);
    let config = config::AppConfig::new(cli.config.as_deref(), Some(&overrides))
        .context("Failed to load configuration")?;

    match &cli.command {
        Commands::Drain(_) => {
            logging::init(logging::LogConfig::from(&config.logging))?;
            run_drain(config).await.context("Drain run failed")?
        }
        Commands::History { limit } => run_history(&config, *limit)
            .await
            .context("Failed to read drain history")?,
    }

    Ok(())
}

async fn run_drain(config: config::AppConfig) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), region = %config.region, simulation = config.simulation, "glacier-drain starting");

    // A missing or empty list ends the run without an error exit.
    let Some(vaults) = vault_list::load_for_run(&config.vault_list) else {
        return Ok(());
    };

    let db_conn = db::init(&config.database_path).await?;
    let client = adapters::get_client(&config, &vaults).await;
    let ctx = context::AppContext::new(config, db_conn, client, Arc::new(TracingReporter));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping at the next pause");
            on_signal.cancel();
        }
    });

    Orchestrator::new(ctx).run(&vaults, &cancel).await;
    Ok(())
}

async fn run_history(config: &config::AppConfig, limit: u32) -> Result<()> {
    let db_conn = db::init(&config.database_path).await?;
    let drains = db::drains::recent(&db_conn, limit).await?;

    if drains.is_empty() {
        println!("No drains recorded in {}", config.database_path.display());
        return Ok(());
    }

    println!(
        "{:<36}  {:<24}  {:<20}  {:>10}  {:>8}  {:<7}  {}",
        "DRAIN", "VAULT", "STATUS", "DELETED", "FAILED", "REMOVED", "STARTED"
    );
    for d in drains {
        println!(
            "{:<36}  {:<24}  {:<20}  {:>10}  {:>8}  {:<7}  {}",
            d.id,
            d.vault_name,
            d.status,
            d.archives_succeeded.map_or("-".to_string(), |n| n.to_string()),
            d.archives_failed.map_or("-".to_string(), |n| n.to_string()),
            if d.vault_deleted { "yes" } else { "no" },
            d.created_at
        );
    }

    Ok(())
}
