mod auth;
mod config;
mod http;
mod routes;
mod seed;
mod worker;

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_db::DbPool;
use platform_obs::{ObsConfig, init_tracing};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "crm-server", version, about = "Pipeline CRM")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the REST API and the reminder worker.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Create a demo user, organization and deals.
    Seed,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    let config = Arc::new(AppConfig::load()?);
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up(&config).await,
            MigrateCommand::Down => migrate_down(&config).await,
        },
        Command::Seed => run_seed(&config).await,
    }
}

async fn setup_pool(config: &AppConfig) -> Result<DbPool> {
    config.database.connect().await.map_err(Into::into)
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let pool = setup_pool(&config).await?;
    ensure_migrations(&pool, cmd.allow_dirty).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        http::shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let worker = if config.reminders_enabled {
        Some(tokio::spawn(worker::run_reminders(
            pool.clone(),
            config.reminder_interval,
            shutdown_rx.clone(),
        )))
    } else {
        info!("reminder worker disabled");
        None
    };

    let state = AppState::new(pool, config.clone());
    let served = http::serve((&cmd).into(), state, shutdown_rx).await;

    if let Some(worker) = worker {
        if let Err(err) = worker.await {
            warn!(error = %err, "reminder worker ended abnormally");
        }
    }
    served
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if pending.is_empty() {
        return Ok(());
    }
    if !allow_dirty {
        anyhow::bail!(
            "{} pending migrations; run `crm-server migrate up` or pass --allow-dirty",
            pending.len()
        );
    }
    warn!(pending = pending.len(), "starting with pending migrations");
    Ok(())
}

async fn migrate_up(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

async fn run_seed(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    ensure_migrations(&pool, false).await?;
    seed::run(&pool, &config.tokens).await
}
