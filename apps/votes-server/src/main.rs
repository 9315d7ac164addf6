mod db;
mod http;
mod request_id;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use runtime::{AppConfig, CliArgs};
use tokio_util::sync::CancellationToken;
use users_votes::api::rest::{self, RestState};
use users_votes::config::UsersVotesConfig;
use users_votes::domain::service::Service;
use users_votes::infra::storage::{SeaOrmUsersRepository, SeaOrmVotesRepository};

const MODULE_NAME: &str = "users_votes";

/// Votes Server - user accounts and peer votes over HTTP
#[derive(Parser)]
#[command(name = "votes-server")]
#[command(about = "Votes Server - user accounts and peer votes over HTTP")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.data_dir))
        .context("Failed to initialize logging")?;
    tracing::info!("Votes Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let module_cfg: UsersVotesConfig = config.module_config(MODULE_NAME)?;
    let db_cfg = config
        .database
        .clone()
        .ok_or_else(|| anyhow!("No database configuration found"))?;

    let db = db::connect_and_migrate(&db_cfg, Path::new(&config.server.data_dir)).await?;

    let service = Arc::new(Service::new(
        Arc::new(SeaOrmUsersRepository::new(db.clone())),
        Arc::new(SeaOrmVotesRepository::new(db)),
        module_cfg.service_config(),
    ));

    let shutdown = CancellationToken::new();
    let mut state = RestState::new(service, module_cfg).with_shutdown(shutdown.clone());
    if let Some(timeout) = config.server.request_timeout {
        state = state.with_request_timeout(timeout);
    }

    let app = http::build_router(rest::router(Arc::new(state)), config.server.request_timeout);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("HTTP server failed")?;

    tracing::info!("Votes Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM and cancels every in-flight call.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    token.cancel();
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let module_cfg: UsersVotesConfig = config.module_config(MODULE_NAME)?;
    if module_cfg.default_page_size == 0 {
        return Err(anyhow!("modules.{MODULE_NAME}.default_page_size must be at least 1"));
    }
    if let Some(db) = &config.database {
        db::check_backend(&db.url)?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
