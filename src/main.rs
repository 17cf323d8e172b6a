//! Main entry point for the Rally Rankings service
//!
//! Loads configuration, initializes logging, and serves the HTTP API until
//! SIGINT or SIGTERM arrives.

use anyhow::Result;
use clap::Parser;
use rally_rankings::config::{validate_config, AppConfig};
use rally_rankings::service::{
    HealthCheck, HealthStatus, HttpServer, HttpServerConfig, RankingService,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// Rally Rankings - Elo ratings for head-to-head games
#[derive(Parser)]
#[command(
    name = "rally-rankings",
    version,
    about = "Track 1-v-1 games in groups and rate players with Elo",
    long_about = "Rally Rankings records head-to-head games played inside named groups. \
                 Finalizing a game updates both players' global Elo ratings and appends \
                 an auditable rating change for each of them."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Perform health check and exit
    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP host override
    #[arg(long, value_name = "HOST", help = "Override HTTP bind host")]
    http_host: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// K-factor override
    #[arg(long, value_name = "K", help = "Override the Elo K-factor")]
    k_factor: Option<f64>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Perform health check and exit with the matching status code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let service = RankingService::new(config)?;
    service.set_running(true).await;

    match HealthCheck::check(&service).await {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            println!("  Players: {}", health.stats.players);
            println!("  Groups: {}", health.stats.groups);
            println!("  Games: {}", health.stats.games);
            println!("  Ledger entries: {}", health.stats.ledger_entries);

            if health.status == HealthStatus::Healthy {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Log periodic health summaries while the service runs
async fn health_check_task(service: Arc<RankingService>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    while service.is_running().await {
        interval.tick().await;

        match HealthCheck::check(&service).await {
            Ok(health) => {
                info!(
                    "Health check: {} - {} players, {} games, {} ledger entries",
                    health.status,
                    health.stats.players,
                    health.stats.games,
                    health.stats.ledger_entries
                );
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
            }
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Rally Rankings Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   HTTP: {}", config.http_addr());
    info!("   K-factor: {}", config.rating.k_factor);
    info!("   Initial rating: {}", config.rating.initial_rating);
    info!("   Rating floor: {}", config.rating.rating_floor);
}

/// Load and merge configuration from environment, file and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(host) = &args.http_host {
        config.http.host = host.clone();
    }

    if let Some(port) = args.http_port {
        config.http.port = port;
    }

    if let Some(k_factor) = args.k_factor {
        config.rating.k_factor = k_factor;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Some(path) = &args.config {
        info!("Loaded configuration from: {}", path.display());
    }

    if args.health_check {
        return perform_health_check(config).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let service = match RankingService::new(config.clone()) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let server = Arc::new(HttpServer::new(
        HttpServerConfig {
            host: config.http.host.clone(),
            port: config.http.port,
        },
        service.clone(),
    ));

    let mut server_task = {
        let server = server.clone();
        tokio::spawn(async move { server.start().await })
    };

    service.set_running(true).await;

    let health_task = {
        let service = service.clone();
        tokio::spawn(async move {
            health_check_task(service).await;
        })
    };

    info!("Rally Rankings Service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            info!("Shutdown signal received, beginning graceful shutdown...");
        }
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => warn!("HTTP server exited unexpectedly"),
                Ok(Err(e)) => error!("HTTP server failed: {:#}", e),
                Err(e) => error!("HTTP server task panicked: {}", e),
            }
            service.set_running(false).await;
            health_task.abort();
            std::process::exit(1);
        }
    }

    service.set_running(false).await;
    health_task.abort();
    server.stop();

    // In-flight requests, finalizations included, run to completion or roll back
    match tokio::time::timeout(config.shutdown_timeout(), server_task).await {
        Ok(Ok(Ok(()))) => info!("Graceful shutdown completed successfully"),
        Ok(Ok(Err(e))) => error!("HTTP server failed during shutdown: {:#}", e),
        Ok(Err(e)) => error!("HTTP server task panicked: {}", e),
        Err(_) => warn!("Shutdown timeout exceeded, forcing exit"),
    }

    info!("Rally Rankings Service stopped");
    Ok(())
}
