//! Admin gateway binary.
//!
//! Loads the TOML config (or defaults), starts logging and metrics, watches
//! the config file for route changes, and serves until SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use admin_gateway::config::{load_config, ConfigWatcher, GatewayConfig};
use admin_gateway::http::{spawn_reload_task, GatewayServer};
use admin_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use admin_gateway::observability::{init_logging, init_metrics};

#[derive(Parser, Debug)]
#[command(name = "admin-gateway", version, about = "Admin dashboard API gateway")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("admin-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(config)?;

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            spawn_reload_task(server.routes(), updates);
            Some(watcher.run()?)
        }
        None => None,
    };

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
