//! Console edge service.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────────┐
//!                  │                      CONSOLE EDGE                        │
//!                  │                                                          │
//!   Browser / CLI  │  ┌─────────┐  ┌────────┐  ┌──────────┐  ┌────────────┐  │
//!  ────────────────┼─▶│ headers │─▶│ origin │─▶│  rate    │─▶│ ws slots   │  │
//!                  │  └─────────┘  └────────┘  │  limit   │  │ (upgrades) │  │
//!                  │                           └──────────┘  └─────┬──────┘  │
//!                  │                                               ▼         │
//!                  │  ┌──────────────┐   ┌─────────┐   ┌───────────────────┐  │
//!  ◀───────────────┼──│  handlers    │◀──│  audit  │◀──│ session → Identity│  │
//!                  │  │ (namespace   │   └─────────┘   └───────────────────┘  │
//!                  │  │  authz)      │──────────────────────▶ repository     │
//!                  │  └──────────────┘                                        │
//!                  └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use console_edge::config::load_config;
use console_edge::lifecycle::{spawn_signal_listener, Shutdown};
use console_edge::observability::{logging, metrics};
use console_edge::{Collaborators, HttpServer};

#[derive(Parser)]
#[command(name = "console-edge")]
#[command(about = "Edge security layer for the cluster console", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "CONSOLE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_tracing(&config.observability);
    tracing::info!("console-edge v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_rps = config.rate_limit.api.requests_per_second,
        login_rps = config.rate_limit.login.requests_per_second,
        max_ws_per_ip = config.connections.max_per_ip,
        production = config.trust.production,
        "Configuration loaded"
    );

    if config.trust.production && config.trust.allowed_origins.is_empty() {
        tracing::warn!("ALLOWED_ORIGINS is empty in production; state-changing requests will be rejected");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let collaborators = Collaborators::from_config(&config);
    let server = HttpServer::new(config, collaborators);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
