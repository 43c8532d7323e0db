//! API Gateway
//!
//! Single entry point in front of the backend services.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                     API GATEWAY                      │
//!   Client Request   │  ┌──────────┐   ┌──────────┐   ┌──────┐   ┌───────┐  │
//!   ─────────────────┼─▶│access log│──▶│rate limit│──▶│ auth │──▶│ route │  │
//!                    │  │ + metrics│   │ (bucket) │   └──┬───┘   └───┬───┘  │
//!                    │  └────▲─────┘   └──────────┘      │           │      │
//!                    │       │                           ▼           ▼      │
//!   Client Response  │       │                   ┌──────────────┐ ┌──────┐  │
//!   ◀────────────────┼───────┴───────────────────│   identity   │ │proxy │◀─┼── Upstream
//!                    │                           │   service    │ │      │──┼─▶ services
//!                    │                           └──────────────┘ └──────┘  │
//!                    │  /health, /metrics answered without auth or limits   │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::load_config;
use api_gateway::observability::logging::init_logging;
use api_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Authenticating, rate-limiting API gateway", long_about = None)]
struct Cli {
    /// TOML config file. Defaults plus environment overrides apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    init_logging(&config.observability);

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        identity_service = %config.identity.service_url,
        rate_limit_enabled = config.rate_limit.enabled,
        rate_limit_capacity = config.rate_limit.capacity,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    shutdown.trigger_on_signal();

    let server = GatewayServer::new(config)?;
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
