//! Edge Proxy
//!
//! A CORS-aware reverse proxy that sits between browsers and a backend
//! service, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────────┐
//!                              │                        EDGE PROXY                        │
//!                              │                                                          │
//!     Client Request           │  ┌──────────┐   ┌───────────┐   ┌─────────────┐          │
//!     ─────────────────────────┼─▶│ classify │──▶│  routing  │──▶│   headers   │          │
//!                              │  │(OPTIONS?)│   │prefix→port│   │ minimal set │          │
//!                              │  └────┬─────┘   └─────┬─────┘   └──────┬──────┘          │
//!                              │       │ preflight     │ no match       │                 │
//!                              │       ▼               ▼                ▼                 │
//!     Client Response          │  ┌────────────────────────────┐   ┌─────────────┐        │
//!     ◀────────────────────────┼──│ response (CORS overlay,    │◀──│  forwarder  │◀───────┼──── Backend
//!                              │  │ 204 / 200 / relay / 502)   │   │ (one shot)  │        │     Server
//!                              │  └────────────────────────────┘   └─────────────┘        │
//!                              │                                                          │
//!                              │  config · observability · lifecycle                      │
//!                              └──────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_proxy::config::load_config;
use edge_proxy::lifecycle::{wait_for_signal, Shutdown};
use edge_proxy::observability::{logging, metrics};
use edge_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "edge-proxy")]
#[command(about = "CORS-aware reverse proxy for a backend HTTP service", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!("edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        routes = ?config.routes,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config.clone())?;

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
