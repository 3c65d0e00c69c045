//! Assistance Gateway
//!
//! Backend gateway between the assistance dashboard and the AI inference
//! service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────────┐
//!                     │                  ASSIST GATEWAY                    │
//!   POST              │  ┌────────────┐   ┌───────────┐   ┌─────────────┐  │
//!   /api/assistance ──┼─▶│ rate limit │──▶│ validator │──▶│  upstream   │──┼──▶ POST /infer
//!                     │  │ (per IP)   │   │ (trim,len)│   │ client (10s)│  │    inference
//!                     │  └─────┬──────┘   └─────┬─────┘   └──────┬──────┘  │    service
//!                     │        │ 429            │ 400            │ 200/5xx │
//!   ◀─────────────────┼────────┴────────────────┴────────────────┘         │
//!                     │                                                    │
//!                     │  Cross-cutting: config, request id, tracing,       │
//!                     │  security headers, CORS, latency histogram,        │
//!                     │  /health, /metrics, graceful shutdown              │
//!                     └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use assist_gateway::config::load_config;
use assist_gateway::lifecycle::{wait_for_signal, Shutdown};
use assist_gateway::observability::{logging, metrics};
use assist_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "assist-gateway", version)]
#[command(about = "Rate-limited gateway in front of the AI inference service", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    logging::init(&config.observability)?;

    tracing::info!("assist-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        upstream_timeout_ms = config.upstream.timeout_ms,
        rate_limit_window_ms = config.rate_limit.window_ms,
        rate_limit_max = config.rate_limit.max_requests,
        environment = %config.environment,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();

    let mut server = HttpServer::new(config.clone())?;

    if config.observability.metrics_enabled {
        match metrics::install_recorder() {
            Ok(handle) => {
                let upkeep = handle.clone();
                let mut stop = shutdown.subscribe();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(Duration::from_secs(5));
                    loop {
                        tokio::select! {
                            _ = ticker.tick() => upkeep.run_upkeep(),
                            _ = stop.recv() => break,
                        }
                    }
                });
                server = server.with_metrics(handle);
            }
            Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
