//! dualplane-server - the dual-plane agent synchronization coordinator
//!
//! Wires together the private ledger, the Ed25519 identity registry, the
//! semantic-conflict detector, the quorum voting coordinator, and the CRDT
//! projector behind one HTTP/WebSocket surface (§6).
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings
//! dualplane-server
//!
//! # Start with a config file
//! dualplane-server --config /path/to/config.toml
//!
//! # Start with environment overrides
//! DUALPLANE__SERVER__PORT=4433 dualplane-server
//! ```

mod config;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dualplane_conflict::ConflictDetector;
use dualplane_ledger::Ledger;
use dualplane_projector::{Projector, RoomRegistry};
use dualplane_registry::Registry;
use dualplane_transport::{create_router, AppState};
use dualplane_voting::VotingCoordinator;

use crate::config::ServerConfig;

/// dualplane-server - private ledger, registry, voting and projector
/// behind one coordinator process.
#[derive(Parser, Debug)]
#[command(name = "dualplane-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "DUALPLANE_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "DUALPLANE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DUALPLANE_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DUALPLANE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, env = "DUALPLANE_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;

    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    server_config.logging.level = args.log_level;
    server_config.logging.format = args.log_format;

    init_logging(&server_config.logging)?;

    tracing::info!( version = env!("CARGO_PKG_VERSION"),
        "starting dual-plane coordinator"
    );

    validate_config(&server_config)?;

    let registry = Registry::new();
    let ledger = Ledger::with_registry(registry.clone());
    let voting = VotingCoordinator::new(registry.clone(), ledger.clone());
    let conflict = ConflictDetector::new(voting.clone());
    let rooms = RoomRegistry::default();

    let projector = Arc::new(Projector::new( ledger.clone(),
            conflict,
            rooms.clone(),
            (&server_config.projector).into(),
    ));
    let projector_handle = tokio::spawn({
            let projector = projector.clone();
            async move { projector.run().await }
    });

    if server_config.metrics.enabled {
        start_metrics_server(&server_config.metrics).await?;
    }

    let state = AppState::new(registry, ledger, voting, rooms);
    let app = create_router(state);

    let addr = server_config.server.socket_addr()?;
    tracing::info!(host = %server_config.server.host, port = server_config.server.port, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
    .await?;

    projector_handle.abort();
    tracing::info!("server shutdown complete");

    Ok(())
}

fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber.with(fmt::layer().json().with_target(true)).init();
        }
        _ => {
            subscriber.with(fmt::layer().pretty().with_target(true)).init();
        }
    }

    Ok(())
}

/// Fatal-only startup checks (spec §6.5: "exits non-zero only on fatal
/// startup errors... TLS materials missing, port busy").
fn validate_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.server.tls_enabled
    && (config.server.tls_cert.is_none() || config.server.tls_key.is_none())
    {
        anyhow::bail!("TLS is enabled but certificate or key path is not set");
    }
    Ok(())
}

async fn start_metrics_server(config: &config::MetricsConfig) -> anyhow::Result<()> {
    if let Some(port) = config.port {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        tracing::info!(port, "starting metrics server");

        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder.with_http_listener(addr).install_recorder()?;

        tokio::spawn(async move {
                let _handle = handle;
                std::future::pending::<()>().await;
        });
    }

    Ok(())
}

async fn shutdown_signal(timeout: std::time::Duration) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to install SIGTERM handler")
        .recv()
        .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        }
    }

    tracing::info!(timeout_secs = timeout.as_secs(), "waiting for in-flight requests to complete");
    tokio::time::sleep(timeout).await;
}
