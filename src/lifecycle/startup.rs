//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve configuration from CLI, environment, file and defaults
//! - Initialize logging, mounts and metrics in dependency order
//! - Bind the listener and serve until a termination signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Every mount is built before the listener is bound (traffic only
//!   when ready)

use std::error::Error;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

use super::shutdown::Shutdown;
use super::signals::spawn_signal_handler;
use crate::cli::GatewayArgs;
use crate::config::{Configuration, GatewayConfig};
use crate::http::GatewayServer;
use crate::observability::{logging, metrics};

/// Run the gateway until it is told to stop.
pub async fn run(args: GatewayArgs) -> Result<(), Box<dyn Error>> {
    let configuration = Configuration::resolve(args.overrides(), args.config.as_deref())?;
    let config = GatewayConfig::from_configuration(&configuration)?;

    logging::init_logging(&config.logging)?;
    configuration.log_sources();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = configuration.details(),
        port = config.port,
        port_source = configuration.source_of("PORT").unwrap_or("defaults"),
        "stashbox starting"
    );

    let server = GatewayServer::new(&config)?;

    if let Some(addr) = config.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
