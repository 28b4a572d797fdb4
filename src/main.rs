//! Sample service entry point.
//!
//! Runs on a current-thread runtime: requests interleave only where a
//! handler awaits.

use tokio::net::TcpListener;

use correlated_sample_app::config;
use correlated_sample_app::observability::logging;
use correlated_sample_app::{HttpServer, Shutdown, StructuredLogger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::from_env()?;

    logging::init_tracing(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "correlated-sample-app starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        environment = %config.service.environment,
        sink = %config.observability.sink,
        max_delay_ms = config.data.max_delay_ms,
        "Configuration loaded"
    );

    let logger = StructuredLogger::new(logging::build_sink(config.observability.sink));

    let listener = TcpListener::bind(config.listener.bind_address()).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, logger);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
