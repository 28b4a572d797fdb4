//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router that feeds every request into the pipeline
//! - Wire up transport middleware (tower-http tracing)
//! - Bind server to listener, with connect info for client addresses
//! - Emit the startup record and stop on shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::fields;
use crate::http::handlers::{self, HandlerSettings};
use crate::lifecycle::signals;
use crate::observability::StructuredLogger;
use crate::pipeline::Pipeline;

/// Application state injected into the entry handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// HTTP server for the sample service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    logger: StructuredLogger,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and logger.
    pub fn new(config: AppConfig, logger: StructuredLogger) -> Self {
        let settings = Arc::new(HandlerSettings::from_config(&config));
        let pipeline = Arc::new(Pipeline::standard(
            logger.clone(),
            handlers::route_table(),
            settings,
        ));
        let router = Self::build_router(pipeline);
        Self {
            router,
            config,
            logger,
        }
    }

    /// Every request, whatever its method or path, enters the pipeline.
    pub fn build_router(pipeline: Arc<Pipeline>) -> Router {
        Router::new()
            .fallback(pipeline_entry)
            .with_state(AppState { pipeline })
            .layer(TraceLayer::new_for_http())
    }

    /// Router clone, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a signal arrives or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        self.logger.info(
            format!("Sample app is running on port {}", addr.port()),
            fields! {
                "port" => addr.port(),
                "environment" => self.config.service.environment,
                "service" => self.config.service.name,
                "version" => env!("CARGO_PKG_VERSION"),
            },
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn pipeline_entry(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.pipeline.handle(request).await
}

async fn wait_for_shutdown(mut shutdown: broadcast::Receiver<()>) {
    tokio::select! {
        _ = signals::shutdown_signal() => {}
        _ = shutdown.recv() => {}
    }
    tracing::info!("Shutdown signal received");
}
