//! HTTP Server and Polling Wiring
//!
//! This module wires the exporter together: it builds the metrics registry and
//! the device list, binds the listener, then opens device sessions and starts
//! the poll scheduler in the background while serving the registry over HTTP.
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - 200 if at least one device's latest poll succeeded, 503 otherwise
//!
//! # Shutdown
//!
//! The server stops accepting connections when the shutdown future resolves
//! and waits for in-flight requests to finish. The scheduler is aborted after
//! the server has drained.

use crate::config::{Config, Credentials};
use crate::device::{SessionFactory, TapoSessionFactory};
use crate::metrics::MetricsRegistry;
use crate::poll::Device;
use crate::scheduler::{self, PollContext};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    metrics: MetricsRegistry,
}

/// Build the HTTP router serving `metrics`
pub fn router(metrics: MetricsRegistry) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { metrics })
}

/// Run the exporter until Ctrl-C.
pub async fn start(config: Config, credentials: Credentials) -> anyhow::Result<()> {
    let factory = Arc::new(TapoSessionFactory::new(credentials));
    run(config, factory, shutdown_signal()).await
}

/// Run the exporter with an explicit session factory until `shutdown` resolves.
pub async fn run<S>(
    config: Config,
    factory: Arc<dyn SessionFactory>,
    shutdown: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let metrics = MetricsRegistry::new(&config.polling.metric_prefix)?;
    let devices: Vec<Arc<Device>> = config
        .devices
        .iter()
        .cloned()
        .map(|device| Arc::new(Device::new(device)))
        .collect();

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let ctx = PollContext {
        factory,
        metrics: metrics.clone(),
    };
    let period = Duration::from_secs(config.polling.interval_seconds);
    let poller = tokio::spawn(async move {
        scheduler::establish_sessions(&devices, ctx.factory.as_ref()).await;
        scheduler::run(devices, ctx, period).await;
    });

    let served = serve(listener, metrics, shutdown).await;
    poller.abort();
    served
}

/// Serve `metrics` on `listener` until `shutdown` resolves.
pub async fn serve<S>(listener: TcpListener, metrics: MetricsRegistry, shutdown: S) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server gracefully stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down HTTP server...");
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>Device Telemetry Exporter</title></head>
<body>
<h1>Device Telemetry Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.metrics.any_device_up() {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "No device reachable",
        )
    }
}
