//! # cinesync-observability
//!
//! Observability-Crate fuer Cinesync:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured JSON Logging via tracing-subscriber
//! - Request-Timing Middleware

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{HealthResponse, HealthState, HealthStatus, health_router};
pub use logging::logging_initialisieren;
pub use metrics::{CinesyncMetrics, metrics_router};
pub use middleware::timing_middleware;

use anyhow::Result;
use std::future::Future;
use std::net::SocketAddr;

/// Startet den Observability-HTTP-Server (Metriken + Health)
///
/// Endpunkte:
/// - `GET /metrics` – Prometheus scrape format
/// - `GET /health`  – Health-Check JSON
///
/// Laeuft bis `shutdown` abgeschlossen ist.
pub async fn observability_server_starten(
    bind_addr: SocketAddr,
    metriken: CinesyncMetrics,
    health: HealthState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    use axum::Router;

    let app = Router::new()
        .merge(metrics_router(metriken))
        .merge(health_router(health));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Observability-Server gestartet");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
