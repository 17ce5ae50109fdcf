//! Health-Check-Endpunkt fuer Cinesync
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Startzeit, Uptime und Sitzungsanzahl

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Server faehrt herunter
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub sessions_active: usize,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    start_instant: Arc<Instant>,
    started_at: DateTime<Utc>,
    sessions: Arc<AtomicUsize>,
    herunterfahren: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::neu()
    }
}

impl HealthState {
    pub fn neu() -> Self {
        Self {
            start_instant: Arc::new(Instant::now()),
            started_at: Utc::now(),
            sessions: Arc::new(AtomicUsize::new(0)),
            herunterfahren: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_instant.elapsed().as_secs()
    }

    pub fn sitzungen_setzen(&self, anzahl: usize) {
        self.sessions.store(anzahl, Ordering::Relaxed);
    }

    pub fn sitzungen(&self) -> usize {
        self.sessions.load(Ordering::Relaxed)
    }

    /// Markiert den Server als herunterfahrend (Health liefert dann 503)
    pub fn herunterfahren_melden(&self) {
        self.herunterfahren.store(true, Ordering::Relaxed);
    }

    pub fn status(&self) -> HealthStatus {
        if self.herunterfahren.load(Ordering::Relaxed) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status();
    let http_status = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        uptime_seconds: state.uptime_seconds(),
        sessions_active: state.sitzungen(),
    };

    (http_status, Json(response))
}
