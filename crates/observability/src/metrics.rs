//! Prometheus-kompatible Metriken fuer Cinesync
//!
//! Registrierte Metriken:
//! - `cinesync_sessions_active` – Gauge: Laufende Sitzungen
//! - `cinesync_connected_clients` – Gauge: Verbundene Clients ueber alle Sitzungen
//! - `cinesync_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `cinesync_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Alle Cinesync-Prometheus-Metriken
#[derive(Clone)]
pub struct CinesyncMetrics {
    pub registry: Arc<Registry>,

    // Sitzungs-Metriken
    pub sessions_active: IntGauge,
    pub connected_clients: IntGauge,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl CinesyncMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let sessions_active = IntGauge::with_opts(Opts::new(
            "cinesync_sessions_active",
            "Anzahl laufender Sitzungen",
        ))?;
        registry.register(Box::new(sessions_active.clone()))?;

        let connected_clients = IntGauge::with_opts(Opts::new(
            "cinesync_connected_clients",
            "Anzahl verbundener Clients ueber alle Sitzungen",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("cinesync_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "cinesync_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            sessions_active,
            connected_clients,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Erfasst eine abgeschlossene HTTP-Anfrage
    pub fn http_anfrage_erfassen(&self, methode: &str, pfad: &str, status: u16, dauer: Duration) {
        self.http_requests_total
            .with_label_values(&[methode, pfad, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[methode, pfad])
            .observe(dauer.as_secs_f64());
    }

    /// Setzt die Sitzungs-Gauges aus einer Momentaufnahme
    pub fn sitzungen_setzen(&self, sitzungen: usize, clients: usize) {
        self.sessions_active.set(sitzungen as i64);
        self.connected_clients.set(clients as i64);
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: CinesyncMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<CinesyncMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = CinesyncMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn sitzungen_setzen() {
        let metriken = CinesyncMetrics::neu().unwrap();
        metriken.sitzungen_setzen(3, 17);
        assert_eq!(metriken.sessions_active.get(), 3);
        assert_eq!(metriken.connected_clients.get(), 17);
    }

    #[test]
    fn http_anfrage_mit_labels() {
        let metriken = CinesyncMetrics::neu().unwrap();
        metriken.http_anfrage_erfassen("GET", "/api/sessions", 200, Duration::from_millis(3));
        metriken.http_anfrage_erfassen("GET", "/api/sessions", 200, Duration::from_millis(4));
        let wert = metriken
            .http_requests_total
            .with_label_values(&["GET", "/api/sessions", "200"])
            .get();
        assert_eq!(wert, 2);
        let anzahl = metriken
            .http_request_duration_seconds
            .with_label_values(&["GET", "/api/sessions"])
            .get_sample_count();
        assert_eq!(anzahl, 2);
    }

    #[test]
    fn export_prometheus_format() {
        let metriken = CinesyncMetrics::neu().unwrap();
        metriken.sitzungen_setzen(1, 2);
        let output = metriken.exportieren().unwrap();
        assert!(output.contains("cinesync_sessions_active 1"));
        assert!(output.contains("cinesync_connected_clients 2"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[tokio::test]
    async fn metrics_endpunkt() {
        let metriken = CinesyncMetrics::neu().unwrap();
        metriken.sitzungen_setzen(4, 0);
        let antwort = metrics_router(metriken)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);
        let body = to_bytes(antwort.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("cinesync_sessions_active 4"));
    }
}
