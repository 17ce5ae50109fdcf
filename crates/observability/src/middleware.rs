//! Request-Timing Middleware fuer Axum
//!
//! Misst die Antwortzeit jeder HTTP-Anfrage, protokolliert sie als
//! strukturiertes Log-Event und erfasst sie in den Prometheus-Metriken.
//! Als Pfad-Label dient das Routen-Muster (`/api/sessions/:id`), nicht der
//! konkrete Pfad, damit Sitzungs-IDs keine neuen Zeitreihen erzeugen.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, Response},
    middleware::Next,
};
use std::time::Instant;

use crate::metrics::CinesyncMetrics;

/// Pfad-Label fuer Anfragen ohne passende Route (statische Dateien, 404)
pub const UNGEROUTET: &str = "<fallback>";

/// Axum-Middleware-Funktion: misst Antwortzeit, loggt und erfasst Metriken.
///
/// Verwendung:
/// ```ignore
/// Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(metriken, timing_middleware))
/// ```
pub async fn timing_middleware(
    State(metriken): State<CinesyncMetrics>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    let methode = req.method().to_string();
    let pfad = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNGEROUTET.to_string());
    let start = Instant::now();

    let response = next.run(req).await;

    let dauer = start.elapsed();
    let status = response.status().as_u16();
    metriken.http_anfrage_erfassen(&methode, &route, status, dauer);

    tracing::info!(
        method = %methode,
        path = %pfad,
        status = status,
        duration_ms = dauer.as_millis(),
        bucket = dauer_bucket(dauer.as_millis() as u64),
        "HTTP-Anfrage abgeschlossen"
    );

    response
}

/// Grobe Dauer-Klasse fuer Log-Auswertungen ohne Prometheus
pub fn dauer_bucket(dauer_ms: u64) -> &'static str {
    match dauer_ms {
        0..=1 => "<=1ms",
        2..=5 => "<=5ms",
        6..=10 => "<=10ms",
        11..=25 => "<=25ms",
        26..=50 => "<=50ms",
        51..=100 => "<=100ms",
        101..=250 => "<=250ms",
        251..=500 => "<=500ms",
        501..=1000 => "<=1s",
        _ => ">1s",
    }
}
