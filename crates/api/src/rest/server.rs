//! Axum HTTP-Server fuer Cinesync

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware;
use cinesync_observability::{CinesyncMetrics, timing_middleware};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::rest::{ApiState, routes::api_router};

/// REST-Server-Konfiguration
#[derive(Debug, Clone)]
pub struct RestServerKonfig {
    pub bind_addr: SocketAddr,
    /// Erlaubte CORS-Origins. Leer = alle Origins erlaubt.
    pub cors_origins: Vec<String>,
    /// Statische Web-Oberflaeche (alles ausserhalb von /api und /media)
    pub web_verzeichnis: PathBuf,
    /// Ausgelieferte Medien unter /media
    pub medien_verzeichnis: PathBuf,
}

impl Default for RestServerKonfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_origins: vec![],
            web_verzeichnis: PathBuf::from("./web"),
            medien_verzeichnis: PathBuf::from("./media"),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let erlaubt: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ungueltiger CORS-Origin ignoriert");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(erlaubt)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::LOCATION])
}

/// Baut den vollstaendigen Router (API, Medien, Web-Oberflaeche)
pub fn router_bauen(
    konfig: &RestServerKonfig,
    state: ApiState,
    metriken: CinesyncMetrics,
) -> Router {
    api_router()
        // Timing als innersten Layer, damit das Routen-Muster bekannt ist
        .route_layer(middleware::from_fn_with_state(metriken, timing_middleware))
        .nest_service("/media", ServeDir::new(&konfig.medien_verzeichnis))
        .fallback_service(ServeDir::new(&konfig.web_verzeichnis))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&konfig.cors_origins)),
        )
        .with_state(state)
}

/// Axum HTTP-Server fuer Cinesync
pub struct RestServer {
    konfig: RestServerKonfig,
}

impl RestServer {
    pub fn neu(konfig: RestServerKonfig) -> Self {
        Self { konfig }
    }

    /// Startet den REST-Server; laeuft bis `shutdown` abgeschlossen ist
    pub async fn starten(
        self,
        state: ApiState,
        metriken: CinesyncMetrics,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let app = router_bauen(&self.konfig, state, metriken);

        let listener = tokio::net::TcpListener::bind(self.konfig.bind_addr).await?;
        tracing::info!(
            addr = %self.konfig.bind_addr,
            web = %self.konfig.web_verzeichnis.display(),
            medien = %self.konfig.medien_verzeichnis.display(),
            "REST-Server gestartet"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
