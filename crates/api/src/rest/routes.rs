//! Route-Definitionen fuer die REST-API (/api/...)

use axum::{
    Router,
    routing::{get, post},
};

use crate::rest::{ApiState, handlers};

/// Erstellt den vollstaendigen /api/-Router
pub fn api_router() -> Router<ApiState> {
    Router::new()
        // Sitzungen
        .route("/api/sessions", get(handlers::sessions::liste))
        .route("/api/sessions/create", post(handlers::sessions::erstellen))
        .route(
            "/api/sessions/:id",
            get(handlers::sessions::abfragen).delete(handlers::sessions::beenden),
        )
        .route("/api/sessions/:id/join", get(handlers::sessions::beitreten))
        // Medien
        .route("/api/media", get(handlers::media::liste))
}
