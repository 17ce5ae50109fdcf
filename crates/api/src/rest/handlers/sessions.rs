//! REST-Handler fuer Sitzungs-Endpunkte

use axum::{
    extract::{
        Path, State,
        ws::{WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use cinesync_core::SessionId;
use cinesync_signaling::{ClientConnection, SessionUebersicht, Sitzung};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::rest::ApiState;
use crate::ws;

#[derive(Debug, Serialize)]
pub struct SessionListe {
    #[serde(rename = "Sessions")]
    pub sessions: Vec<SessionUebersicht>,
}

/// Sucht eine Sitzung; unbekannte und ungueltige IDs sind gleichermassen 404
fn sitzung_finden(state: &ApiState, id: &str) -> ApiResult<Sitzung> {
    id.parse::<SessionId>()
        .ok()
        .and_then(|id| state.sessions.finden(&id))
        .ok_or_else(|| ApiError::NichtGefunden(format!("Sitzung {id}")))
}

/// GET /api/sessions
pub async fn liste(State(state): State<ApiState>) -> Json<SessionListe> {
    Json(SessionListe {
        sessions: state.sessions.liste(),
    })
}

/// POST /api/sessions/create
pub async fn erstellen(State(state): State<ApiState>) -> ApiResult<Response> {
    let id = state.sessions.erstellen()?;
    Ok((StatusCode::CREATED, [(header::LOCATION, id.to_string())]).into_response())
}

/// GET /api/sessions/:id
pub async fn abfragen(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionUebersicht>> {
    let sitzung = sitzung_finden(&state, &id)?;
    Ok(Json(sitzung.uebersicht()))
}

/// DELETE /api/sessions/:id
pub async fn beenden(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let sitzung = sitzung_finden(&state, &id)?;
    state.sessions.beenden(&sitzung.id())?;
    Ok(StatusCode::OK)
}

/// GET /api/sessions/:id/join
///
/// Die Sitzung wird vor dem Upgrade geprueft, damit unbekannte IDs auch
/// ohne WebSocket-Header ein 404 liefern.
pub async fn beitreten(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let sitzung = match sitzung_finden(&state, &id) {
        Ok(s) => s,
        Err(e) => return e.into_response(),
    };
    let upgrade = match upgrade {
        Ok(u) => u,
        Err(abgelehnt) => return abgelehnt.into_response(),
    };

    let config = state.sessions.config().clone();
    upgrade.on_upgrade(move |socket| async move {
        let client = ClientConnection::neu(sitzung.hub.clone(), &config);
        // Fehler wurden bereits in der Verbindung protokolliert
        let _ = client.verarbeiten(ws::frames(socket)).await;
    })
}
