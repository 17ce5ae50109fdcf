//! Fehlertypen fuer die Cinesync-HTTP-Schnittstelle

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cinesync_signaling::SignalingError;
use serde_json::json;
use thiserror::Error;

/// Alle moeglichen Fehler im API-Crate
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Ressource nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Sitzung konnte nicht erstellt werden: {0}")]
    SitzungErstellen(String),

    #[error("Medienverzeichnis nicht lesbar: {0}")]
    Medien(#[from] std::io::Error),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<SignalingError> for ApiError {
    fn from(e: SignalingError) -> Self {
        match &e {
            SignalingError::SitzungNichtGefunden(id) => Self::NichtGefunden(format!("Sitzung {id}")),
            SignalingError::SitzungExistiert(_) => Self::SitzungErstellen(e.to_string()),
            SignalingError::HubBeendet => Self::Intern(e.to_string()),
        }
    }
}

impl ApiError {
    /// HTTP-Statuscode fuer REST-Fehler
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NichtGefunden(_) => StatusCode::NOT_FOUND,
            Self::SitzungErstellen(_) | Self::Medien(_) | Self::Intern(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(fehler = %self, "Anfrage fehlgeschlagen");
        } else {
            tracing::debug!(fehler = %self, "Anfrage abgelehnt");
        }
        (
            status,
            Json(json!({
                "error": {
                    "code": status.as_u16(),
                    "message": self.to_string()
                }
            })),
        )
            .into_response()
    }
}
