//! Fehlertypen fuer den Signaling-Service

use cinesync_core::types::SessionId;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Die Ereignisschleife des Hubs laeuft nicht mehr
    #[error("Hub beendet")]
    HubBeendet,

    /// Unbekannte Sitzungs-ID
    #[error("Sitzung nicht gefunden: {0}")]
    SitzungNichtGefunden(SessionId),

    /// Erzeugte Sitzungs-ID ist bereits vergeben
    #[error("Sitzung existiert bereits: {0}")]
    SitzungExistiert(SessionId),
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
