//! Fehlertypen fuer das Nachrichtenprotokoll

use thiserror::Error;

use crate::message::MessageType;

/// Fehler beim Dekodieren oder Validieren einer Nachricht
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    /// Frame ist kein gueltiges Nachrichten-JSON
    #[error("Ungueltiges JSON: {0}")]
    UngueltigesJson(#[from] serde_json::Error),

    /// Payload passt nicht zur Aktion (z.B. Zahl statt String bei "name")
    #[error("Falscher Payload fuer '{aktion}': erwartet {erwartet}, erhalten {erhalten}")]
    FalscherPayload {
        aktion: String,
        erwartet: &'static str,
        erhalten: &'static str,
    },

    /// Nachricht hat einen anderen Typ als erwartet
    #[error("Falscher Nachrichtentyp: erwartet={erwartet}, erhalten={erhalten}")]
    FalscherTyp {
        erwartet: MessageType,
        erhalten: MessageType,
    },
}

/// Result-Typ fuer das Nachrichtenprotokoll
pub type ProtokollResult<T> = Result<T, ProtokollFehler>;
