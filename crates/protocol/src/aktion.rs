//! Validierte Info-Aktionen
//!
//! Das `Data`-Feld einer Nachricht ist untypisiertes JSON. Bevor die
//! Sitzungslogik eine Info-Nachricht auswertet, wird sie hier in eine
//! typisierte Variante ueberfuehrt. Passt der Payload nicht zur Aktion,
//! entsteht ein `ProtokollFehler` statt eines Absturzes.

use serde_json::Value;

use crate::error::{ProtokollFehler, ProtokollResult};
use crate::message::{Message, MessageType};

/// Bekannte Werte des `Action`-Felds
pub mod aktionen {
    /// Synthetisch vom Hub: Client hat sich verbunden
    pub const REGISTER: &str = "register";
    /// Synthetisch vom Hub: Client wurde entfernt
    pub const DEREGISTER: &str = "deregister";
    /// Liste der Anzeigenamen anfordern bzw. senden
    pub const USERS: &str = "users";
    /// Eigenen Anzeigenamen setzen
    pub const NAME: &str = "name";
    /// Medium waehlen (Leader) bzw. aktuelles Medium nachfragen
    pub const MEDIA: &str = "media";
    /// Vorschaubild der Sitzung setzen (nur Leader)
    pub const THUMBNAIL: &str = "thumbnail";
    /// Gezielte Mitteilung: Empfaenger ist jetzt Leader
    pub const LEADER: &str = "leader";
}

/// Typisierte Info-Aktion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoAktion {
    Registrieren,
    Abmelden,
    Benutzer,
    Name(String),
    Medium(String),
    Vorschaubild(String),
    /// Unbekannte Aktion, wird von der Sitzungslogik ignoriert
    Unbekannt(String),
}

impl InfoAktion {
    /// Validiert eine Info-Nachricht und extrahiert den Payload
    pub fn aus_nachricht(nachricht: &Message) -> ProtokollResult<Self> {
        if nachricht.kind != MessageType::Info {
            return Err(ProtokollFehler::FalscherTyp {
                erwartet: MessageType::Info,
                erhalten: nachricht.kind,
            });
        }

        let aktion = match nachricht.action.as_str() {
            aktionen::REGISTER => Self::Registrieren,
            aktionen::DEREGISTER => Self::Abmelden,
            aktionen::USERS => Self::Benutzer,
            aktionen::NAME => Self::Name(text_payload(nachricht)?),
            aktionen::MEDIA => Self::Medium(text_payload(nachricht)?),
            aktionen::THUMBNAIL => Self::Vorschaubild(text_payload(nachricht)?),
            andere => Self::Unbekannt(andere.to_string()),
        };
        Ok(aktion)
    }
}

/// Erwartet einen String im `Data`-Feld
fn text_payload(nachricht: &Message) -> ProtokollResult<String> {
    match &nachricht.data {
        Value::String(s) => Ok(s.clone()),
        anderer => Err(ProtokollFehler::FalscherPayload {
            aktion: nachricht.action.clone(),
            erwartet: "string",
            erhalten: json_typ(anderer),
        }),
    }
}

/// Name des JSON-Typs fuer Fehlermeldungen
pub fn json_typ(wert: &Value) -> &'static str {
    match wert {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
