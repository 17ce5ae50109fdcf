//! Nachrichten-Umschlag (Wire-Format)
//!
//! ```text
//! {"Type": "c" | "i" | "m" | "v", "Action": "<string>", "Data": <beliebiges JSON>}
//! ```
//!
//! Das Feld `subject` wird nie serialisiert. Bei eingehenden Nachrichten
//! traegt es den Absender (vom Hub gesetzt), bei ausgehenden den Empfaenger.
//! `None` bei ausgehenden Nachrichten bedeutet Broadcast an alle Clients.

use cinesync_core::types::ClientId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtokollResult;

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// Nachrichtentyp, auf dem Draht als Einzelbuchstabe kodiert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Wiedergabe-Steuerung (play, pause, seek, media)
    #[serde(rename = "c")]
    Control,
    /// Protokoll- und Verwaltungsnachrichten
    #[serde(rename = "i")]
    Info,
    /// Chat-Nachricht eines Zuschauers
    #[serde(rename = "m")]
    UserMessage,
    /// Aktuelle Zuschauerzahl
    #[serde(rename = "v")]
    ViewCount,
}

impl MessageType {
    /// Wire-Kuerzel des Typs
    pub fn kuerzel(&self) -> &'static str {
        match self {
            Self::Control => "c",
            Self::Info => "i",
            Self::UserMessage => "m",
            Self::ViewCount => "v",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kuerzel())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Eine Nachricht zwischen Client und Hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "Type")]
    pub kind: MessageType,
    /// Absender (eingehend) bzw. Empfaenger (ausgehend); nie auf dem Draht
    #[serde(skip)]
    pub subject: Option<ClientId>,
    #[serde(rename = "Action", default)]
    pub action: String,
    #[serde(rename = "Data", default)]
    pub data: Value,
}

impl Message {
    /// Erstellt eine Nachricht mit beliebigem Typ
    pub fn neu(
        kind: MessageType,
        subject: Option<ClientId>,
        action: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            kind,
            subject,
            action: action.into(),
            data,
        }
    }

    /// Info-Nachricht (gezielt wenn `subject` gesetzt, sonst Broadcast)
    pub fn info(subject: Option<ClientId>, action: impl Into<String>, data: Value) -> Self {
        Self::neu(MessageType::Info, subject, action, data)
    }

    /// Control-Nachricht
    pub fn control(subject: Option<ClientId>, action: impl Into<String>, data: Value) -> Self {
        Self::neu(MessageType::Control, subject, action, data)
    }

    /// Broadcast der aktuellen Zuschauerzahl
    pub fn view_count(anzahl: usize) -> Self {
        Self::neu(MessageType::ViewCount, None, "", Value::from(anzahl))
    }

    /// Chat-Broadcast; der Anzeigename des Absenders steht im Action-Feld
    pub fn user_message(name: impl Into<String>, data: Value) -> Self {
        Self::neu(MessageType::UserMessage, None, name, data)
    }

    /// Serialisiert die Nachricht ins Wire-Format (ohne `subject`)
    pub fn marshal(&self) -> ProtokollResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Dekodiert einen rohen Frame; `subject` ist danach immer `None`
    pub fn parse(rohdaten: &[u8]) -> ProtokollResult<Self> {
        Ok(serde_json::from_slice(rohdaten)?)
    }
}
