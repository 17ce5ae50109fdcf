//! Gemeinsame Identifikationstypen fuer Cinesync
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Sitzungs- und Client-IDs zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Eindeutige Sitzungs-ID
///
/// Basiert auf UUID v7 (Zeitstempel + Zufallsanteil). Dadurch sind IDs auch
/// bei gleichzeitiger Erzeugung kollisionsresistent und die lexikografische
/// Ordnung entspricht der Erstellungsreihenfolge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Erstellt eine neue, zeitlich geordnete SessionId
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identitaet einer einzelnen Client-Verbindung
///
/// Zwei Clients mit gleichem Anzeigenamen sind verschiedene Clients; die
/// Gleichheit haengt ausschliesslich an dieser ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Erstellt eine neue zufaellige ClientId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_eindeutig() {
        let a = ClientId::new();
        let b = ClientId::new();
        assert_ne!(a, b, "Zwei neue ClientIds muessen verschieden sein");
    }

    #[test]
    fn session_id_eindeutig_und_geordnet() {
        let ids: Vec<SessionId> = (0..100).map(|_| SessionId::new()).collect();
        for paar in ids.windows(2) {
            assert_ne!(paar[0], paar[1]);
            assert!(paar[0] < paar[1], "v7-IDs muessen monoton steigen");
        }
    }

    #[test]
    fn session_id_display_und_parse() {
        let id = SessionId::new();
        let text = id.to_string();
        let geparst: SessionId = text.parse().unwrap();
        assert_eq!(geparst, id);
    }

    #[test]
    fn session_id_parse_ungueltig() {
        assert!("kein-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn client_id_display() {
        let id = ClientId(Uuid::nil());
        assert!(id.to_string().starts_with("client:"));
    }

    #[test]
    fn session_id_serialisiert_als_string() {
        let id = SessionId(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
