//! Fehlertypen fuer Cinesync
//!
//! Zentraler Fehler-Enum der die Fehlerzustaende ausserhalb der einzelnen
//! Crates abdeckt. Untermodule definieren eigene Fehler und konvertieren bei
//! Bedarf via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer Cinesync
pub type Result<T> = std::result::Result<T, CinesyncError>;

/// Alle moeglichen Fehler im Cinesync-System
#[derive(Debug, Error)]
pub enum CinesyncError {
    // --- Verbindung & Netzwerk ---
    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    #[error("Zeitlimit ueberschritten: {0}")]
    Zeitlimit(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl CinesyncError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler auf eine verlorene Gegenstelle hindeutet
    pub fn ist_verbindungsfehler(&self) -> bool {
        matches!(self, Self::Zeitlimit(_) | Self::Getrennt(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = CinesyncError::Konfiguration("port 0".into());
        assert_eq!(e.to_string(), "Konfigurationsfehler: port 0");
    }

    #[test]
    fn verbindungsfehler_erkennung() {
        assert!(CinesyncError::Zeitlimit("pong".into()).ist_verbindungsfehler());
        assert!(CinesyncError::Getrennt("eof".into()).ist_verbindungsfehler());
        assert!(!CinesyncError::intern("x").ist_verbindungsfehler());
    }
}
