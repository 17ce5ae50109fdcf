//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use cinesync_api::RestServerKonfig;
use cinesync_core::{CinesyncError, Result};
use cinesync_observability::logging::{log_format_gueltig, log_level_gueltig};
use cinesync_signaling::SignalingConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Hub- und Verbindungsparameter
    pub verbindung: VerbindungsEinstellungen,
    /// Verzeichnisse fuer Medien und Web-Oberflaeche
    pub medien: MedienEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Cinesync Server".into(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und Observability
    pub bind_adresse: String,
    /// Port fuer API, WebSocket und statische Dateien
    pub http_port: u16,
    /// CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            http_port: 8080,
            cors_origins: vec![],
        }
    }
}

/// Hub- und Verbindungsparameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    pub sende_queue_groesse: usize,
    pub hub_queue_groesse: usize,
    pub ping_intervall_sek: u64,
    pub pong_timeout_sek: u64,
    pub schreib_timeout_sek: u64,
    /// Groesster akzeptierter eingehender Frame
    pub max_nachricht_bytes: usize,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        Self {
            sende_queue_groesse: 256,
            hub_queue_groesse: 256,
            ping_intervall_sek: 54,
            pong_timeout_sek: 60,
            schreib_timeout_sek: 10,
            max_nachricht_bytes: 512,
        }
    }
}

/// Verzeichnisse fuer Medien und Web-Oberflaeche
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MedienEinstellungen {
    /// Wird unter /media ausgeliefert und von /api/media gelistet
    pub medien_verzeichnis: PathBuf,
    /// Statische Web-Oberflaeche
    pub web_verzeichnis: PathBuf,
}

impl Default for MedienEinstellungen {
    fn default() -> Self {
        Self {
            medien_verzeichnis: PathBuf::from("./media"),
            web_verzeichnis: PathBuf::from("./web"),
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
    /// Abstand zwischen zwei Abtastungen der Sitzungs-Gauges
    pub abtast_intervall_sek: u64,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
            abtast_intervall_sek: 5,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> Result<()> {
        let v = &self.verbindung;
        if v.sende_queue_groesse == 0 || v.hub_queue_groesse == 0 {
            return Err(CinesyncError::Konfiguration(
                "Queue-Groessen muessen groesser als 0 sein".into(),
            ));
        }
        if v.ping_intervall_sek == 0 || v.ping_intervall_sek >= v.pong_timeout_sek {
            return Err(CinesyncError::Konfiguration(format!(
                "ping_intervall_sek ({}) muss zwischen 0 und pong_timeout_sek ({}) liegen",
                v.ping_intervall_sek, v.pong_timeout_sek
            )));
        }
        if v.max_nachricht_bytes == 0 {
            return Err(CinesyncError::Konfiguration(
                "max_nachricht_bytes muss groesser als 0 sein".into(),
            ));
        }
        if !log_level_gueltig(&self.logging.level) {
            return Err(CinesyncError::Konfiguration(format!(
                "Unbekanntes Log-Level '{}'",
                self.logging.level
            )));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(CinesyncError::Konfiguration(format!(
                "Unbekanntes Log-Format '{}'",
                self.logging.format
            )));
        }
        self.http_bind_adresse()?;
        if self.observability.aktiviert {
            self.observability_bind_adresse()?;
        }
        Ok(())
    }

    fn adresse(&self, port: u16) -> Result<SocketAddr> {
        let text = format!("{}:{}", self.netzwerk.bind_adresse, port);
        text.parse().map_err(|e| {
            CinesyncError::Konfiguration(format!("Ungueltige Bind-Adresse '{text}': {e}"))
        })
    }

    /// Gibt die Bind-Adresse fuer den HTTP-Server zurueck
    pub fn http_bind_adresse(&self) -> Result<SocketAddr> {
        self.adresse(self.netzwerk.http_port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> Result<SocketAddr> {
        self.adresse(self.observability.port)
    }

    pub fn abtast_intervall(&self) -> Duration {
        Duration::from_secs(self.observability.abtast_intervall_sek.max(1))
    }

    /// Parameter fuer Hubs und Client-Verbindungen
    pub fn signaling_config(&self) -> SignalingConfig {
        let v = &self.verbindung;
        SignalingConfig {
            sende_queue_groesse: v.sende_queue_groesse,
            hub_queue_groesse: v.hub_queue_groesse,
            ping_intervall: Duration::from_secs(v.ping_intervall_sek),
            pong_timeout: Duration::from_secs(v.pong_timeout_sek),
            schreib_timeout: Duration::from_secs(v.schreib_timeout_sek),
            max_nachricht_bytes: v.max_nachricht_bytes,
        }
    }

    /// Konfiguration des REST-/WebSocket-Servers
    pub fn rest_konfig(&self) -> Result<RestServerKonfig> {
        Ok(RestServerKonfig {
            bind_addr: self.http_bind_adresse()?,
            cors_origins: self.netzwerk.cors_origins.clone(),
            web_verzeichnis: self.medien.web_verzeichnis.clone(),
            medien_verzeichnis: self.medien.medien_verzeichnis.clone(),
        })
    }
}
