//! Konfiguration fuer Hub und Verbindungen

use std::time::Duration;

/// Laufzeit-Parameter fuer Hubs und Client-Verbindungen
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Kapazitaet der ausgehenden Queue pro Client
    pub sende_queue_groesse: usize,
    /// Kapazitaet der Ereignis-Queue eines Hubs
    pub hub_queue_groesse: usize,
    /// Abstand zwischen zwei Keepalive-Pings
    pub ping_intervall: Duration,
    /// Maximale Zeit ohne eingehenden Frame bevor die Verbindung als tot gilt
    pub pong_timeout: Duration,
    /// Maximale Dauer eines einzelnen Schreibvorgangs
    pub schreib_timeout: Duration,
    /// Groesster akzeptierter eingehender Frame in Bytes
    pub max_nachricht_bytes: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            sende_queue_groesse: 256,
            hub_queue_groesse: 256,
            ping_intervall: Duration::from_secs(54),
            pong_timeout: Duration::from_secs(60),
            schreib_timeout: Duration::from_secs(10),
            max_nachricht_bytes: 512,
        }
    }
}
