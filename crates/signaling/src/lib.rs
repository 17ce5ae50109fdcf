//! cinesync-signaling – Echtzeit-Synchronisation
//!
//! Dieser Crate implementiert den Kern von Cinesync: pro Sitzung einen
//! Broadcast-Hub, die Sitzungslogik (Leader, Medium, Chat) und die
//! Verbindungs-Aktoren, die WebSocket-Verbindungen an einen Hub binden.
//!
//! ## Architektur
//!
//! ```text
//! SessionManager (DashMap<SessionId, Sitzung>)
//!     |
//!     +-- Sitzung
//!           |
//!           +-- Hub (eigener Task, besitzt das Client-Register)
//!           |     |
//!           |     +-- WatchSession (einziger Listener)
//!           |
//!           +-- ClientConnection (pro Verbindung)
//!                 +-- Lese-Pumpe  -> Hub
//!                 +-- Schreib-Pumpe <- Client-Queue
//! ```
//!
//! Alle Zustandsaenderungen einer Sitzung laufen seriell durch die
//! Ereignisschleife ihres Hubs. Zwischen Sitzungen gibt es keinen
//! gemeinsamen veraenderlichen Zustand ausser der Sitzungstabelle.

pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
pub mod manager;
pub mod watch;

// Bequeme Re-Exporte
pub use config::SignalingConfig;
pub use connection::{ClientConnection, Frame};
pub use error::{SignalingError, SignalingResult};
pub use hub::{Hub, HubHandle, HubKontext, HubListener};
pub use manager::{SessionManager, SessionUebersicht, Sitzung};
pub use watch::{WatchSession, WatchStatus};
