//! cinesync-protocol – Nachrichtenformat zwischen Browser und Server
//!
//! Jeder Websocket-Frame traegt genau ein JSON-Objekt mit den Feldern
//! `Type`, `Action` und `Data`. Absender bzw. Empfaenger werden nie
//! uebertragen, sondern serverseitig aus der Verbindung abgeleitet.

pub mod aktion;
pub mod error;
pub mod message;

pub use aktion::{InfoAktion, aktionen};
pub use error::{ProtokollFehler, ProtokollResult};
pub use message::{Message, MessageType};
