//! cinesync-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die von allen anderen
//! Cinesync-Crates gemeinsam genutzt werden: die Identifikationstypen fuer
//! Sitzungen und Clients sowie den zentralen Fehler-Enum.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{CinesyncError, Result};
pub use types::{ClientId, SessionId};
