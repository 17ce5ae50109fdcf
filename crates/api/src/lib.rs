//! cinesync-api – HTTP-Schnittstelle fuer den Cinesync Server
//!
//! - **REST** (`/api/...`): Sitzungen anlegen, auflisten, beenden; Medienliste
//! - **WebSocket** (`/api/sessions/:id/join`): Beitritt zu einer Sitzung
//! - **Statische Dateien**: `/media/*` aus dem Medienverzeichnis, alles
//!   andere aus dem Web-Verzeichnis
//!
//! Alle Endpunkte arbeiten ausschliesslich ueber den [`SessionManager`].
//!
//! [`SessionManager`]: cinesync_signaling::SessionManager

pub mod error;
pub mod rest;
pub mod ws;

pub use error::{ApiError, ApiResult};
pub use rest::server::{RestServer, RestServerKonfig, router_bauen};
pub use rest::ApiState;
