//! REST-Interface fuer Cinesync

pub mod handlers;
pub mod routes;
pub mod server;

use cinesync_signaling::SessionManager;
use std::path::PathBuf;
use std::sync::Arc;

/// Axum-State fuer den REST-Server
#[derive(Clone)]
pub struct ApiState {
    pub sessions: SessionManager,
    pub medien_verzeichnis: Arc<PathBuf>,
}

impl ApiState {
    pub fn neu(sessions: SessionManager, medien_verzeichnis: impl Into<PathBuf>) -> Self {
        Self {
            sessions,
            medien_verzeichnis: Arc::new(medien_verzeichnis.into()),
        }
    }
}
