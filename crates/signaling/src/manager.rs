//! Session-Manager – Tabelle aller laufenden Sitzungen
//!
//! Jede Sitzung besteht aus einem Hub (eigener Task) und der daran
//! registrierten `WatchSession`. Der Manager haelt nur Handles: den
//! `HubHandle` und einen Empfaenger fuer den `WatchStatus`.
//!
//! Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.

use cinesync_core::types::SessionId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SignalingConfig;
use crate::error::{SignalingError, SignalingResult};
use crate::hub::{Hub, HubHandle};
use crate::watch::{WatchSession, WatchStatus};

// ---------------------------------------------------------------------------
// Sitzung
// ---------------------------------------------------------------------------

/// Handles einer laufenden Sitzung
#[derive(Clone, Debug)]
pub struct Sitzung {
    pub hub: HubHandle,
    status: watch::Receiver<WatchStatus>,
}

impl Sitzung {
    pub fn id(&self) -> SessionId {
        self.hub.session_id()
    }

    /// Aktueller Status der Sitzungslogik
    pub fn status(&self) -> WatchStatus {
        self.status.borrow().clone()
    }

    /// Momentaufnahme fuer die Sitzungsliste
    pub fn uebersicht(&self) -> SessionUebersicht {
        let status = self.status.borrow();
        SessionUebersicht {
            id: self.id(),
            media: status.media.clone(),
            thumbnail: status.thumbnail.clone(),
            viewers: self.hub.zuschauer(),
        }
    }
}

/// Oeffentliche Zusammenfassung einer Sitzung
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionUebersicht {
    pub id: SessionId,
    pub media: String,
    pub thumbnail: String,
    pub viewers: usize,
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

struct Eintrag {
    sitzung: Sitzung,
    task: JoinHandle<()>,
}

struct SessionManagerInner {
    sitzungen: DashMap<SessionId, Eintrag>,
    config: SignalingConfig,
}

/// Verwaltet alle Sitzungen des Servers
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

impl SessionManager {
    pub fn neu(config: SignalingConfig) -> Self {
        Self {
            inner: Arc::new(SessionManagerInner {
                sitzungen: DashMap::new(),
                config,
            }),
        }
    }

    /// Konfiguration fuer Hubs und Verbindungen dieses Managers
    pub fn config(&self) -> &SignalingConfig {
        &self.inner.config
    }

    /// Erstellt eine neue Sitzung mit frischer ID und startet ihren Hub
    pub fn erstellen(&self) -> SignalingResult<SessionId> {
        self.erstellen_mit_id(SessionId::new())
    }

    /// Erstellt eine Sitzung unter einer vorgegebenen ID
    ///
    /// Ist die ID bereits vergeben, bleibt die bestehende Sitzung unberuehrt.
    pub fn erstellen_mit_id(&self, id: SessionId) -> SignalingResult<SessionId> {
        match self.inner.sitzungen.entry(id) {
            Entry::Occupied(_) => {
                tracing::error!(session_id = %id, "Sitzungs-ID bereits vergeben");
                Err(SignalingError::SitzungExistiert(id))
            }
            Entry::Vacant(frei) => {
                let (mut hub, handle) = Hub::neu(id, self.inner.config.hub_queue_groesse);
                let (watch, status) = WatchSession::neu();
                hub.listener_registrieren(watch);
                let task = hub.starten();

                frei.insert(Eintrag {
                    sitzung: Sitzung { hub: handle, status },
                    task,
                });
                tracing::info!(session_id = %id, "Sitzung erstellt");
                Ok(id)
            }
        }
    }

    /// Sucht eine Sitzung
    pub fn finden(&self, id: &SessionId) -> Option<Sitzung> {
        self.inner.sitzungen.get(id).map(|e| e.sitzung.clone())
    }

    /// Momentaufnahme aller Sitzungen, aufsteigend nach ID
    pub fn liste(&self) -> Vec<SessionUebersicht> {
        let mut liste: Vec<SessionUebersicht> = self
            .inner
            .sitzungen
            .iter()
            .map(|e| e.sitzung.uebersicht())
            .collect();
        liste.sort_by(|a, b| a.id.cmp(&b.id));
        liste
    }

    /// Entfernt eine Sitzung und stoppt ihren Hub
    pub fn beenden(&self, id: &SessionId) -> SignalingResult<()> {
        let (_, eintrag) = self
            .inner
            .sitzungen
            .remove(id)
            .ok_or(SignalingError::SitzungNichtGefunden(*id))?;
        eintrag.sitzung.hub.stoppen();
        tracing::info!(session_id = %id, "Sitzung beendet");
        Ok(())
    }

    /// Anzahl laufender Sitzungen
    pub fn anzahl(&self) -> usize {
        self.inner.sitzungen.len()
    }

    /// Summe der Zuschauer ueber alle Sitzungen
    pub fn zuschauer_gesamt(&self) -> usize {
        self.inner
            .sitzungen
            .iter()
            .map(|e| e.sitzung.hub.zuschauer())
            .sum()
    }

    /// Stoppt alle Sitzungen und wartet auf das Ende ihrer Hubs
    pub async fn alle_beenden(&self) {
        let ids: Vec<SessionId> = self.inner.sitzungen.iter().map(|e| *e.key()).collect();
        let mut tasks = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some((_, eintrag)) = self.inner.sitzungen.remove(&id) {
                eintrag.sitzung.hub.stoppen();
                tasks.push(eintrag.task);
            }
        }
        let anzahl = tasks.len();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(fehler = %e, "Hub-Task nicht sauber beendet");
            }
        }
        tracing::info!(anzahl, "Alle Sitzungen beendet");
    }
}
