//! cinesync-server – Bibliotheks-Root
//!
//! Verdrahtet Sitzungsverwaltung, HTTP-Schnittstelle und Observability und
//! stellt den oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use cinesync_api::{ApiState, RestServer};
use cinesync_observability::{CinesyncMetrics, HealthState, observability_server_starten};
use cinesync_signaling::SessionManager;
use config::ServerConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Konfiguration pruefen, Sitzungsverwaltung und Metriken anlegen
    /// 2. Abtastung der Sitzungs-Gauges starten
    /// 3. Observability-Server starten (falls aktiviert)
    /// 4. REST-/WebSocket-Server starten
    /// 5. Auf Ctrl-C warten, dann alle Sitzungen beenden und die Server stoppen
    pub async fn starten(self) -> Result<()> {
        self.config.validieren()?;

        let sessions = SessionManager::neu(self.config.signaling_config());
        let metriken = CinesyncMetrics::neu()?;
        let health = HealthState::neu();
        let abbruch = CancellationToken::new();

        tracing::info!(
            server_name = %self.config.server.name,
            http = %self.config.http_bind_adresse()?,
            medien = %self.config.medien.medien_verzeichnis.display(),
            "Server startet"
        );

        let abtaster = tokio::spawn(abtast_schleife(
            sessions.clone(),
            metriken.clone(),
            health.clone(),
            self.config.abtast_intervall(),
            abbruch.clone(),
        ));

        let observability: Option<JoinHandle<Result<()>>> = if self.config.observability.aktiviert {
            let addr = self.config.observability_bind_adresse()?;
            Some(tokio::spawn(observability_server_starten(
                addr,
                metriken.clone(),
                health.clone(),
                beendet(&abbruch),
            )))
        } else {
            tracing::info!("Observability-Server deaktiviert");
            None
        };

        let rest = RestServer::neu(self.config.rest_konfig()?);
        let state = ApiState::neu(sessions.clone(), self.config.medien.medien_verzeichnis.clone());
        let mut rest_task = tokio::spawn(rest.starten(state, metriken, beendet(&abbruch)));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        let vorzeitig = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                None
            }
            ergebnis = &mut rest_task => Some(ergebnis),
        };

        health.herunterfahren_melden();
        // Offene WebSockets schliessen, sonst wartet der Graceful Shutdown auf sie
        sessions.alle_beenden().await;
        abbruch.cancel();

        let rest_ergebnis = match vorzeitig {
            Some(ergebnis) => ergebnis,
            None => rest_task.await,
        };
        if let Some(task) = observability {
            if let Err(e) = task.await? {
                tracing::warn!(fehler = %e, "Observability-Server mit Fehler beendet");
            }
        }
        if let Err(e) = abtaster.await {
            tracing::warn!(fehler = %e, "Abtast-Task nicht sauber beendet");
        }

        rest_ergebnis??;
        tracing::info!("Server beendet");
        Ok(())
    }
}

fn beendet(abbruch: &CancellationToken) -> impl Future<Output = ()> + Send + 'static {
    let abbruch = abbruch.clone();
    async move { abbruch.cancelled().await }
}

/// Uebertraegt den aktuellen Sitzungsstand in Metriken und Health-Status
pub fn sitzungen_abtasten(sessions: &SessionManager, metriken: &CinesyncMetrics, health: &HealthState) {
    let anzahl = sessions.anzahl();
    let zuschauer = sessions.zuschauer_gesamt();
    metriken.sitzungen_setzen(anzahl, zuschauer);
    health.sitzungen_setzen(anzahl);
    tracing::trace!(sitzungen = anzahl, zuschauer, "Sitzungen abgetastet");
}

async fn abtast_schleife(
    sessions: SessionManager,
    metriken: CinesyncMetrics,
    health: HealthState,
    intervall: Duration,
    abbruch: CancellationToken,
) {
    let mut takt = tokio::time::interval(intervall);
    loop {
        tokio::select! {
            _ = abbruch.cancelled() => break,
            _ = takt.tick() => sitzungen_abtasten(&sessions, &metriken, &health),
        }
    }
}
