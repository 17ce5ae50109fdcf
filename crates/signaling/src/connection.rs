//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection`. Sie meldet sich beim Hub
//! ihrer Sitzung an und betreibt zwei unabhaengige Pumpen:
//!
//! ```text
//!            +-------------------+   Eingang    +-----+
//! Netz ----> | Lese-Pumpe (Task) | -----------> |     |
//!            +-------------------+              | Hub |
//!            +-------------------+   Queue      |     |
//! Netz <---- | Schreib-Pumpe     | <----------- |     |
//!            +-------------------+              +-----+
//! ```
//!
//! ## Beenden
//! - Lese-Pumpe endet (Fehler, Close, Zeitlimit) -> Abmeldung beim Hub,
//!   danach wird die Schreib-Pumpe abgebrochen
//! - Queue geschlossen (Abmeldung, volle Queue, Sitzungsende) -> Schreib-Pumpe
//!   sendet Close und bricht die Lese-Pumpe ab
//! - Schreibfehler oder Schreib-Zeitlimit -> Schreib-Pumpe bricht die
//!   Lese-Pumpe ab
//!
//! ## Keepalive
//! - Server sendet alle `ping_intervall` einen Ping
//! - Kommt innerhalb von `pong_timeout` kein Frame, gilt der Client als tot

use cinesync_core::{CinesyncError, Result};
use cinesync_core::types::ClientId;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at, timeout};
use tokio_util::sync::CancellationToken;

use crate::config::SignalingConfig;
use crate::hub::{AusgehenderFrame, HubHandle};

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Transportunabhaengiger WebSocket-Frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

// ---------------------------------------------------------------------------
// ClientConnection
// ---------------------------------------------------------------------------

/// Verbindungs-Aktor eines einzelnen Clients
pub struct ClientConnection {
    hub: HubHandle,
    config: SignalingConfig,
    client_id: ClientId,
}

impl ClientConnection {
    /// Erstellt eine neue Verbindung mit frischer ClientId
    pub fn neu(hub: HubHandle, config: &SignalingConfig) -> Self {
        Self {
            hub,
            config: config.clone(),
            client_id: ClientId::new(),
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Betreibt die Verbindung bis sie getrennt wird
    ///
    /// Die Schreib-Pumpe laeuft als eigener Task, die Lese-Pumpe im
    /// aktuellen. Kehrt erst zurueck wenn beide beendet sind.
    pub async fn verarbeiten<S, E>(self, verbindung: S) -> Result<()>
    where
        S: Stream<Item = std::result::Result<Frame, E>> + Sink<Frame> + Send + 'static,
        E: Display + Send,
        <S as Sink<Frame>>::Error: Display + Send,
    {
        let client_id = self.client_id;
        let session_id = self.hub.session_id();

        let (queue_tx, queue_rx) = mpsc::channel(self.config.sende_queue_groesse.max(1));
        if let Err(e) = self.hub.anmelden(client_id, queue_tx).await {
            tracing::warn!(
                session_id = %session_id,
                client_id = %client_id,
                fehler = %e,
                "Anmeldung beim Hub fehlgeschlagen"
            );
            return Err(CinesyncError::Getrennt(e.to_string()));
        }

        tracing::info!(session_id = %session_id, client_id = %client_id, "Neue Verbindung");

        let (sink, stream) = verbindung.split();
        let abbruch = CancellationToken::new();

        let schreiber = tokio::spawn(schreib_pumpe(
            sink,
            queue_rx,
            self.config.clone(),
            abbruch.clone(),
        ));

        let lese_ergebnis = self.lese_pumpe(stream, &abbruch).await;

        // Doppelte Abmeldung ist beim Hub ein No-op
        if let Err(e) = self.hub.abmelden(client_id).await {
            tracing::debug!(client_id = %client_id, fehler = %e, "Abmeldung nicht zugestellt");
        }
        abbruch.cancel();

        let schreib_ergebnis = match schreiber.await {
            Ok(ergebnis) => ergebnis,
            Err(e) => Err(CinesyncError::intern(format!("Schreib-Task abgebrochen: {e}"))),
        };

        match lese_ergebnis.as_ref().err().or(schreib_ergebnis.as_ref().err()) {
            None => {
                tracing::info!(session_id = %session_id, client_id = %client_id, "Verbindung beendet");
            }
            Some(e) if e.ist_verbindungsfehler() => {
                tracing::info!(
                    session_id = %session_id,
                    client_id = %client_id,
                    fehler = %e,
                    "Verbindung getrennt"
                );
            }
            Some(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    client_id = %client_id,
                    fehler = %e,
                    "Verbindung mit Fehler beendet"
                );
            }
        }

        lese_ergebnis.and(schreib_ergebnis)
    }

    /// Liest Frames und reicht sie beim Hub ein
    async fn lese_pumpe<R, E>(&self, mut stream: R, abbruch: &CancellationToken) -> Result<()>
    where
        R: Stream<Item = std::result::Result<Frame, E>> + Unpin,
        E: Display,
    {
        let frist = self.config.pong_timeout;

        loop {
            let naechster = tokio::select! {
                biased;
                _ = abbruch.cancelled() => return Ok(()),
                naechster = timeout(frist, stream.next()) => naechster,
            };

            let frame = match naechster {
                Err(_) => {
                    tracing::warn!(client_id = %self.client_id, "Verbindungs-Timeout");
                    return Err(CinesyncError::Zeitlimit(format!(
                        "kein Frame innerhalb von {frist:?}"
                    )));
                }
                Ok(None) => return Ok(()),
                Ok(Some(Err(e))) => return Err(CinesyncError::Getrennt(e.to_string())),
                Ok(Some(Ok(frame))) => frame,
            };

            let rohdaten = match frame {
                Frame::Text(text) => text.into_bytes(),
                Frame::Binary(daten) => daten,
                Frame::Pong(_) | Frame::Ping(_) => {
                    tracing::trace!(client_id = %self.client_id, "Keepalive empfangen");
                    continue;
                }
                Frame::Close => return Ok(()),
            };

            if rohdaten.len() > self.config.max_nachricht_bytes {
                tracing::warn!(
                    client_id = %self.client_id,
                    groesse = rohdaten.len(),
                    max = self.config.max_nachricht_bytes,
                    "Frame zu gross – verworfen"
                );
                continue;
            }

            if let Err(e) = self.hub.eingang(self.client_id, rohdaten).await {
                return Err(CinesyncError::Getrennt(e.to_string()));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Schreib-Pumpe
// ---------------------------------------------------------------------------

async fn schreib_pumpe<W>(
    mut sink: W,
    mut queue: mpsc::Receiver<AusgehenderFrame>,
    config: SignalingConfig,
    abbruch: CancellationToken,
) -> Result<()>
where
    W: Sink<Frame> + Unpin,
    W::Error: Display,
{
    let frist = config.schreib_timeout;
    let mut ping = interval_at(Instant::now() + config.ping_intervall, config.ping_intervall);

    let ergebnis = loop {
        tokio::select! {
            biased;
            _ = abbruch.cancelled() => break Ok(()),
            eintrag = queue.recv() => match eintrag {
                Some(text) => {
                    if let Err(e) = schreiben(&mut sink, Frame::Text(text.to_string()), frist).await {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            },
            _ = ping.tick() => {
                if let Err(e) = schreiben(&mut sink, Frame::Ping(Vec::new()), frist).await {
                    break Err(e);
                }
            }
        }
    };

    // Nach dem Schliessen wird nichts mehr aus der Queue geschrieben
    queue.close();
    if ergebnis.is_ok() {
        let _ = schreiben(&mut sink, Frame::Close, frist).await;
        let _ = timeout(frist, sink.close()).await;
    }
    abbruch.cancel();
    ergebnis
}

async fn schreiben<W>(sink: &mut W, frame: Frame, frist: Duration) -> Result<()>
where
    W: Sink<Frame> + Unpin,
    W::Error: Display,
{
    match timeout(frist, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(CinesyncError::Getrennt(e.to_string())),
        Err(_) => Err(CinesyncError::Zeitlimit(format!(
            "Schreiben dauerte laenger als {frist:?}"
        ))),
    }
}
