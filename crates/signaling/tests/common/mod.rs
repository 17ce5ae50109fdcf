//! Gemeinsame Hilfen fuer die Integrationstests: In-Memory-Transport

#![allow(dead_code)]

use cinesync_protocol::Message;
use cinesync_signaling::{ClientConnection, Frame, SignalingConfig, Sitzung};
use futures_util::{Sink, Stream};
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Server-Seite eines In-Memory-Transports
pub struct TestVerbindung {
    eingang: mpsc::UnboundedReceiver<Result<Frame, String>>,
    ausgang: mpsc::UnboundedSender<Frame>,
}

impl Stream for TestVerbindung {
    type Item = Result<Frame, String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.eingang.poll_recv(cx)
    }
}

impl Sink<Frame> for TestVerbindung {
    type Error = String;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, frame: Frame) -> Result<(), String> {
        self.ausgang
            .send(frame)
            .map_err(|_| "Gegenstelle geschlossen".to_string())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
        Poll::Ready(Ok(()))
    }
}

/// Client-Seite: schreibt Frames an den Server, liest seine Antworten
pub struct Gegenstelle {
    pub tx: mpsc::UnboundedSender<Result<Frame, String>>,
    pub rx: mpsc::UnboundedReceiver<Frame>,
}

pub fn verbindungspaar() -> (TestVerbindung, Gegenstelle) {
    let (c2s_tx, c2s_rx) = mpsc::unbounded_channel();
    let (s2c_tx, s2c_rx) = mpsc::unbounded_channel();
    (
        TestVerbindung {
            eingang: c2s_rx,
            ausgang: s2c_tx,
        },
        Gegenstelle {
            tx: c2s_tx,
            rx: s2c_rx,
        },
    )
}

const WARTEZEIT: Duration = Duration::from_secs(2);

impl Gegenstelle {
    pub fn senden(&self, json: Value) {
        self.tx.send(Ok(Frame::Text(json.to_string()))).unwrap();
    }

    pub fn roh_senden(&self, frame: Frame) {
        self.tx.send(Ok(frame)).unwrap();
    }

    /// Naechster Frame vom Server (Pings eingeschlossen)
    pub async fn naechster_frame(&mut self) -> Option<Frame> {
        tokio::time::timeout(WARTEZEIT, self.rx.recv())
            .await
            .expect("kein Frame vom Server")
    }

    /// Naechste Nachricht vom Server; Pings werden uebersprungen
    pub async fn naechste(&mut self) -> Message {
        loop {
            match self.naechster_frame().await {
                Some(Frame::Text(text)) => return Message::parse(text.as_bytes()).unwrap(),
                Some(Frame::Ping(_)) => continue,
                anderer => panic!("unerwarteter Frame: {anderer:?}"),
            }
        }
    }
}

pub fn test_config() -> SignalingConfig {
    SignalingConfig::default()
}

/// Verbindet einen neuen Client mit einer Sitzung
pub fn verbinden(
    sitzung: &Sitzung,
    config: &SignalingConfig,
) -> (Gegenstelle, JoinHandle<cinesync_core::Result<()>>) {
    let (verbindung, gegenstelle) = verbindungspaar();
    let client = ClientConnection::neu(sitzung.hub.clone(), config);
    let task = tokio::spawn(client.verarbeiten(verbindung));
    (gegenstelle, task)
}
