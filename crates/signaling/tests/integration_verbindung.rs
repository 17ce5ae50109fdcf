//! Integration-Tests fuer ClientConnection (Keepalive, Limits, Abbruch)

mod common;

use cinesync_core::CinesyncError;
use cinesync_protocol::{Message, MessageType};
use cinesync_signaling::{ClientConnection, Frame, SessionManager, SignalingConfig};
use common::{test_config, verbinden, verbindungspaar};
use futures_util::{Sink, Stream};
use serde_json::{json, Value};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;

fn manager_mit(config: &SignalingConfig) -> (SessionManager, cinesync_signaling::Sitzung) {
    let manager = SessionManager::neu(config.clone());
    let id = manager.erstellen().unwrap();
    let sitzung = manager.finden(&id).unwrap();
    (manager, sitzung)
}

#[tokio::test]
async fn ungueltiges_json_haelt_verbindung_offen() {
    let config = test_config();
    let (_m, sitzung) = manager_mit(&config);
    let (mut a, _t) = verbinden(&sitzung, &config);
    a.naechste().await;
    a.naechste().await;

    a.roh_senden(Frame::Text("{kaputt".into()));
    a.senden(json!({"Type": "c", "Action": "play"}));
    assert_eq!(a.naechste().await.action, "play");
}

#[tokio::test]
async fn zu_grosser_frame_wird_verworfen() {
    let config = SignalingConfig {
        max_nachricht_bytes: 64,
        ..test_config()
    };
    let (_m, sitzung) = manager_mit(&config);
    let (mut a, _t) = verbinden(&sitzung, &config);
    a.naechste().await;
    a.naechste().await;

    let lang = "x".repeat(200);
    a.senden(json!({"Type": "m", "Data": lang}));
    a.senden(json!({"Type": "c", "Action": "seek", "Data": 1}));
    let m = a.naechste().await;
    assert_eq!(m.kind, MessageType::Control);
    assert_eq!(m.action, "seek");
}

#[tokio::test]
async fn binaer_frame_wird_wie_text_behandelt() {
    let config = test_config();
    let (_m, sitzung) = manager_mit(&config);
    let (mut a, _t) = verbinden(&sitzung, &config);
    a.naechste().await;
    a.naechste().await;

    a.roh_senden(Frame::Binary(br#"{"Type":"c","Action":"pause"}"#.to_vec()));
    assert_eq!(a.naechste().await.action, "pause");
}

#[tokio::test(start_paused = true)]
async fn keepalive_ping_wird_gesendet() {
    let config = SignalingConfig {
        ping_intervall: Duration::from_secs(1),
        pong_timeout: Duration::from_secs(3600),
        ..test_config()
    };
    let (_m, sitzung) = manager_mit(&config);
    let (mut a, _t) = verbinden(&sitzung, &config);
    a.naechste().await;
    a.naechste().await;

    assert!(matches!(a.naechster_frame().await, Some(Frame::Ping(_))));
}

#[tokio::test(start_paused = true)]
async fn lese_zeitlimit_trennt_verbindung() {
    let config = SignalingConfig {
        ping_intervall: Duration::from_secs(3600),
        pong_timeout: Duration::from_secs(5),
        ..test_config()
    };
    let (_m, sitzung) = manager_mit(&config);
    let (mut a, task) = verbinden(&sitzung, &config);
    a.naechste().await;
    a.naechste().await;

    let fehler = task.await.unwrap().unwrap_err();
    assert!(fehler.ist_verbindungsfehler());
    assert_eq!(a.naechster_frame().await, Some(Frame::Close));
    assert!(sitzung.hub.alle_clients().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn pong_verlaengert_lesefrist() {
    let config = SignalingConfig {
        ping_intervall: Duration::from_secs(3600),
        pong_timeout: Duration::from_secs(5),
        ..test_config()
    };
    let (_m, sitzung) = manager_mit(&config);
    let (mut a, task) = verbinden(&sitzung, &config);
    a.naechste().await;
    a.naechste().await;

    for _ in 0..4 {
        tokio::time::sleep(Duration::from_secs(3)).await;
        a.roh_senden(Frame::Pong(Vec::new()));
    }
    assert!(!task.is_finished());
    assert_eq!(sitzung.hub.zuschauer(), 1);
}

#[tokio::test]
async fn schreibfehler_beendet_verbindung() {
    let config = test_config();
    let (_m, sitzung) = manager_mit(&config);
    let (verbindung, gegenstelle) = verbindungspaar();
    let common::Gegenstelle { tx, rx } = gegenstelle;
    drop(rx);

    let client = cinesync_signaling::ClientConnection::neu(sitzung.hub.clone(), &config);
    let ergebnis = client.verarbeiten(verbindung).await;
    assert!(ergebnis.unwrap_err().ist_verbindungsfehler());
    drop(tx);

    // Hub hat den Client wieder abgemeldet
    assert!(sitzung.hub.alle_clients().await.unwrap().is_empty());
}

/// Transport, dessen Sink nie schreibbereit wird
struct HaengendeVerbindung {
    eingang: mpsc::UnboundedReceiver<Result<Frame, String>>,
}

impl Stream for HaengendeVerbindung {
    type Item = Result<Frame, String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.eingang.poll_recv(cx)
    }
}

impl Sink<Frame> for HaengendeVerbindung {
    type Error = String;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
        Poll::Pending
    }

    fn start_send(self: Pin<&mut Self>, _frame: Frame) -> Result<(), String> {
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
        Poll::Pending
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
        Poll::Pending
    }
}

#[tokio::test(start_paused = true)]
async fn schreib_zeitlimit_beendet_verbindung() {
    let config = SignalingConfig {
        ping_intervall: Duration::from_secs(3600),
        schreib_timeout: Duration::from_secs(10),
        ..test_config()
    };
    let (_m, sitzung) = manager_mit(&config);
    let (_tx, eingang) = mpsc::unbounded_channel();

    let client = ClientConnection::neu(sitzung.hub.clone(), &config);
    let start = tokio::time::Instant::now();
    let ergebnis = client.verarbeiten(HaengendeVerbindung { eingang }).await;

    assert!(matches!(ergebnis, Err(CinesyncError::Zeitlimit(_))));
    assert!(start.elapsed() >= Duration::from_secs(10));
    assert!(sitzung.hub.alle_clients().await.unwrap().is_empty());
    assert_eq!(sitzung.hub.zuschauer(), 0);
}

#[tokio::test]
async fn gegenstelle_schliesst_stream() {
    let config = test_config();
    let (_m, sitzung) = manager_mit(&config);
    let (a, task) = verbinden(&sitzung, &config);
    let common::Gegenstelle { tx, rx: _rx } = a;
    drop(tx);

    assert!(task.await.unwrap().is_ok());
    assert!(sitzung.hub.alle_clients().await.unwrap().is_empty());
}

#[tokio::test]
async fn anmeldung_an_beendeter_sitzung_schlaegt_fehl() {
    let config = test_config();
    let (manager, sitzung) = manager_mit(&config);
    manager.beenden(&sitzung.id()).unwrap();

    let (_a, task) = verbinden(&sitzung, &config);
    assert!(task.await.unwrap().is_err());
}

#[tokio::test]
async fn server_nachrichten_sind_gueltiges_json() {
    let config = test_config();
    let (_m, sitzung) = manager_mit(&config);
    let (mut a, _t) = verbinden(&sitzung, &config);

    match a.naechster_frame().await {
        Some(Frame::Text(text)) => {
            let wert: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(wert["Type"], "i");
            assert_eq!(wert["Action"], "leader");
            assert!(wert.get("Subject").is_none());
            assert!(Message::parse(text.as_bytes()).is_ok());
        }
        anderer => panic!("unerwarteter Frame: {anderer:?}"),
    }
}
