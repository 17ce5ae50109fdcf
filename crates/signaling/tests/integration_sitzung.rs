//! Integration-Tests: Sitzungsablauf ueber echte Verbindungs-Aktoren

mod common;

use cinesync_protocol::MessageType;
use cinesync_signaling::{Frame, SessionManager};
use common::{test_config, verbinden};
use serde_json::json;

#[tokio::test]
async fn ablauf_leader_medium_nachzuegler_uebergabe() {
    let config = test_config();
    let manager = SessionManager::neu(config.clone());
    let id = manager.erstellen().unwrap();
    let sitzung = manager.finden(&id).unwrap();

    // A tritt einer leeren Sitzung bei und wird Leader
    let (mut a, a_task) = verbinden(&sitzung, &config);
    let m = a.naechste().await;
    assert_eq!((m.kind, m.action.as_str()), (MessageType::Info, "leader"));
    let m = a.naechste().await;
    assert_eq!(m.kind, MessageType::ViewCount);
    assert_eq!(m.data, json!(1));

    // B tritt bei: nur ViewCount, kein neuer Leader
    let (mut b, _b_task) = verbinden(&sitzung, &config);
    let m = b.naechste().await;
    assert_eq!(m.kind, MessageType::ViewCount);
    assert_eq!(m.data, json!(2));
    let m = a.naechste().await;
    assert_eq!(m.kind, MessageType::ViewCount);
    assert_eq!(m.data, json!(2));

    // A waehlt ein Medium
    a.senden(json!({"Type": "i", "Action": "media", "Data": "movie1"}));
    for client in [&mut a, &mut b] {
        let m = client.naechste().await;
        assert_eq!((m.kind, m.action.as_str()), (MessageType::Control, "media"));
        assert_eq!(m.data, json!("movie1"));
    }
    assert_eq!(manager.liste()[0].media, "movie1");

    // B fragt nach: gezielte Antwort, kein Broadcast
    b.senden(json!({"Type": "i", "Action": "media", "Data": "egal"}));
    let m = b.naechste().await;
    assert_eq!((m.kind, m.action.as_str()), (MessageType::Control, "media"));
    assert_eq!(m.data, json!("movie1"));

    a.senden(json!({"Type": "c", "Action": "play", "Data": null}));
    let m = a.naechste().await;
    assert_eq!(m.action, "play", "A darf die Catch-up-Antwort nicht sehen");
    assert_eq!(b.naechste().await.action, "play");

    // A trennt: B wird Leader
    a.roh_senden(Frame::Close);
    let ergebnis = a_task.await.unwrap();
    assert!(ergebnis.is_ok());

    let m = b.naechste().await;
    assert_eq!((m.kind, m.action.as_str()), (MessageType::Info, "leader"));
    let m = b.naechste().await;
    assert_eq!(m.kind, MessageType::ViewCount);
    assert_eq!(m.data, json!(1));

    assert_eq!(sitzung.hub.zuschauer(), 1);
    assert_eq!(manager.liste()[0].viewers, 1);
}

#[tokio::test]
async fn sitzungen_sind_isoliert() {
    let config = test_config();
    let manager = SessionManager::neu(config.clone());
    let id1 = manager.erstellen().unwrap();
    let id2 = manager.erstellen().unwrap();
    assert_ne!(id1, id2);

    let s1 = manager.finden(&id1).unwrap();
    let s2 = manager.finden(&id2).unwrap();

    let (mut x, _tx) = verbinden(&s1, &config);
    let (mut y, _ty) = verbinden(&s2, &config);
    for client in [&mut x, &mut y] {
        assert_eq!(client.naechste().await.action, "leader");
        assert_eq!(client.naechste().await.data, json!(1));
    }

    x.senden(json!({"Type": "c", "Action": "pause", "Data": 3.0}));
    assert_eq!(x.naechste().await.action, "pause");

    // Y sieht nur seinen eigenen Chat
    y.senden(json!({"Type": "m", "Data": "hallo"}));
    let m = y.naechste().await;
    assert_eq!(m.kind, MessageType::UserMessage);
    assert_eq!(m.data, json!("hallo"));

    let liste = manager.liste();
    assert_eq!(liste.len(), 2);
    assert!(liste.iter().all(|s| s.viewers == 1));
}

#[tokio::test]
async fn name_setzen_ueber_verbindung() {
    let config = test_config();
    let manager = SessionManager::neu(config.clone());
    let sitzung = manager.finden(&manager.erstellen().unwrap()).unwrap();

    let (mut a, _ta) = verbinden(&sitzung, &config);
    a.naechste().await;
    a.naechste().await;

    a.senden(json!({"Type": "i", "Action": "name", "Data": "anna"}));
    let m = a.naechste().await;
    assert_eq!((m.kind, m.action.as_str()), (MessageType::Info, "users"));
    assert_eq!(m.data, json!(["anna"]));

    a.senden(json!({"Type": "m", "Data": "moin"}));
    let m = a.naechste().await;
    assert_eq!(m.action, "anna");
}

#[tokio::test]
async fn beenden_schliesst_alle_verbindungen() {
    let config = test_config();
    let manager = SessionManager::neu(config.clone());
    let id = manager.erstellen().unwrap();
    let sitzung = manager.finden(&id).unwrap();

    let (mut a, a_task) = verbinden(&sitzung, &config);
    let (mut b, b_task) = verbinden(&sitzung, &config);
    a.naechste().await;
    a.naechste().await;
    b.naechste().await;

    manager.beenden(&id).unwrap();

    for client in [&mut a, &mut b] {
        loop {
            match client.naechster_frame().await {
                Some(Frame::Close) => break,
                Some(_) => continue,
                None => panic!("Close-Frame fehlt"),
            }
        }
    }
    assert!(a_task.await.unwrap().is_ok());
    assert!(b_task.await.unwrap().is_ok());
    assert_eq!(manager.anzahl(), 0);
}
