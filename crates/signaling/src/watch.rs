//! WatchSession – Sitzungslogik (Leader, Medium, Vorschaubild)
//!
//! Einziger Listener eines Hubs. Reagiert synchron auf jede Nachricht und
//! antwortet ausschliesslich ueber `HubKontext::senden`.
//!
//! | Ereignis          | Wirkung                                                    |
//! |-------------------|------------------------------------------------------------|
//! | Info/register     | erster Client wird Leader; ViewCount an alle               |
//! | Info/deregister   | Leader weg -> fruehester verbleibender Client; ViewCount   |
//! | Info/users        | Namensliste gezielt an den Anfragenden                     |
//! | Info/name         | Namen setzen; Namensliste an alle                          |
//! | Info/media        | Leader: Medium setzen + Control/media an alle;             |
//! |                   | sonst: aktuelles Medium gezielt an den Anfragenden         |
//! | Info/thumbnail    | Leader: Vorschaubild setzen                                |
//! | Control/*         | unveraendert an alle                                       |
//! | UserMessage       | mit Anzeigename als Action an alle                         |

use cinesync_core::types::ClientId;
use cinesync_protocol::{InfoAktion, Message, MessageType, aktionen};
use serde_json::Value;
use tokio::sync::watch;

use crate::hub::{HubKontext, HubListener};

/// Anzeigename fuer Clients ohne gesetzten Namen
pub const STANDARD_NAME: &str = "Anonymoose";

/// Von aussen lesbarer Zustand einer Sitzung
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchStatus {
    pub leader: Option<ClientId>,
    pub media: String,
    pub thumbnail: String,
}

/// Zustandsmaschine einer Sitzung
pub struct WatchSession {
    leader: Option<ClientId>,
    media: String,
    thumbnail: String,
    status_tx: watch::Sender<WatchStatus>,
}

impl WatchSession {
    /// Erstellt eine leere Sitzung samt Status-Empfaenger
    pub fn neu() -> (Self, watch::Receiver<WatchStatus>) {
        let (status_tx, status_rx) = watch::channel(WatchStatus::default());
        let sitzung = Self {
            leader: None,
            media: String::new(),
            thumbnail: String::new(),
            status_tx,
        };
        (sitzung, status_rx)
    }

    fn status_veroeffentlichen(&self) {
        let neu = WatchStatus {
            leader: self.leader,
            media: self.media.clone(),
            thumbnail: self.thumbnail.clone(),
        };
        self.status_tx.send_if_modified(|alt| {
            if *alt == neu {
                return false;
            }
            *alt = neu;
            true
        });
    }

    // -----------------------------------------------------------------------
    // Control / UserMessage
    // -----------------------------------------------------------------------

    fn control(&self, m: &Message, hub: &mut HubKontext) {
        if m.subject != self.leader {
            // Nur diagnostisch: die Nachricht wird trotzdem weitergeleitet
            tracing::warn!(
                session_id = %hub.session_id(),
                aktion = %m.action,
                "Control-Nachricht von Nicht-Leader"
            );
        }
        hub.senden(Message::control(None, m.action.clone(), m.data.clone()));
    }

    fn user_message(&self, m: &Message, hub: &mut HubKontext) {
        let name = m
            .subject
            .as_ref()
            .and_then(|c| hub.name(c))
            .filter(|n| !n.is_empty())
            .unwrap_or(STANDARD_NAME)
            .to_string();
        hub.senden(Message::user_message(name, m.data.clone()));
    }

    // -----------------------------------------------------------------------
    // Info
    // -----------------------------------------------------------------------

    fn info(&mut self, m: &Message, hub: &mut HubKontext) {
        let aktion = match InfoAktion::aus_nachricht(m) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(
                    session_id = %hub.session_id(),
                    fehler = %e,
                    "Info-Nachricht mit ungueltigem Payload verworfen"
                );
                return;
            }
        };

        match aktion {
            InfoAktion::Registrieren => self.registrieren(m.subject, hub),
            InfoAktion::Abmelden => self.abmelden(m.subject, hub),
            InfoAktion::Benutzer => benutzer_senden(m.subject, hub),
            InfoAktion::Name(name) => {
                if let Some(client) = m.subject {
                    tracing::debug!(client_id = %client, name = %name, "Name gesetzt");
                    hub.name_setzen(&client, name);
                }
                benutzer_senden(None, hub);
            }
            InfoAktion::Medium(medium) => self.medium(m.subject, medium, hub),
            InfoAktion::Vorschaubild(bild) => {
                if m.subject.is_some() && m.subject == self.leader {
                    self.thumbnail = bild;
                    self.status_veroeffentlichen();
                } else {
                    tracing::debug!(
                        session_id = %hub.session_id(),
                        "Vorschaubild von Nicht-Leader ignoriert"
                    );
                }
            }
            InfoAktion::Unbekannt(aktion) => {
                tracing::debug!(
                    session_id = %hub.session_id(),
                    aktion = %aktion,
                    "Unbekannte Info-Aktion ignoriert"
                );
            }
        }
    }

    fn registrieren(&mut self, client: Option<ClientId>, hub: &mut HubKontext) {
        if self.leader.is_none() {
            if let Some(neu) = client {
                self.leader_setzen(Some(neu), hub);
            }
        }
        hub.senden(Message::view_count(hub.anzahl()));
    }

    fn abmelden(&mut self, client: Option<ClientId>, hub: &mut HubKontext) {
        if client.is_some() && client == self.leader {
            // Der abgemeldete Client ist nicht mehr im Register
            let nachfolger = hub.alle_clients().first().copied();
            self.leader_setzen(nachfolger, hub);
        }
        hub.senden(Message::view_count(hub.anzahl()));
    }

    fn leader_setzen(&mut self, leader: Option<ClientId>, hub: &mut HubKontext) {
        self.leader = leader;
        self.status_veroeffentlichen();
        if let Some(client) = leader {
            tracing::info!(
                session_id = %hub.session_id(),
                client_id = %client,
                "Neuer Leader"
            );
            hub.senden(Message::info(Some(client), aktionen::LEADER, Value::Null));
        }
    }

    fn medium(&mut self, client: Option<ClientId>, medium: String, hub: &mut HubKontext) {
        if client.is_some() && client == self.leader {
            self.media = medium;
            self.status_veroeffentlichen();
            hub.senden(Message::control(
                None,
                aktionen::MEDIA,
                Value::String(self.media.clone()),
            ));
        } else if !self.media.is_empty() {
            // Nachzuegler bekommt das aktuelle Medium
            hub.senden(Message::control(
                client,
                aktionen::MEDIA,
                Value::String(self.media.clone()),
            ));
        }
    }
}

/// Sendet die nicht-leeren Anzeigenamen (gezielt oder an alle)
fn benutzer_senden(an: Option<ClientId>, hub: &mut HubKontext) {
    let namen: Vec<Value> = hub
        .alle_clients()
        .iter()
        .filter_map(|c| hub.name(c))
        .filter(|n| !n.is_empty())
        .map(|n| Value::String(n.to_string()))
        .collect();
    hub.senden(Message::info(an, aktionen::USERS, Value::Array(namen)));
}

impl HubListener for WatchSession {
    fn empfangen(&mut self, nachricht: &Message, hub: &mut HubKontext) {
        tracing::trace!(
            session_id = %hub.session_id(),
            typ = %nachricht.kind,
            aktion = %nachricht.action,
            "Nachricht"
        );
        match nachricht.kind {
            MessageType::Control => self.control(nachricht, hub),
            MessageType::Info => self.info(nachricht, hub),
            MessageType::UserMessage => self.user_message(nachricht, hub),
            MessageType::ViewCount => {}
        }
    }
}
