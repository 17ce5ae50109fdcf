//! Broadcast-Hub – Client-Register und Nachrichtenverteilung einer Sitzung
//!
//! Jede Sitzung besitzt genau einen Hub. Der Hub laeuft als eigener
//! tokio-Task und ist der einzige Besitzer des Client-Registers. Alle
//! anderen Komponenten sprechen ihn ausschliesslich ueber [`HubHandle`]
//! (Ereignis-Queue) an und halten nie Referenzen in das Register.
//!
//! ## Ablauf
//! ```text
//! ClientConnection --Anmelden/Abmelden/Eingang--> Ereignis-Queue
//!                                                     |
//!                                                     v
//!                                            Hub-Schleife (seriell)
//!                                                     |
//!                                     Listener (WatchSession) --senden--> Client-Queues
//! ```
//!
//! ## Gegendruck
//! Ausgehende Nachrichten werden per `try_send` eingereiht. Ist die Queue
//! eines Clients voll, gilt der Client als tot: er wird sofort aus dem
//! Register entfernt, seine Queue damit geschlossen, und die Listener
//! erhalten nach Abschluss der laufenden Verarbeitung ein
//! `Info/"deregister"`-Ereignis fuer ihn.

use cinesync_core::types::{ClientId, SessionId};
use cinesync_protocol::{Message, MessageType, aktionen};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{SignalingError, SignalingResult};

/// Element einer ausgehenden Client-Queue (fertig serialisierter Frame)
pub type AusgehenderFrame = Arc<str>;

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Empfaenger aller Nachrichten eines Hubs
///
/// Wird synchron in der Hub-Schleife aufgerufen und darf daher nicht
/// blockieren. Im Normalbetrieb ist genau ein Listener registriert (die
/// `WatchSession`); weitere sind moeglich und werden in
/// Registrierungsreihenfolge aufgerufen.
pub trait HubListener: Send + 'static {
    fn empfangen(&mut self, nachricht: &Message, hub: &mut HubKontext);
}

impl<F> HubListener for F
where
    F: FnMut(&Message, &mut HubKontext) + Send + 'static,
{
    fn empfangen(&mut self, nachricht: &Message, hub: &mut HubKontext) {
        self(nachricht, hub)
    }
}

// ---------------------------------------------------------------------------
// Ereignisse
// ---------------------------------------------------------------------------

/// Ereignisse der Hub-Queue
///
/// Eine einzige geordnete Queue: Ereignisse eines Produzenten kommen in
/// Sendereihenfolge an, auch ueber verschiedene Ereignisarten hinweg.
#[derive(Debug)]
enum HubEreignis {
    Anmelden {
        client: ClientId,
        queue: mpsc::Sender<AusgehenderFrame>,
    },
    Abmelden {
        client: ClientId,
    },
    Eingang {
        client: ClientId,
        rohdaten: Vec<u8>,
    },
    Senden(Message),
    Abfrage(oneshot::Sender<Vec<ClientId>>),
}

// ---------------------------------------------------------------------------
// HubKontext
// ---------------------------------------------------------------------------

/// Registereintrag eines verbundenen Clients
#[derive(Debug)]
struct ClientEintrag {
    name: String,
    queue: mpsc::Sender<AusgehenderFrame>,
}

/// Zustand des Hubs, den Listener waehrend eines Aufrufs sehen
///
/// Lebt ausschliesslich in der Hub-Schleife.
pub struct HubKontext {
    session_id: SessionId,
    clients: IndexMap<ClientId, ClientEintrag>,
    /// Wegen voller Queue entfernte Clients, deren Abmeldung noch aussteht
    verworfen: Vec<ClientId>,
    zuschauer_tx: watch::Sender<usize>,
}

impl HubKontext {
    fn neu(session_id: SessionId, zuschauer_tx: watch::Sender<usize>) -> Self {
        Self {
            session_id,
            clients: IndexMap::new(),
            verworfen: Vec::new(),
            zuschauer_tx,
        }
    }

    /// ID der Sitzung, zu der dieser Hub gehoert
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Anzahl der aktuell registrierten Clients
    pub fn anzahl(&self) -> usize {
        self.clients.len()
    }

    /// Momentaufnahme aller registrierten Clients in Beitrittsreihenfolge
    pub fn alle_clients(&self) -> Vec<ClientId> {
        self.clients.keys().copied().collect()
    }

    /// Anzeigename eines Clients (leer wenn nie gesetzt)
    pub fn name(&self, client: &ClientId) -> Option<&str> {
        self.clients.get(client).map(|e| e.name.as_str())
    }

    /// Setzt den Anzeigenamen; `false` wenn der Client nicht registriert ist
    pub fn name_setzen(&mut self, client: &ClientId, name: impl Into<String>) -> bool {
        match self.clients.get_mut(client) {
            Some(eintrag) => {
                eintrag.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Verteilt eine Nachricht
    ///
    /// Ohne `subject` geht sie an alle registrierten Clients, sonst nur an
    /// den Empfaenger. Ein nicht (mehr) registrierter Empfaenger wird still
    /// ignoriert. Volle oder geschlossene Queues fuehren zur sofortigen
    /// Entfernung des Clients; der Aufrufer wird nie blockiert.
    pub fn senden(&mut self, nachricht: Message) {
        let frame: AusgehenderFrame = match nachricht.marshal() {
            Ok(text) => text.into(),
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    fehler = %e,
                    "Nachricht nicht serialisierbar – verworfen"
                );
                return;
            }
        };

        let mut tot = Vec::new();
        match nachricht.subject {
            None => {
                for (id, eintrag) in &self.clients {
                    if !self.einreihen(id, eintrag, &frame) {
                        tot.push(*id);
                    }
                }
                tracing::trace!(
                    session_id = %self.session_id,
                    empfaenger = self.clients.len(),
                    typ = %nachricht.kind,
                    "Broadcast"
                );
            }
            Some(empfaenger) => match self.clients.get(&empfaenger) {
                Some(eintrag) => {
                    if !self.einreihen(&empfaenger, eintrag, &frame) {
                        tot.push(empfaenger);
                    }
                }
                None => {
                    tracing::debug!(
                        session_id = %self.session_id,
                        client_id = %empfaenger,
                        "Empfaenger nicht registriert – Nachricht verworfen"
                    );
                }
            },
        }

        // Entfernen erst nach dem Durchlauf
        for id in tot {
            if self.clients.shift_remove(&id).is_some() {
                self.verworfen.push(id);
            }
        }
        self.zuschauer_veroeffentlichen();
    }

    fn einreihen(&self, id: &ClientId, eintrag: &ClientEintrag, frame: &AusgehenderFrame) -> bool {
        match eintrag.queue.try_send(Arc::clone(frame)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    client_id = %id,
                    "Send-Queue voll – Client wird getrennt"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    session_id = %self.session_id,
                    client_id = %id,
                    "Send-Queue geschlossen – Client wird entfernt"
                );
                false
            }
        }
    }

    fn zuschauer_veroeffentlichen(&self) {
        self.zuschauer_tx.send_if_modified(|alt| {
            let neu = self.clients.len();
            let geaendert = *alt != neu;
            *alt = neu;
            geaendert
        });
    }
}

// ---------------------------------------------------------------------------
// HubHandle
// ---------------------------------------------------------------------------

/// Klonbarer Zugang zu einem laufenden Hub
#[derive(Clone, Debug)]
pub struct HubHandle {
    session_id: SessionId,
    tx: mpsc::Sender<HubEreignis>,
    zuschauer: watch::Receiver<usize>,
    stopp: CancellationToken,
}

impl HubHandle {
    /// ID der zugehoerigen Sitzung
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Registriert einen Client mit seiner ausgehenden Queue
    pub async fn anmelden(
        &self,
        client: ClientId,
        queue: mpsc::Sender<AusgehenderFrame>,
    ) -> SignalingResult<()> {
        self.ereignis(HubEreignis::Anmelden { client, queue }).await
    }

    /// Meldet einen Client ab (idempotent)
    pub async fn abmelden(&self, client: ClientId) -> SignalingResult<()> {
        self.ereignis(HubEreignis::Abmelden { client }).await
    }

    /// Reicht einen rohen eingehenden Frame eines Clients ein
    pub async fn eingang(&self, client: ClientId, rohdaten: Vec<u8>) -> SignalingResult<()> {
        self.ereignis(HubEreignis::Eingang { client, rohdaten }).await
    }

    /// Verteilt eine Nachricht von ausserhalb der Hub-Schleife
    pub async fn senden(&self, nachricht: Message) -> SignalingResult<()> {
        self.ereignis(HubEreignis::Senden(nachricht)).await
    }

    /// Momentaufnahme der registrierten Clients
    ///
    /// Wird in der Hub-Schleife beantwortet; alle vorher eingereichten
    /// Ereignisse desselben Aufrufers sind dann bereits verarbeitet.
    pub async fn alle_clients(&self) -> SignalingResult<Vec<ClientId>> {
        let (tx, rx) = oneshot::channel();
        self.ereignis(HubEreignis::Abfrage(tx)).await?;
        rx.await.map_err(|_| SignalingError::HubBeendet)
    }

    /// Aktuelle Zuschauerzahl (zuletzt vom Hub veroeffentlicht)
    pub fn zuschauer(&self) -> usize {
        *self.zuschauer.borrow()
    }

    /// Beendet die Hub-Schleife; alle Client-Queues werden geschlossen
    pub fn stoppen(&self) {
        self.stopp.cancel();
    }

    /// Gibt true zurueck wenn der Hub gestoppt wurde
    pub fn ist_gestoppt(&self) -> bool {
        self.stopp.is_cancelled()
    }

    async fn ereignis(&self, ereignis: HubEreignis) -> SignalingResult<()> {
        if self.stopp.is_cancelled() {
            return Err(SignalingError::HubBeendet);
        }
        self.tx
            .send(ereignis)
            .await
            .map_err(|_| SignalingError::HubBeendet)
    }
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// Ereignisschleife einer Sitzung
pub struct Hub {
    kontext: HubKontext,
    listener: Vec<Box<dyn HubListener>>,
    rx: mpsc::Receiver<HubEreignis>,
    stopp: CancellationToken,
}

impl Hub {
    /// Erstellt einen Hub samt Handle; die Schleife laeuft erst nach `starten`
    pub fn neu(session_id: SessionId, queue_groesse: usize) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(queue_groesse.max(1));
        let (zuschauer_tx, zuschauer_rx) = watch::channel(0);
        let stopp = CancellationToken::new();

        let hub = Self {
            kontext: HubKontext::neu(session_id, zuschauer_tx),
            listener: Vec::new(),
            rx,
            stopp: stopp.clone(),
        };
        let handle = HubHandle {
            session_id,
            tx,
            zuschauer: zuschauer_rx,
            stopp,
        };
        (hub, handle)
    }

    /// Haengt einen Listener an (vor dem Start)
    pub fn listener_registrieren(&mut self, listener: impl HubListener) {
        self.listener.push(Box::new(listener));
    }

    /// Startet die Ereignisschleife als eigenen Task
    pub fn starten(self) -> JoinHandle<()> {
        tokio::spawn(self.laufen())
    }

    /// Ereignisschleife; endet bei `stoppen` oder wenn alle Handles weg sind
    async fn laufen(mut self) {
        let session_id = self.kontext.session_id;
        tracing::debug!(session_id = %session_id, "Hub gestartet");

        loop {
            let ereignis = tokio::select! {
                biased;
                _ = self.stopp.cancelled() => break,
                ereignis = self.rx.recv() => match ereignis {
                    Some(e) => e,
                    None => break,
                },
            };
            self.verarbeiten(ereignis);
            self.verworfene_abmelden();
        }

        // Register leeren schliesst alle Client-Queues
        let verbleibend = self.kontext.clients.len();
        self.kontext.clients.clear();
        self.kontext.zuschauer_veroeffentlichen();
        self.stopp.cancel();
        tracing::debug!(session_id = %session_id, verbleibend, "Hub beendet");
    }

    fn verarbeiten(&mut self, ereignis: HubEreignis) {
        match ereignis {
            HubEreignis::Anmelden { client, queue } => self.anmelden(client, queue),
            HubEreignis::Abmelden { client } => self.abmelden(client),
            HubEreignis::Eingang { client, rohdaten } => self.dispatch(client, &rohdaten),
            HubEreignis::Senden(nachricht) => self.kontext.senden(nachricht),
            HubEreignis::Abfrage(antwort) => {
                let _ = antwort.send(self.kontext.alle_clients());
            }
        }
    }

    fn anmelden(&mut self, client: ClientId, queue: mpsc::Sender<AusgehenderFrame>) {
        if self.kontext.clients.contains_key(&client) {
            tracing::warn!(
                session_id = %self.kontext.session_id,
                client_id = %client,
                "Client bereits registriert – Anmeldung ignoriert"
            );
            return;
        }
        self.kontext.clients.insert(
            client,
            ClientEintrag {
                name: String::new(),
                queue,
            },
        );
        self.kontext.zuschauer_veroeffentlichen();
        tracing::info!(
            session_id = %self.kontext.session_id,
            client_id = %client,
            clients = self.kontext.clients.len(),
            "Client registriert"
        );
        self.an_listener(&Message::info(
            Some(client),
            aktionen::REGISTER,
            Value::String(String::new()),
        ));
    }

    fn abmelden(&mut self, client: ClientId) {
        // Doppelte Abmeldungen (z.B. nach Verwerfen) sind ein No-op
        if self.kontext.clients.shift_remove(&client).is_none() {
            return;
        }
        self.kontext.zuschauer_veroeffentlichen();
        tracing::info!(
            session_id = %self.kontext.session_id,
            client_id = %client,
            clients = self.kontext.clients.len(),
            "Client abgemeldet"
        );
        self.abmeldung_melden(client);
    }

    fn abmeldung_melden(&mut self, client: ClientId) {
        self.an_listener(&Message::info(
            Some(client),
            aktionen::DEREGISTER,
            Value::String(String::new()),
        ));
    }

    fn dispatch(&mut self, client: ClientId, rohdaten: &[u8]) {
        if !self.kontext.clients.contains_key(&client) {
            tracing::debug!(
                session_id = %self.kontext.session_id,
                client_id = %client,
                "Frame von nicht registriertem Client verworfen"
            );
            return;
        }

        let mut nachricht = match Message::parse(rohdaten) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(
                    session_id = %self.kontext.session_id,
                    client_id = %client,
                    fehler = %e,
                    frame = %String::from_utf8_lossy(rohdaten),
                    "Ungueltige Nachricht empfangen – verworfen"
                );
                return;
            }
        };
        // An- und Abmeldungen erzeugt nur der Hub selbst
        if nachricht.kind == MessageType::Info
            && (nachricht.action == aktionen::REGISTER || nachricht.action == aktionen::DEREGISTER)
        {
            tracing::debug!(
                session_id = %self.kontext.session_id,
                client_id = %client,
                aktion = %nachricht.action,
                "Info-Aktion vom Client nicht erlaubt – verworfen"
            );
            return;
        }
        nachricht.subject = Some(client);
        self.an_listener(&nachricht);
    }

    /// Meldet Clients ab, die waehrend der letzten Verarbeitung verworfen wurden
    fn verworfene_abmelden(&mut self) {
        loop {
            let verworfen = std::mem::take(&mut self.kontext.verworfen);
            if verworfen.is_empty() {
                break;
            }
            for client in verworfen {
                self.abmeldung_melden(client);
            }
        }
    }

    fn an_listener(&mut self, nachricht: &Message) {
        for listener in &mut self.listener {
            listener.empfangen(nachricht, &mut self.kontext);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
