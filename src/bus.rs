//! Message Bus (C5): per-session fan-out with per-message-type backpressure.
//!
//! Grounded on the reference's in-memory message coordinator, but split by
//! policy per spec §4.3's bus table: `remote_input`/`webrtc_signal` are
//! addressed and lossy (drop silently under pressure); `room_state` is
//! broadcast and best-effort (a dropped snapshot is superseded by the next
//! one); `chat` blocks briefly and disconnects a subscriber whose backlog
//! exceeds `max_chat_backlog`; `session_closed` is a terminal broadcast.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};

use crate::protocol::{ClientId, ServerMessage};

const CHAT_SEND_TIMEOUT: Duration = Duration::from_millis(50);

struct ConnectionSlot {
    outbound: mpsc::Sender<ServerMessage>,
    superseded_tx: Option<oneshot::Sender<()>>,
    kicked_tx: Option<oneshot::Sender<()>>,
}

/// Returned by [`SessionBus::subscribe`]. `superseded` resolves when a later
/// call to `subscribe` for the same client supersedes this connection
/// (spec §4.4's reconnect-supersede transition, close code 4409). `kicked`
/// resolves when the host removes this member (close code 4403).
pub struct Subscription {
    pub receiver: mpsc::Receiver<ServerMessage>,
    pub superseded: oneshot::Receiver<()>,
    pub kicked: oneshot::Receiver<()>,
}

#[derive(Default)]
pub struct SessionBus {
    subscribers: Mutex<HashMap<ClientId, ConnectionSlot>>,
}

impl SessionBus {
    pub async fn subscribe(&self, client_id: ClientId, capacity: usize) -> Subscription {
        let (tx, rx) = mpsc::channel(capacity);
        let (superseded_tx, superseded_rx) = oneshot::channel();
        let (kicked_tx, kicked_rx) = oneshot::channel();
        let mut subscribers = self.subscribers.lock().await;
        if let Some(mut old) = subscribers.remove(&client_id) {
            if let Some(notify) = old.superseded_tx.take() {
                let _ = notify.send(());
            }
        }
        subscribers.insert(
            client_id,
            ConnectionSlot {
                outbound: tx,
                superseded_tx: Some(superseded_tx),
                kicked_tx: Some(kicked_tx),
            },
        );
        Subscription {
            receiver: rx,
            superseded: superseded_rx,
            kicked: kicked_rx,
        }
    }

    pub async fn unsubscribe(&self, client_id: &str) {
        self.subscribers.lock().await.remove(client_id);
    }

    /// Notify `target`'s connection task that the host removed it, then drop
    /// its subscription (spec §4.4, close code 4403).
    pub async fn kick(&self, target: &str) {
        if let Some(mut slot) = self.subscribers.lock().await.remove(target) {
            if let Some(notify) = slot.kicked_tx.take() {
                let _ = notify.send(());
            }
        }
    }

    #[must_use]
    pub async fn is_subscribed(&self, client_id: &str) -> bool {
        self.subscribers.lock().await.contains_key(client_id)
    }

    /// Addressed, lossy delivery used for `remote_input` and `webrtc_signal`
    /// (I5/I6: best-effort, never blocks the sender's mutator).
    pub async fn send_to(&self, target: &str, message: ServerMessage) -> bool {
        let subscribers = self.subscribers.lock().await;
        match subscribers.get(target) {
            Some(slot) => slot.outbound.try_send(message).is_ok(),
            None => false,
        }
    }

    /// Broadcast `room_state` to every subscriber. A full queue just drops
    /// this snapshot — the next mutation re-broadcasts a fresher one.
    pub async fn broadcast_room_state(&self, message: ServerMessage) {
        let subscribers = self.subscribers.lock().await;
        for slot in subscribers.values() {
            let _ = slot.outbound.try_send(message.clone());
        }
    }

    /// Broadcast chat to every subscriber including the sender. Blocks
    /// briefly per-subscriber; returns clients whose backlog forces a
    /// disconnect.
    pub async fn broadcast_chat(&self, message: ServerMessage) -> Vec<ClientId> {
        let subscribers = self.subscribers.lock().await;
        let mut overloaded = Vec::new();
        for (client_id, slot) in subscribers.iter() {
            let sent = tokio::time::timeout(CHAT_SEND_TIMEOUT, slot.outbound.send(message.clone()))
                .await;
            if !matches!(sent, Ok(Ok(()))) {
                overloaded.push(client_id.clone());
            }
        }
        overloaded
    }

    /// Terminal broadcast when a session closes (spec §4.4, close code 4000).
    pub async fn broadcast_closed(&self, reason: &str) {
        let message = ServerMessage::SessionClosed {
            reason: reason.to_string(),
        };
        let subscribers = self.subscribers.lock().await;
        for slot in subscribers.values() {
            let _ = slot.outbound.try_send(message.clone());
        }
    }
}
