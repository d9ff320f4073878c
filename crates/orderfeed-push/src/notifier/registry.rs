//! Registry of active foreground clients.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use orderfeed_core::types::ClientId;

use super::ClientMessage;

/// Per-client inbox depth. Wake signals coalesce, so a full inbox only
/// means a refresh is already pending.
const CLIENT_BUFFER: usize = 16;

/// One registered foreground client.
#[derive(Debug)]
pub struct ClientHandle {
    /// Client identifier.
    pub id: ClientId,
    /// Whether the client registered while a delivery context was active.
    pub controlled: bool,
    sender: mpsc::Sender<ClientMessage>,
    alive: AtomicBool,
}

impl ClientHandle {
    /// Post a message to the client. Returns `false` if it was not delivered.
    pub fn post(&self, message: ClientMessage) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(client_id = %self.id, "Client inbox full, message coalesced");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Whether the client can still receive messages.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

/// Every foreground client that may receive wake signals.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, Arc<ClientHandle>>,
    context_active: AtomicBool,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client and return its id and inbox.
    pub fn register(&self) -> (ClientId, mpsc::Receiver<ClientMessage>) {
        let (sender, receiver) = mpsc::channel(CLIENT_BUFFER);
        let handle = Arc::new(ClientHandle {
            id: ClientId::new(),
            controlled: self.context_active.load(Ordering::SeqCst),
            sender,
            alive: AtomicBool::new(true),
        });
        let id = handle.id;
        debug!(client_id = %id, controlled = handle.controlled, "Client registered");
        self.clients.insert(id, handle);
        (id, receiver)
    }

    /// Remove a client. Returns `false` if it was not registered.
    pub fn unregister(&self, id: ClientId) -> bool {
        match self.clients.remove(&id) {
            Some((_, handle)) => {
                handle.mark_dead();
                debug!(client_id = %id, "Client unregistered");
                true
            }
            None => false,
        }
    }

    /// All live clients, optionally including uncontrolled ones.
    pub fn match_all(&self, include_uncontrolled: bool) -> Vec<Arc<ClientHandle>> {
        self.clients
            .iter()
            .filter(|entry| entry.is_alive() && (include_uncontrolled || entry.controlled))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Post `message` to every live client. Returns how many accepted it.
    ///
    /// Clients whose inbox has closed are dropped from the registry.
    pub fn post_all(&self, message: &ClientMessage) -> usize {
        let clients = self.match_all(true);
        let delivered = clients.iter().filter(|c| c.post(message.clone())).count();
        if clients.iter().any(|c| !c.is_alive()) {
            self.prune();
        }
        if delivered < clients.len() {
            warn!(
                delivered = delivered,
                total = clients.len(),
                "Some clients did not accept the message"
            );
        }
        delivered
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Drop every client that can no longer receive.
    fn prune(&self) {
        self.clients.retain(|id, handle| {
            let alive = handle.is_alive();
            if !alive {
                debug!(client_id = %id, "Dead client removed");
            }
            alive
        });
    }

    pub(crate) fn set_context_active(&self, active: bool) {
        self.context_active.store(active, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controlled_flag_follows_context() {
        let registry = ClientRegistry::new();
        let (before, _rx1) = registry.register();
        registry.set_context_active(true);
        let (after, _rx2) = registry.register();

        let controlled: Vec<_> = registry.match_all(false).iter().map(|c| c.id).collect();
        assert_eq!(controlled, vec![after]);

        let all: Vec<_> = registry.match_all(true).iter().map(|c| c.id).collect();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&before));
    }

    #[tokio::test]
    async fn test_post_all_reaches_each_client_once() {
        let registry = ClientRegistry::new();
        let (_a, mut rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();

        assert_eq!(registry.post_all(&ClientMessage::PushUpdate), 2);

        assert_eq!(rx_a.recv().await, Some(ClientMessage::PushUpdate));
        assert_eq!(rx_b.recv().await, Some(ClientMessage::PushUpdate));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ClientRegistry::new();
        let (id, _rx) = registry.register();
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_inbox_marks_client_dead() {
        let registry = ClientRegistry::new();
        let (_id, rx) = registry.register();
        drop(rx);

        assert_eq!(registry.post_all(&ClientMessage::PushUpdate), 0);
        assert!(registry.match_all(true).is_empty());
    }

    #[tokio::test]
    async fn test_post_all_removes_closed_clients() {
        let registry = ClientRegistry::new();
        let (gone, rx_gone) = registry.register();
        let (kept, mut rx_kept) = registry.register();
        drop(rx_gone);

        assert_eq!(registry.post_all(&ClientMessage::PushUpdate), 1);

        assert_eq!(registry.len(), 1);
        assert!(!registry.unregister(gone));
        assert_eq!(rx_kept.recv().await, Some(ClientMessage::PushUpdate));
        assert!(registry.unregister(kept));
    }

    #[test]
    fn test_full_inbox_keeps_client_registered() {
        let registry = ClientRegistry::new();
        let (_id, _rx) = registry.register();
        for _ in 0..CLIENT_BUFFER {
            assert_eq!(registry.post_all(&ClientMessage::PushUpdate), 1);
        }

        assert_eq!(registry.post_all(&ClientMessage::PushUpdate), 0);
        assert_eq!(registry.len(), 1);
    }
}
