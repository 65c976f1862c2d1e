use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::ServerEvent;

/// Outbound side of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: Uuid,
    sender: mpsc::Sender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    pub fn sender(&self) -> &mpsc::Sender<ServerEvent> {
        &self.sender
    }
}

/// Which user is reachable on which connection. One connection per user;
/// the most recent join wins.
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    connections: Arc<RwLock<HashMap<String, ConnectionHandle>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, user_id: &str, handle: ConnectionHandle) {
        let mut connections = self.connections.write().await;
        if let Some(previous) = connections.insert(user_id.to_string(), handle) {
            debug!("User {} replaced connection {}", user_id, previous.id);
        }
        info!("User {} is online", user_id);
    }

    /// Drop every entry bound to this connection. Returns the affected users.
    pub async fn disconnect(&self, connection_id: Uuid) -> Vec<String> {
        let mut connections = self.connections.write().await;
        let gone: Vec<String> = connections
            .iter()
            .filter(|(_, handle)| handle.id == connection_id)
            .map(|(user_id, _)| user_id.clone())
            .collect();

        for user_id in &gone {
            connections.remove(user_id);
            info!("User {} went offline", user_id);
        }
        gone
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.connections.read().await.contains_key(user_id)
    }

    pub async fn online_users(&self) -> Vec<String> {
        let connections = self.connections.read().await;
        let mut users: Vec<String> = connections.keys().cloned().collect();
        users.sort();
        users
    }

    /// Best-effort push to the user's live connection. Returns whether the
    /// event was queued; a miss is not an error.
    pub async fn relay(&self, user_id: &str, event: ServerEvent) -> bool {
        let handle = {
            let connections = self.connections.read().await;
            connections.get(user_id).cloned()
        };

        let Some(handle) = handle else {
            debug!("User {} is offline, message kept for history", user_id);
            return false;
        };

        match handle.sender.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to relay to {} on {}: {}", user_id, handle.id, e);
                false
            }
        }
    }

    /// Forget every connection. Used on shutdown.
    pub async fn clear(&self) {
        let mut connections = self.connections.write().await;
        let count = connections.len();
        connections.clear();
        info!("Cleared {} presence entries", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReceivedMessage;

    fn event(body: &str) -> ServerEvent {
        ServerEvent::ReceiveMessage(ReceivedMessage {
            sender_id: "alice".into(),
            message: body.into(),
        })
    }

    #[tokio::test]
    async fn last_join_wins() {
        let registry = PresenceRegistry::new();
        let (old_tx, mut old_rx) = mpsc::channel(4);
        let (new_tx, mut new_rx) = mpsc::channel(4);

        registry.join("bob", ConnectionHandle::new(old_tx)).await;
        registry.join("bob", ConnectionHandle::new(new_tx)).await;

        assert!(registry.relay("bob", event("hi")).await);
        assert_eq!(new_rx.recv().await, Some(event("hi")));
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_removes_only_matching_handles() {
        let registry = PresenceRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let shared = ConnectionHandle::new(tx.clone());
        let other = ConnectionHandle::new(tx);

        registry.join("alice", shared.clone()).await;
        registry.join("alice-alt", shared.clone()).await;
        registry.join("bob", other).await;

        let mut gone = registry.disconnect(shared.id).await;
        gone.sort();

        assert_eq!(gone, vec!["alice".to_string(), "alice-alt".to_string()]);
        assert_eq!(registry.online_users().await, vec!["bob".to_string()]);
    }

    #[tokio::test]
    async fn stale_disconnect_keeps_newer_connection() {
        let registry = PresenceRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let first = ConnectionHandle::new(tx.clone());
        let second = ConnectionHandle::new(tx);

        registry.join("bob", first.clone()).await;
        registry.join("bob", second).await;

        assert!(registry.disconnect(first.id).await.is_empty());
        assert!(registry.is_online("bob").await);
    }

    #[tokio::test]
    async fn relay_misses_are_not_errors() {
        let registry = PresenceRegistry::new();
        assert!(!registry.relay("nobody", event("hi")).await);

        // Full channel
        let (tx, _rx) = mpsc::channel(1);
        registry.join("bob", ConnectionHandle::new(tx)).await;
        assert!(registry.relay("bob", event("one")).await);
        assert!(!registry.relay("bob", event("two")).await);

        // Closed channel
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        registry.join("carol", ConnectionHandle::new(tx)).await;
        assert!(!registry.relay("carol", event("hi")).await);
    }

    #[tokio::test]
    async fn clear_empties_registry() {
        let registry = PresenceRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.join("bob", ConnectionHandle::new(tx)).await;

        registry.clear().await;
        assert!(registry.online_users().await.is_empty());
    }
}
