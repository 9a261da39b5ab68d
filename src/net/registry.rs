//! Thread-safe table of currently connected peers.
//!
//! The registry is the only structure mutated from multiple tasks; a single
//! mutex makes `add`/`remove` mutually exclusive with each other and with
//! `snapshot`. The live table is never exposed for external iteration —
//! callers get point-in-time copies, so iterating a snapshot never observes
//! a concurrent disconnect.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::peer::Peer;

/// Mapping from peer id (`ip:port`) to live peer.
#[derive(Debug, Default)]
pub(crate) struct PeerRegistry {
    peers: Mutex<HashMap<String, Arc<Peer>>>,
}

impl PeerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a peer. Returns false without replacing when the id is
    /// already occupied — an id is reused only after the prior entry was
    /// removed.
    pub(crate) fn add(&self, peer: Arc<Peer>) -> bool {
        let mut peers = self.peers.lock().expect("registry mutex poisoned");
        match peers.entry(peer.id().to_string()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(peer);
                true
            }
        }
    }

    /// Remove and return the peer with this id, if present.
    ///
    /// This is the atomic gate of the disconnect path: exactly one caller
    /// observes `Some` per connection, which makes disconnection idempotent.
    pub(crate) fn remove(&self, id: &str) -> Option<Arc<Peer>> {
        self.peers.lock().expect("registry mutex poisoned").remove(id)
    }

    /// Look up a peer by id.
    pub(crate) fn get(&self, id: &str) -> Option<Arc<Peer>> {
        self.peers
            .lock()
            .expect("registry mutex poisoned")
            .get(id)
            .cloned()
    }

    /// Point-in-time copy of all live peers.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Peer>> {
        self.peers
            .lock()
            .expect("registry mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Number of live peers.
    pub(crate) fn len(&self) -> usize {
        self.peers.lock().expect("registry mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::peer::Direction;
    use tokio::sync::mpsc;

    fn peer(id: &str) -> Arc<Peer> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(Peer::new(
            id.to_string(),
            id.parse().unwrap(),
            Direction::Inbound,
            tx,
        ))
    }

    #[test]
    fn test_add_get_remove() {
        let registry = PeerRegistry::new();
        assert!(registry.add(peer("127.0.0.1:1000")));
        assert_eq!(registry.len(), 1);

        let found = registry.get("127.0.0.1:1000").unwrap();
        assert_eq!(found.id(), "127.0.0.1:1000");

        assert!(registry.remove("127.0.0.1:1000").is_some());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("127.0.0.1:1000").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let registry = PeerRegistry::new();
        assert!(registry.add(peer("127.0.0.1:1000")));
        assert!(!registry.add(peer("127.0.0.1:1000")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_id_reusable_after_removal() {
        let registry = PeerRegistry::new();
        assert!(registry.add(peer("127.0.0.1:1000")));
        registry.remove("127.0.0.1:1000");
        assert!(registry.add(peer("127.0.0.1:1000")));
    }

    #[test]
    fn test_remove_absent_is_none() {
        let registry = PeerRegistry::new();
        assert!(registry.remove("127.0.0.1:9999").is_none());
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let registry = PeerRegistry::new();
        registry.add(peer("127.0.0.1:1000"));
        registry.add(peer("127.0.0.1:1001"));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);

        // Mutating after the snapshot does not affect it.
        registry.remove("127.0.0.1:1000");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len(), 1);
    }
}
