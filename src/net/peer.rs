//! Per-connection state for one live peer.
//!
//! A [`Peer`] owns no background activity of its own — the node drives it.
//! It holds the identity, lifecycle state, and the queue into the peer's
//! write task. All writes to the underlying stream go through that single
//! queue, which serializes them; state transitions happen only through the
//! node's disconnect path.

use std::net::SocketAddr;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::error::NetError;

/// Connection lifecycle state.
///
/// Advances monotonically `Connecting → Connected → Disconnecting →
/// Disconnected` and never reverts. A peer is present in the registry iff
/// its state is `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeerState {
    /// Dial or accept in progress (not yet registered).
    Connecting,
    /// Registered and exchanging frames.
    Connected,
    /// Removed from the registry, teardown in progress.
    Disconnecting,
    /// Teardown complete; the id may be reused by a new connection.
    Disconnected,
}

/// Whether the connection was accepted or dialed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Accepted by the listener.
    Inbound,
    /// Dialed by this node.
    Outbound,
}

/// Cloneable snapshot of a peer's identity, carried in events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// Canonical identifier: the remote `ip:port`.
    pub id: String,
    /// Remote socket address.
    pub addr: SocketAddr,
    /// Accepted or dialed.
    pub direction: Direction,
}

/// One live connection endpoint.
pub struct Peer {
    id: String,
    addr: SocketAddr,
    direction: Direction,
    state: Mutex<PeerState>,
    /// Queue into the write task. `None` once the disconnect path has
    /// closed the write side.
    frame_tx: Mutex<Option<UnboundedSender<Vec<u8>>>>,
    /// Receive-loop task handle, set right after spawn.
    read_handle: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Peer {
    /// Wrap an established connection. The socket is connected by the time
    /// a `Peer` exists, so it starts in `Connected`.
    pub(crate) fn new(
        id: String,
        addr: SocketAddr,
        direction: Direction,
        frame_tx: UnboundedSender<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            addr,
            direction,
            state: Mutex::new(PeerState::Connected),
            frame_tx: Mutex::new(Some(frame_tx)),
            read_handle: Mutex::new(None),
        }
    }

    /// Canonical identifier (`ip:port` of the remote).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remote socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accepted or dialed.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PeerState {
        *self.state.lock().expect("peer state mutex poisoned")
    }

    /// Snapshot for events and the `peers()` listing.
    pub fn info(&self) -> PeerInfo {
        PeerInfo {
            id: self.id.clone(),
            addr: self.addr,
            direction: self.direction,
        }
    }

    /// Queue a pre-encoded frame for the write task.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::WriteFailed`] if the peer is not `Connected` or
    /// the write side has already been closed.
    pub(crate) fn send_bytes(&self, bytes: Vec<u8>) -> Result<(), NetError> {
        if self.state() != PeerState::Connected {
            return Err(NetError::WriteFailed {
                id: self.id.clone(),
                reason: "peer is not connected".into(),
            });
        }
        let guard = self.frame_tx.lock().expect("peer frame_tx mutex poisoned");
        let sent = guard.as_ref().is_some_and(|tx| tx.send(bytes).is_ok());
        if sent {
            Ok(())
        } else {
            Err(NetError::WriteFailed {
                id: self.id.clone(),
                reason: "write queue closed".into(),
            })
        }
    }

    /// Step `Connected → Disconnecting`. Returns false (and changes
    /// nothing) from any other state, keeping the transition monotonic.
    pub(crate) fn begin_disconnect(&self) -> bool {
        let mut state = self.state.lock().expect("peer state mutex poisoned");
        if *state == PeerState::Connected {
            *state = PeerState::Disconnecting;
            true
        } else {
            false
        }
    }

    /// Step `Disconnecting → Disconnected`.
    pub(crate) fn finish_disconnect(&self) {
        let mut state = self.state.lock().expect("peer state mutex poisoned");
        if *state == PeerState::Disconnecting {
            *state = PeerState::Disconnected;
        }
    }

    /// Close the write side. Dropping the queue sender ends the write task,
    /// which flushes and shuts the socket down. Safe to call repeatedly.
    pub(crate) fn close_write(&self) {
        self.frame_tx
            .lock()
            .expect("peer frame_tx mutex poisoned")
            .take();
    }

    /// Record the receive-loop task handle after spawning it.
    pub(crate) fn set_read_handle(&self, handle: JoinHandle<()>) {
        *self.read_handle.lock().expect("peer read_handle mutex poisoned") = Some(handle);
    }

    /// Take ownership of the receive-loop handle (for shutdown waits).
    pub(crate) fn take_read_handle(&self) -> Option<JoinHandle<()>> {
        self.read_handle
            .lock()
            .expect("peer read_handle mutex poisoned")
            .take()
    }

    /// Abort the receive loop if its handle is still held. A no-op when the
    /// handle was already taken or the loop is calling this on itself (the
    /// abort lands at its next suspension point, after cleanup finished).
    pub(crate) fn abort_read(&self) {
        if let Some(handle) = self.take_read_handle() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn test_peer() -> (Peer, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        (
            Peer::new("127.0.0.1:9000".into(), addr, Direction::Inbound, tx),
            rx,
        )
    }

    #[test]
    fn test_state_advances_monotonically() {
        let (peer, _rx) = test_peer();
        assert_eq!(peer.state(), PeerState::Connected);

        assert!(peer.begin_disconnect());
        assert_eq!(peer.state(), PeerState::Disconnecting);

        // A second begin is a no-op, never a revert.
        assert!(!peer.begin_disconnect());
        assert_eq!(peer.state(), PeerState::Disconnecting);

        peer.finish_disconnect();
        assert_eq!(peer.state(), PeerState::Disconnected);

        assert!(!peer.begin_disconnect());
        assert_eq!(peer.state(), PeerState::Disconnected);
    }

    #[test]
    fn test_send_queues_to_write_task() {
        let (peer, mut rx) = test_peer();
        peer.send_bytes(vec![1, 2, 3]).unwrap();
        assert_eq!(rx.try_recv().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_send_fails_when_not_connected() {
        let (peer, _rx) = test_peer();
        peer.begin_disconnect();
        let err = peer.send_bytes(vec![0]).unwrap_err();
        assert!(matches!(err, NetError::WriteFailed { .. }));
    }

    #[test]
    fn test_close_write_is_idempotent_and_ends_queue() {
        let (peer, mut rx) = test_peer();
        peer.close_write();
        peer.close_write(); // second close is a no-op
        assert!(rx.blocking_recv().is_none());
    }
}
