//! Lifecycle events emitted by the connection subsystem.
//!
//! All background producers (the accept loop, dials, and per-peer receive
//! loops) publish through a single `mpsc::UnboundedSender<NetEvent>`.
//! Collaborators (console, history, future encryption layer) consume the
//! receiver; events are notifications, never requests for permission, so
//! a slow consumer cannot stall the network paths.

use crate::message::Message;

use super::peer::PeerInfo;

/// Notification delivered to the subsystem's event consumer.
#[derive(Debug, Clone)]
pub enum NetEvent {
    /// A peer was accepted or dialed and is now registered.
    PeerConnected(PeerInfo),

    /// A peer left the registry. Emitted exactly once per connection,
    /// whatever the cause (remote close, protocol violation, I/O error,
    /// explicit disconnect, or shutdown).
    PeerDisconnected(PeerInfo),

    /// A complete frame arrived and decoded on a peer's stream.
    ///
    /// Events for one peer preserve that peer's stream order; no order is
    /// guaranteed across different peers.
    MessageReceived {
        /// Peer the message arrived from.
        peer: PeerInfo,
        /// Decoded message, sender's timestamp preserved.
        message: Message,
    },
}
