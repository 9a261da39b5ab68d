//! Peer connection and framing subsystem.
//!
//! Owns the TCP sockets, frames byte streams into discrete messages,
//! tracks every connection's lifecycle, and exposes thread-safe
//! send/broadcast/disconnect operations while publishing [`NetEvent`]s
//! to the rest of the application.
//!
//! Component layering, leaves first:
//!
//! - [`framing`] — pure frame codec, no I/O
//! - [`peer`] — one live connection's identity, state, and write queue
//! - [`listener`] / [`initiator`] — produce peers from accepts and dials
//! - [`registry`] — the thread-safe peer table
//! - [`node`] — composes the above and drives the per-peer loops

pub mod error;
pub mod events;
pub mod framing;
pub mod node;
pub mod peer;

pub(crate) mod initiator;
pub(crate) mod listener;
pub(crate) mod registry;

pub use error::{FrameError, NetError};
pub use events::NetEvent;
pub use node::Node;
pub use peer::{Direction, PeerInfo, PeerState};
