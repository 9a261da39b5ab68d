//! Error taxonomy for the connection subsystem.
//!
//! Establishment errors (`BindFailed`, `DialFailed`, `DialCanceled`) are
//! returned to the caller — they are actionable (retry another port or
//! address). Steady-state errors on an established connection are never
//! propagated to `send`/`broadcast` callers; they are logged and resolved
//! by tearing down the offending peer.

use crate::constants::MAX_FRAME_LEN;
use thiserror::Error;

/// Connection-level errors surfaced by the [`Node`](crate::net::Node) API.
#[derive(Debug, Error)]
pub enum NetError {
    /// The listening socket could not be bound.
    #[error("failed to bind port {port}: {source}")]
    BindFailed {
        /// Requested port.
        port: u16,
        /// Underlying bind error.
        #[source]
        source: std::io::Error,
    },

    /// A listener is already running; stop it before starting another.
    #[error("already listening; stop the current listener first")]
    AlreadyListening,

    /// An outbound dial failed (resolution, refusal, or timeout).
    #[error("failed to connect to {addr}: {reason}")]
    DialFailed {
        /// Target address (`host:port`).
        addr: String,
        /// Human-readable failure cause.
        reason: String,
    },

    /// An outbound dial was aborted by shutdown before completing.
    #[error("dial of {addr} canceled by shutdown")]
    DialCanceled {
        /// Target address (`host:port`).
        addr: String,
    },

    /// A write to a peer's stream failed or the peer is not connected.
    #[error("write to peer {id} failed: {reason}")]
    WriteFailed {
        /// Peer identifier.
        id: String,
        /// Human-readable failure cause.
        reason: String,
    },
}

/// Protocol violations detected while decoding the inbound byte stream.
///
/// Any of these terminates the owning connection's receive loop — they
/// are protocol violations, not transient errors.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame header declared a length of zero.
    #[error("protocol violation: frame declares zero length")]
    Empty,

    /// The frame header declared a length at or beyond the bound.
    ///
    /// Detected from the header alone; the payload is never buffered.
    #[error("protocol violation: frame declares {declared} bytes (bound {})", MAX_FRAME_LEN)]
    TooLarge {
        /// Length value from the offending header.
        declared: u32,
    },

    /// The payload bytes did not parse into a valid [`Message`](crate::Message).
    #[error("malformed message payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
