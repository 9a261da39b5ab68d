//! Peerlink - peer-to-peer text messaging node.
//!
//! Every running instance simultaneously accepts inbound TCP connections
//! and dials outbound ones, exchanging discrete length-prefixed messages
//! with every connected remote party.
//!
//! # Architecture
//!
//! The core is the [`net`] subsystem: it owns the sockets, frames byte
//! streams into [`Message`]s, tracks connection lifecycles in a registry,
//! and publishes [`NetEvent`]s consumed by the console front-end.
//!
//! # Modules
//!
//! - [`net`] - connection and framing subsystem (the core)
//! - [`message`] - the chat message data model
//! - [`commands`] - console command parsing
//! - [`config`] - configuration loading/saving

pub mod commands;
pub mod config;
pub mod constants;
pub mod message;
pub mod net;

// Re-export commonly used types
pub use config::Config;
pub use message::Message;
pub use net::{NetError, NetEvent, Node, PeerInfo};
