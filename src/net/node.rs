//! Connection core: composes the listener, initiator, registry, and
//! per-peer loops behind one thread-safe handle.
//!
//! [`Node`] exposes the boundary operations consumed by collaborators —
//! `listen`, `connect`, `send`, `broadcast`, `disconnect`, `stop_all` —
//! and publishes [`NetEvent`]s on the receiver returned from [`Node::new`].
//!
//! Establishment errors are returned to the caller. Steady-state errors
//! (read/write failures, protocol violations) are resolved locally by the
//! shared disconnect path and observable only as a `PeerDisconnected`
//! event plus a log line; a single bad peer never stops the listener or
//! other peers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

use crate::constants::{DIAL_TIMEOUT, READ_BUF_SIZE, SHUTDOWN_WAIT};
use crate::message::Message;

use super::error::NetError;
use super::events::NetEvent;
use super::framing::{encode_message, FrameDecoder};
use super::initiator;
use super::listener::PeerListener;
use super::peer::{Direction, Peer, PeerInfo};
use super::registry::PeerRegistry;

/// Handle to the connection core.
///
/// All methods take `&self`; the node is driven concurrently from the
/// console task, the accept loop, and per-peer loops.
pub struct Node {
    inner: Arc<NodeInner>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("peers", &self.inner.registry.len())
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

pub(crate) struct NodeInner {
    registry: PeerRegistry,
    event_tx: UnboundedSender<NetEvent>,
    /// Flipped once by `stop_all()`; every loop selects on the receiver.
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    listener: tokio::sync::Mutex<Option<PeerListener>>,
    listening: AtomicBool,
    dial_timeout: Duration,
}

impl Node {
    /// Create a node and the receiver its lifecycle events arrive on.
    pub fn new() -> (Self, UnboundedReceiver<NetEvent>) {
        Self::with_dial_timeout(DIAL_TIMEOUT)
    }

    /// Create a node with a non-default dial timeout.
    pub fn with_dial_timeout(dial_timeout: Duration) -> (Self, UnboundedReceiver<NetEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let inner = Arc::new(NodeInner {
            registry: PeerRegistry::new(),
            event_tx,
            shutdown_tx,
            shutdown_rx,
            listener: tokio::sync::Mutex::new(None),
            listening: AtomicBool::new(false),
            dial_timeout,
        });
        (Self { inner }, event_rx)
    }

    /// Bind the wildcard address on `port` and start accepting peers.
    ///
    /// Returns the bound port (useful when `port` is 0).
    ///
    /// # Errors
    ///
    /// [`NetError::BindFailed`] if the port is unavailable,
    /// [`NetError::AlreadyListening`] if a listener is already running.
    pub async fn listen(&self, port: u16) -> Result<u16, NetError> {
        let mut slot = self.inner.listener.lock().await;
        if slot.is_some() {
            return Err(NetError::AlreadyListening);
        }
        let listener = PeerListener::start(port, Arc::clone(&self.inner)).await?;
        let bound = listener.port();
        *slot = Some(listener);
        self.inner.listening.store(true, Ordering::SeqCst);
        Ok(bound)
    }

    /// Stop the listener and disconnect every peer it originated.
    /// A no-op when not listening.
    pub async fn stop_listening(&self) {
        let listener = self.inner.listener.lock().await.take();
        let Some(listener) = listener else { return };
        self.inner.listening.store(false, Ordering::SeqCst);
        listener.stop().await;
        for peer in self.inner.registry.snapshot() {
            if peer.direction() == Direction::Inbound {
                self.inner.disconnect_peer(peer.id());
            }
        }
    }

    /// Whether the accept loop is running.
    pub fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    /// Dial `host:port` and register the resulting peer.
    ///
    /// Suspends the caller for the duration of the dial without blocking
    /// other peers. A shutdown arriving mid-dial aborts the attempt.
    ///
    /// # Errors
    ///
    /// [`NetError::DialFailed`] on resolution failure, refusal, or timeout
    /// (no registry side effects); [`NetError::DialCanceled`] when shutdown
    /// interrupts the dial.
    pub async fn connect(&self, host: &str, port: u16) -> Result<PeerInfo, NetError> {
        initiator::connect(&self.inner, host, port).await
    }

    /// Best-effort send of one message to one peer.
    ///
    /// An absent or disconnecting peer is a warning, not an error — it may
    /// have just disconnected. A write-side failure tears the peer down via
    /// the shared disconnect path; nothing is propagated to the caller.
    pub fn send(&self, peer_id: &str, message: &Message) {
        let Some(peer) = self.inner.registry.get(peer_id) else {
            log::warn!("[Net] Send to unknown peer {peer_id} dropped");
            return;
        };
        if let Err(e) = peer.send_bytes(encode_message(message)) {
            log::warn!("[Net] {e}; disconnecting");
            self.inner.disconnect_peer(peer_id);
        }
    }

    /// Best-effort send of one message to every registered peer.
    ///
    /// Works from a snapshot; a failure on one peer never prevents the
    /// delivery attempts to the others.
    pub fn broadcast(&self, message: &Message) {
        let frame = encode_message(message);
        for peer in self.inner.registry.snapshot() {
            if let Err(e) = peer.send_bytes(frame.clone()) {
                log::warn!("[Net] Broadcast: {e}; disconnecting");
                self.inner.disconnect_peer(peer.id());
            }
        }
    }

    /// Disconnect one peer. Idempotent: returns false when the id is not
    /// registered (already disconnected).
    pub fn disconnect(&self, peer_id: &str) -> bool {
        self.inner.disconnect_peer(peer_id)
    }

    /// Snapshot of currently connected peers.
    pub fn peers(&self) -> Vec<PeerInfo> {
        self.inner
            .registry
            .snapshot()
            .iter()
            .map(|p| p.info())
            .collect()
    }

    /// Stop the listener, disconnect every remaining peer, and wait
    /// (bounded) for the receive loops to observe cancellation.
    ///
    /// A loop that misses the bound is aborted so the process can exit;
    /// its socket closes with it. Safe to call more than once.
    pub async fn stop_all(&self) {
        log::info!("[Net] Shutting down");
        self.stop_listening().await;

        // Raise the cancellation signal before tearing peers down so every
        // receive loop exits at its next suspension point.
        let _ = self.inner.shutdown_tx.send(true);

        let peers = self.inner.registry.snapshot();
        let mut handles = Vec::with_capacity(peers.len());
        for peer in &peers {
            if let Some(handle) = peer.take_read_handle() {
                handles.push(handle);
            }
            self.inner.disconnect_peer(peer.id());
        }

        for mut handle in handles {
            if tokio::time::timeout(SHUTDOWN_WAIT, &mut handle).await.is_err() {
                log::warn!("[Net] Receive loop did not stop within bound; aborting");
                handle.abort();
            }
        }
    }
}

impl NodeInner {
    /// Fresh receiver on the shutdown signal for a new loop.
    pub(crate) fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub(crate) fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Wrap an established socket into a registered peer and start its
    /// receive and write loops. Used by both the listener and the initiator.
    pub(crate) fn register_peer(
        self: &Arc<Self>,
        stream: TcpStream,
        direction: Direction,
    ) -> Result<Arc<Peer>, NetError> {
        let addr = stream.peer_addr().map_err(|e| NetError::DialFailed {
            addr: "<unknown>".into(),
            reason: format!("no remote address: {e}"),
        })?;
        let id = addr.to_string();

        let (read_half, write_half) = stream.into_split();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let peer = Arc::new(Peer::new(id.clone(), addr, direction, frame_tx));

        if !self.registry.add(Arc::clone(&peer)) {
            return Err(NetError::DialFailed {
                addr: id,
                reason: "a peer with this address is already connected".into(),
            });
        }

        log::info!("[Net] Peer connected: {id} ({direction:?})");
        let _ = self.event_tx.send(NetEvent::PeerConnected(peer.info()));

        let read_handle = tokio::spawn(Self::read_loop(
            Arc::clone(self),
            Arc::clone(&peer),
            read_half,
        ));
        peer.set_read_handle(read_handle);
        tokio::spawn(Self::write_loop(
            Arc::clone(self),
            id,
            write_half,
            frame_rx,
        ));

        Ok(peer)
    }

    /// The only path by which a peer leaves `Connected`.
    ///
    /// Atomically removes the id from the registry (absent → no-op, which
    /// makes a second disconnect harmless), steps the state through
    /// `Disconnecting → Disconnected`, closes the write side, and emits
    /// exactly one `PeerDisconnected`. Invoked from receive-loop cleanup,
    /// explicit disconnects, write failures, and shutdown.
    pub(crate) fn disconnect_peer(&self, id: &str) -> bool {
        let Some(peer) = self.registry.remove(id) else {
            log::debug!("[Net] Disconnect of {id}: not registered, nothing to do");
            return false;
        };

        peer.begin_disconnect();
        peer.close_write();
        peer.finish_disconnect();

        log::info!("[Net] Peer disconnected: {id}");
        let _ = self.event_tx.send(NetEvent::PeerDisconnected(peer.info()));

        // If the receive loop is not the caller, stop it now; when it is,
        // this is a no-op on itself after all cleanup already ran.
        peer.abort_read();
        true
    }

    /// Per-peer receive loop.
    ///
    /// Suspends on the socket read and the shutdown signal; decoded
    /// messages are emitted in stream order. Every exit path falls
    /// through to the single `disconnect_peer` call below the loop:
    /// remote close (zero-byte read), I/O error, protocol violation, or
    /// cancellation.
    async fn read_loop(inner: Arc<NodeInner>, peer: Arc<Peer>, mut reader: OwnedReadHalf) {
        let mut decoder = FrameDecoder::new();
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut shutdown_rx = inner.shutdown_rx();
        let id = peer.id().to_string();

        'recv: loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    log::debug!("[Net] Receive loop for {id} canceled by shutdown");
                    break 'recv;
                }
                result = reader.read(&mut buf) => match result {
                    Ok(0) => {
                        log::info!("[Net] {id} closed the connection");
                        break 'recv;
                    }
                    Ok(n) => match decoder.feed(&buf[..n]) {
                        Ok(messages) => {
                            for message in messages {
                                let event = NetEvent::MessageReceived {
                                    peer: peer.info(),
                                    message,
                                };
                                if inner.event_tx.send(event).is_err() {
                                    log::debug!("[Net] Event channel closed; stopping {id}");
                                    break 'recv;
                                }
                            }
                        }
                        Err(e) => {
                            log::warn!("[Net] Protocol violation from {id}: {e}");
                            break 'recv;
                        }
                    },
                    Err(e) => {
                        log::warn!("[Net] Read error from {id}: {e}");
                        break 'recv;
                    }
                }
            }
        }

        inner.disconnect_peer(&id);
    }

    /// Per-peer write loop: drains the frame queue into the socket, which
    /// serializes all writes to this peer. Ends when the disconnect path
    /// closes the queue (flush then FIN) or a write fails.
    async fn write_loop(
        inner: Arc<NodeInner>,
        id: String,
        mut writer: OwnedWriteHalf,
        mut frame_rx: UnboundedReceiver<Vec<u8>>,
    ) {
        while let Some(bytes) = frame_rx.recv().await {
            if let Err(e) = writer.write_all(&bytes).await {
                log::error!("[Net] Write to {id} failed: {e}");
                inner.disconnect_peer(&id);
                return;
            }
        }
        let _ = writer.shutdown().await;
    }
}
