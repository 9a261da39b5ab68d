//! TCP listener for accepting inbound peers.
//!
//! Binds the wildcard address and runs an accept loop as a tokio task.
//! Each accepted socket is registered with the node, which emits
//! `PeerConnected` and starts the receive loop. The event channel is
//! unbounded, so a slow event consumer never blocks accepting.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::constants::{ACCEPT_RETRY_DELAY, SHUTDOWN_WAIT};

use super::error::NetError;
use super::node::NodeInner;
use super::peer::Direction;

/// Running accept loop bound to one port.
#[derive(Debug)]
pub(crate) struct PeerListener {
    port: u16,
    stop_tx: watch::Sender<bool>,
    accept_handle: JoinHandle<()>,
}

impl PeerListener {
    /// Bind `0.0.0.0:port` and spawn the accept loop. Returns immediately
    /// after a successful bind.
    ///
    /// # Errors
    ///
    /// [`NetError::BindFailed`] when the port is unavailable.
    pub(crate) async fn start(port: u16, inner: Arc<NodeInner>) -> Result<Self, NetError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|source| NetError::BindFailed { port, source })?;
        let bound = listener
            .local_addr()
            .map_err(|source| NetError::BindFailed { port, source })?
            .port();

        log::info!("[Net] Listening on 0.0.0.0:{bound}");

        let (stop_tx, stop_rx) = watch::channel(false);
        let accept_handle = tokio::spawn(Self::accept_loop(listener, inner, stop_rx));

        Ok(Self {
            port: bound,
            stop_tx,
            accept_handle,
        })
    }

    /// Port the listener actually bound (resolves a requested port of 0).
    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// Accept loop — runs as a tokio task until stopped or shut down.
    async fn accept_loop(
        listener: TcpListener,
        inner: Arc<NodeInner>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        let mut shutdown_rx = inner.shutdown_rx();
        loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    log::debug!("[Net] Accept loop stopped");
                    break;
                }
                _ = shutdown_rx.changed() => {
                    log::debug!("[Net] Accept loop canceled by shutdown");
                    break;
                }
                result = listener.accept() => match result {
                    Ok((stream, addr)) => {
                        if let Err(e) = inner.register_peer(stream, Direction::Inbound) {
                            log::warn!("[Net] Dropping inbound connection from {addr}: {e}");
                        }
                    }
                    Err(e) => {
                        log::error!("[Net] Accept error: {e}");
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                }
            }
        }
        // The listening socket closes when the loop drops it.
    }

    /// Signal the accept loop to exit and wait (bounded) for it; the loop
    /// is aborted if it misses the bound. The listening socket is closed
    /// either way.
    pub(crate) async fn stop(self) {
        let PeerListener {
            stop_tx,
            mut accept_handle,
            ..
        } = self;
        let _ = stop_tx.send(true);
        if tokio::time::timeout(SHUTDOWN_WAIT, &mut accept_handle)
            .await
            .is_err()
        {
            log::warn!("[Net] Accept loop did not stop within bound; aborting");
            accept_handle.abort();
        }
    }
}
