//! Outbound dialing.
//!
//! Resolves and dials a remote address under a timeout, racing the node's
//! shutdown signal so an in-flight dial is abandoned cleanly rather than
//! producing a connected-then-immediately-disconnected peer.

use std::sync::Arc;

use tokio::net::TcpStream;

use super::error::NetError;
use super::node::NodeInner;
use super::peer::{Direction, PeerInfo};

/// Dial `host:port` and register the resulting peer.
///
/// On success the peer is registered under its canonical `ip:port` id, a
/// `PeerConnected` event is emitted, and its loops are running. Failures
/// leave no trace in the registry.
pub(crate) async fn connect(
    inner: &Arc<NodeInner>,
    host: &str,
    port: u16,
) -> Result<PeerInfo, NetError> {
    let addr = format!("{host}:{port}");

    let mut shutdown_rx = inner.shutdown_rx();
    if *shutdown_rx.borrow() {
        return Err(NetError::DialCanceled { addr });
    }

    log::info!("[Net] Dialing {addr}");
    let stream = tokio::select! {
        _ = shutdown_rx.changed() => {
            return Err(NetError::DialCanceled { addr });
        }
        result = tokio::time::timeout(inner.dial_timeout(), TcpStream::connect(addr.clone())) => {
            match result {
                Err(_) => {
                    return Err(NetError::DialFailed {
                        addr,
                        reason: "connection timed out".into(),
                    });
                }
                Ok(Err(e)) => {
                    return Err(NetError::DialFailed {
                        addr,
                        reason: e.to_string(),
                    });
                }
                Ok(Ok(stream)) => stream,
            }
        }
    };

    let peer = inner.register_peer(stream, Direction::Outbound)?;
    Ok(peer.info())
}
