//! The forwarding loops between downstream peers and the upstream link.
//!
//! The router is stateless: it holds the two component handles and the
//! codec, nothing else. Each inbound frame is decoded and, if
//! well-formed, handed to the opposite side. Malformed frames are
//! dropped and logged locally; the sender is never told, and no other
//! traffic is affected.

use std::sync::Arc;

use siglink_peers::PeerRegistry;
use siglink_protocol::{Codec, JsonCodec};
use siglink_transport::ConnectionId;
use siglink_upstream::UpstreamHandle;
use tokio::sync::{mpsc, watch};

/// Resolves when shutdown is requested (or the trigger is dropped).
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Runs both forwarding directions until shutdown or until both inbound
/// streams end.
pub(crate) async fn run(
    mut downstream_rx: mpsc::UnboundedReceiver<(ConnectionId, String)>,
    mut upstream_rx: mpsc::UnboundedReceiver<String>,
    upstream: UpstreamHandle,
    registry: Arc<PeerRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    let codec = JsonCodec;

    loop {
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => break,

            item = downstream_rx.recv() => {
                let Some((from, raw)) = item else { break };
                match codec.decode(&raw) {
                    Ok(message) => {
                        tracing::debug!(%from, "relaying peer message upstream");
                        upstream.send(message);
                    }
                    Err(e) => {
                        tracing::warn!(%from, error = %e, "dropping malformed peer frame");
                    }
                }
            }

            item = upstream_rx.recv() => {
                let Some(raw) = item else { break };
                match codec.decode(&raw) {
                    Ok(message) => {
                        tracing::debug!("relaying upstream message to peers");
                        registry.broadcast(&message).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping malformed upstream frame");
                    }
                }
            }
        }
    }

    tracing::debug!("router stopped");
}
