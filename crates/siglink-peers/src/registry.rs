//! The peer registry and its reader tasks.

use std::collections::HashMap;
use std::sync::Arc;

use siglink_protocol::{Codec, JsonCodec, Message};
use siglink_transport::{Connection, ConnectionId, PeerConn};
use tokio::sync::{mpsc, Mutex};

/// Tracks the set of currently open downstream peers.
///
/// Peers are registered on accept and removed when their connection
/// closes or errors; the registry exclusively owns the set. Each
/// registered peer gets a reader task that forwards its raw frames,
/// tagged with the peer's [`ConnectionId`], into the shared inbound
/// stream. Per-peer frame order is preserved; interleaving across
/// peers is whatever the scheduler produces.
pub struct PeerRegistry {
    peers: Mutex<HashMap<ConnectionId, PeerConn>>,
    inbound_tx: mpsc::UnboundedSender<(ConnectionId, String)>,
    codec: JsonCodec,
}

impl PeerRegistry {
    /// Creates a registry and the inbound frame stream merged from all
    /// of its peers.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(ConnectionId, String)>) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Self {
            peers: Mutex::new(HashMap::new()),
            inbound_tx,
            codec: JsonCodec,
        });
        (registry, inbound_rx)
    }

    /// Registers a newly accepted peer and spawns its reader task.
    pub async fn register(self: &Arc<Self>, conn: PeerConn) -> ConnectionId {
        let id = conn.id();
        self.peers.lock().await.insert(id, conn.clone());
        tracing::info!(%id, "peer connected");

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            registry.read_loop(id, conn).await;
        });

        id
    }

    /// Removes a peer from the active set. Idempotent: removing an
    /// already removed peer is a no-op.
    pub async fn remove(&self, id: ConnectionId) {
        if self.peers.lock().await.remove(&id).is_some() {
            tracing::info!(%id, "peer removed");
        }
    }

    /// Sends `message` to every currently open peer.
    ///
    /// No atomicity across the set: a peer whose send fails is removed
    /// and skipped, and the remaining peers still receive the message.
    pub async fn broadcast(&self, message: &Message) {
        let frame = match self.codec.encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode broadcast message");
                return;
            }
        };

        // Snapshot so peer sends happen outside the set lock; a peer
        // registered mid-broadcast simply misses this message.
        let targets: Vec<(ConnectionId, PeerConn)> = self
            .peers
            .lock()
            .await
            .iter()
            .map(|(id, conn)| (*id, conn.clone()))
            .collect();

        for (id, conn) in targets {
            if let Err(e) = conn.send(&frame).await {
                tracing::debug!(%id, error = %e, "peer send failed, removing");
                self.remove(id).await;
            }
        }
    }

    /// Number of currently open peers.
    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    /// Returns `true` if no peers are connected.
    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }

    /// Closes every open peer connection and clears the set. The reader
    /// tasks observe the close and exit on their own.
    pub async fn close_all(&self) {
        let drained: Vec<(ConnectionId, PeerConn)> =
            self.peers.lock().await.drain().collect();
        for (id, conn) in drained {
            if let Err(e) = conn.close().await {
                tracing::debug!(%id, error = %e, "peer close failed");
            }
        }
    }

    /// Forwards frames from one peer until it closes or errors, then
    /// removes it from the set.
    async fn read_loop(&self, id: ConnectionId, conn: PeerConn) {
        loop {
            match conn.recv().await {
                Ok(Some(frame)) => {
                    if self.inbound_tx.send((id, frame)).is_err() {
                        // The router is gone; stop reading.
                        break;
                    }
                }
                Ok(None) => {
                    tracing::info!(%id, "peer closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%id, error = %e, "peer receive failed");
                    break;
                }
            }
        }
        self.remove(id).await;
    }
}
