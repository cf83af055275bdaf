//! The connector task that owns the upstream link.
//!
//! One sequential Tokio task drives the whole lifecycle: dial,
//! connected I/O, teardown, backoff sleep, redial. Because the task is
//! sequential, a new dial can only start after the previous link has
//! fully entered `Disconnected`, so the single-link invariant holds by
//! construction, with no locking.

use std::time::Duration;

use siglink_protocol::{Codec, JsonCodec, Message};
use siglink_transport::{connect, Connection, UpstreamConn};
use tokio::sync::{mpsc, watch};

use crate::{LinkState, ReconnectBackoff};

/// Configuration for the upstream connector.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Full endpoint URL, e.g. `ws://192.168.69.101:8013/webrtc`.
    pub url: String,
    /// Base reconnect delay; the kth consecutive retry waits k × base.
    pub backoff_base: Duration,
}

impl UpstreamConfig {
    /// Creates a config with the default 1 s backoff base.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff_base: Duration::from_millis(1000),
        }
    }
}

/// Spawns the connector task for the given endpoint.
///
/// Returns the send/state handle and the inbound frame stream. Frames
/// received from upstream arrive on the stream in wire order for each
/// connected period. The task stops when `shutdown` flips to `true`
/// (or its sender is dropped), cancelling any pending reconnect timer.
pub fn spawn(
    config: UpstreamConfig,
    shutdown: watch::Receiver<bool>,
) -> (UpstreamHandle, mpsc::UnboundedReceiver<String>) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);

    tokio::spawn(run(config, state_tx, outbound_rx, inbound_tx, shutdown));

    let handle = UpstreamHandle {
        outbound: outbound_tx,
        state: state_rx,
    };
    (handle, inbound_rx)
}

/// Cheap clonable handle to the connector task.
#[derive(Clone)]
pub struct UpstreamHandle {
    outbound: mpsc::UnboundedSender<Message>,
    state: watch::Receiver<LinkState>,
}

impl UpstreamHandle {
    /// Forwards `message` to the upstream endpoint if the link is
    /// `Connected`; otherwise the message is silently dropped.
    ///
    /// Best-effort by contract: there is no buffering across
    /// disconnects and no delivery acknowledgement.
    pub fn send(&self, message: Message) {
        if !self.state.borrow().is_connected() {
            tracing::debug!("upstream link not connected, dropping outbound message");
            return;
        }
        if self.outbound.send(message).is_err() {
            tracing::debug!("upstream connector stopped, dropping outbound message");
        }
    }

    /// Returns the current link state.
    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Returns a watch receiver that observes every link state change.
    pub fn state_stream(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }
}

/// Resolves when shutdown is requested (or the trigger is dropped).
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // An Err means the sender is gone; treat that as shutdown too.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn run(
    config: UpstreamConfig,
    state_tx: watch::Sender<LinkState>,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
    inbound_tx: mpsc::UnboundedSender<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    let codec = JsonCodec;
    let mut backoff = ReconnectBackoff::new(config.backoff_base);

    loop {
        state_tx.send_replace(LinkState::Connecting);
        tracing::debug!(url = %config.url, "dialing upstream endpoint");

        let dialed = tokio::select! {
            res = connect(&config.url) => res,
            _ = shutdown_requested(&mut shutdown) => break,
        };

        match dialed {
            Ok(conn) => {
                tracing::info!(url = %config.url, "upstream link established");

                // Anything enqueued while the link was down is stale;
                // best-effort means no buffering across disconnects.
                // Drained before the state flips so a message sent
                // right after `Connected` is observed cannot be lost.
                while outbound_rx.try_recv().is_ok() {}
                state_tx.send_replace(LinkState::Connected);

                let stop = drive_link(
                    &conn,
                    &codec,
                    &mut outbound_rx,
                    &inbound_tx,
                    &mut shutdown,
                )
                .await;
                if stop {
                    let _ = conn.close().await;
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(url = %config.url, error = %e, "upstream dial failed");
            }
        }

        state_tx.send_replace(LinkState::Disconnected);
        let delay = backoff.next_delay();
        tracing::info!(
            delay_ms = delay.as_millis() as u64,
            attempt = backoff.failures(),
            "scheduling upstream reconnect"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_requested(&mut shutdown) => break,
        }
    }

    state_tx.send_replace(LinkState::Disconnected);
    tracing::debug!("upstream connector stopped");
}

/// Drives one connected period. Returns `true` if the connector should
/// stop entirely (shutdown or all handles gone), `false` if the link
/// dropped and a reconnect should be scheduled.
async fn drive_link(
    conn: &UpstreamConn,
    codec: &JsonCodec,
    outbound_rx: &mut mpsc::UnboundedReceiver<Message>,
    inbound_tx: &mpsc::UnboundedSender<String>,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        tokio::select! {
            _ = shutdown_requested(shutdown) => return true,

            outbound = outbound_rx.recv() => {
                // None: every UpstreamHandle is gone, nothing left to relay.
                let Some(message) = outbound else { return true };
                let frame = match codec.encode(&message) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode outbound message");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&frame).await {
                    tracing::warn!(error = %e, "upstream send failed, dropping link");
                    return false;
                }
            }

            received = conn.recv() => match received {
                Ok(Some(frame)) => {
                    if inbound_tx.send(frame).is_err() {
                        // The router is gone; no one to deliver to.
                        return true;
                    }
                }
                Ok(None) => {
                    tracing::info!("upstream closed the connection");
                    return false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "upstream receive failed");
                    return false;
                }
            },
        }
    }
}
