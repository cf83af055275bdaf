//! `RelayServer` builder and accept loop.
//!
//! This is the entry point for running the relay. It ties the layers
//! together: listener → peer registry → router → upstream connector.

use std::sync::Arc;

use siglink_peers::PeerRegistry;
use siglink_transport::WsListener;
use siglink_upstream::UpstreamConfig;
use tokio::sync::watch;

use crate::router;
use crate::{RelayConfig, SiglinkError};

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,ignore
/// let server = RelayServer::builder()
///     .config(RelayConfig::from_env())
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RelayServerBuilder {
    config: RelayConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the downstream listen address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.listen_addr = addr.to_string();
        self
    }

    /// Sets the upstream endpoint from host, port, and path.
    pub fn upstream(mut self, host: &str, port: u16, path: &str) -> Self {
        self.config.upstream_host = host.to_string();
        self.config.upstream_port = port;
        self.config.upstream_path = path.to_string();
        self
    }

    /// Sets the base reconnect delay for the upstream link.
    pub fn backoff_base(mut self, base: std::time::Duration) -> Self {
        self.config.backoff_base = base;
        self
    }

    /// Binds the downstream listener and returns the server, ready to
    /// [`run`](RelayServer::run).
    pub async fn build(self) -> Result<RelayServer, SiglinkError> {
        let listener = WsListener::bind(&self.config.listen_addr).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(RelayServer {
            listener,
            config: self.config,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Triggers relay shutdown: stops the accept loop and the router, and
/// cancels the upstream connector including any pending reconnect
/// timer.
#[derive(Clone)]
pub struct ShutdownHandle {
    trigger: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Requests shutdown. Idempotent.
    pub fn trigger(&self) {
        let _ = self.trigger.send(true);
    }
}

/// A running signaling relay.
///
/// Call [`run()`](Self::run) to start forwarding.
pub struct RelayServer {
    listener: WsListener,
    config: RelayConfig,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the downstream listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a handle that can stop the relay from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            trigger: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Runs the relay until shutdown is triggered.
    ///
    /// Spawns the upstream connector and the router, then drives the
    /// accept loop: every accepted peer is registered and served by its
    /// own reader task. Accept errors are logged and non-fatal.
    pub async fn run(mut self) -> Result<(), SiglinkError> {
        let upstream_url = self.config.upstream_url();
        tracing::info!(
            listen = %self.config.listen_addr,
            upstream = %upstream_url,
            "siglink relay running"
        );

        let (registry, downstream_rx) = PeerRegistry::new();

        let upstream_config = UpstreamConfig {
            url: upstream_url,
            backoff_base: self.config.backoff_base,
        };
        let (upstream, upstream_rx) =
            siglink_upstream::spawn(upstream_config, self.shutdown_rx.clone());

        let router_task = tokio::spawn(router::run(
            downstream_rx,
            upstream_rx,
            upstream,
            Arc::clone(&registry),
            self.shutdown_rx.clone(),
        ));

        let mut shutdown = self.shutdown_rx.clone();
        loop {
            tokio::select! {
                _ = router::shutdown_requested(&mut shutdown) => break,

                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => {
                        registry.register(conn).await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("siglink relay shutting down");
        registry.close_all().await;
        let _ = router_task.await;
        Ok(())
    }
}
