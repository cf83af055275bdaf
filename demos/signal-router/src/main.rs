//! Signaling relay daemon for the robot WebRTC deployment.
//!
//! Browser clients connect to the listen port; the daemon keeps one
//! link to the robot's WebRTC signaling server and relays JSON both
//! ways. Configuration comes from the environment (`WS_SERVER_PORT`,
//! `ROBOT_IP_ADDR`, `WEBRTC_SERVER_PORT`), consumed once at startup.
//!
//! Probe the listener with: `python3 -m websockets ws://localhost:8012`

use siglink::{RelayConfig, RelayServer, SiglinkError};

#[tokio::main]
async fn main() -> Result<(), SiglinkError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = RelayConfig::from_env();
    tracing::info!(
        listen = %config.listen_addr,
        upstream = %config.upstream_url(),
        "starting signal-router"
    );

    let server = RelayServer::builder().config(config).build().await?;
    let shutdown = server.shutdown_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, shutting down");
            shutdown.trigger();
        }
    });

    server.run().await
}
