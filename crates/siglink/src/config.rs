//! Relay configuration.
//!
//! All values are consumed once at startup; there is no hot reload.

use std::time::Duration;

/// Configuration for a [`RelayServer`](crate::RelayServer).
///
/// The defaults mirror the robot signaling deployment this relay was
/// built for: peers on port 8012, the WebRTC endpoint on port 8013 at
/// `/webrtc`, 1 s reconnect base.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the downstream listener binds to.
    pub listen_addr: String,
    /// Host of the upstream signaling endpoint.
    pub upstream_host: String,
    /// Port of the upstream signaling endpoint.
    pub upstream_port: u16,
    /// Request path on the upstream endpoint.
    pub upstream_path: String,
    /// Base reconnect delay for the upstream link.
    pub backoff_base: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8012".to_string(),
            upstream_host: "192.168.69.101".to_string(),
            upstream_port: 8013,
            upstream_path: "/webrtc".to_string(),
            backoff_base: Duration::from_millis(1000),
        }
    }
}

impl RelayConfig {
    /// Renders the upstream endpoint URL, e.g.
    /// `ws://192.168.69.101:8013/webrtc`.
    pub fn upstream_url(&self) -> String {
        let path = if self.upstream_path.starts_with('/') {
            self.upstream_path.clone()
        } else {
            format!("/{}", self.upstream_path)
        };
        format!("ws://{}:{}{}", self.upstream_host, self.upstream_port, path)
    }

    /// Builds a config from the process environment, falling back to
    /// the defaults for anything unset or unparsable:
    ///
    /// - `WS_SERVER_PORT`: downstream listen port
    /// - `ROBOT_IP_ADDR`: upstream host
    /// - `WEBRTC_SERVER_PORT`: upstream port
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = env_port("WS_SERVER_PORT") {
            config.listen_addr = format!("0.0.0.0:{port}");
        }
        if let Ok(host) = std::env::var("ROBOT_IP_ADDR") {
            if !host.is_empty() {
                config.upstream_host = host;
            }
        }
        if let Some(port) = env_port("WEBRTC_SERVER_PORT") {
            config.upstream_port = port;
        }
        config
    }
}

fn env_port(name: &str) -> Option<u16> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(port) => Some(port),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparsable port");
            None
        }
    }
}
