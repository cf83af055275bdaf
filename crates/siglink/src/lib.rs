//! # siglink
//!
//! A bidirectional WebSocket signaling relay: any number of downstream
//! peers on one side, exactly one self-healing client link to an
//! upstream signaling endpoint on the other, opaque JSON forwarded
//! both ways.
//!
//! - Peer frame → decode → upstream send (dropped silently if the
//!   upstream link is down; delivery is best-effort at-most-once).
//! - Upstream frame → decode → broadcast to every open peer.
//! - The upstream link reconnects forever with a linearly growing
//!   backoff; no relay error is fatal to the process.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use siglink::{RelayConfig, RelayServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), siglink::SiglinkError> {
//!     let server = RelayServer::builder()
//!         .config(RelayConfig::from_env())
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod config;
mod error;
mod router;
mod server;

pub use config::RelayConfig;
pub use error::SiglinkError;
pub use server::{RelayServer, RelayServerBuilder, ShutdownHandle};

// Re-exports from the sub-crates so most callers only depend on
// `siglink`.
pub use siglink_peers::PeerRegistry;
pub use siglink_protocol::{Codec, JsonCodec, Message, ProtocolError};
pub use siglink_transport::{Connection, ConnectionId, TransportError};
pub use siglink_upstream::{LinkState, ReconnectBackoff, UpstreamHandle};
