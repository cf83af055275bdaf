//! Upstream connector for the siglink relay.
//!
//! Owns the single client connection to the upstream signaling
//! endpoint and keeps it alive for the life of the process: dial,
//! forward, and on any failure tear down, wait out a linearly growing
//! backoff, and dial again.
//!
//! The connector is a single sequential task (see [`spawn`]); callers
//! interact with it only through the
//! clonable [`UpstreamHandle`] and the inbound frame stream. Transport
//! failures never surface to [`UpstreamHandle::send`]; they drive the
//! internal [`LinkState`] machine and nothing else.

mod backoff;
mod connector;
mod link;

pub use backoff::ReconnectBackoff;
pub use connector::{spawn, UpstreamConfig, UpstreamHandle};
pub use link::LinkState;
