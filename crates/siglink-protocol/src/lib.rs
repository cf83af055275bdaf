//! Message codec for the siglink relay.
//!
//! The relay forwards opaque JSON: every frame is decoded just far
//! enough to know it is well-formed, then re-serialized on the way out.
//! This crate owns that boundary: the [`Codec`] trait, the default
//! [`JsonCodec`], and the [`ProtocolError`] taxonomy. Malformed input
//! stops here and never reaches the forwarding paths.

mod codec;
mod error;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;

/// The opaque message type the relay forwards: an arbitrary JSON tree.
pub type Message = serde_json::Value;
