//! Downstream peer registry for the siglink relay.
//!
//! Tracks every open peer connection, merges their inbound frames into
//! one stream, and fans upstream messages back out to all of them.
//! A peer failure affects that peer only: it is removed from the set
//! and everyone else keeps flowing.

mod registry;

pub use registry::PeerRegistry;
