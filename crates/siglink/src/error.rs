//! Unified error type for the siglink relay.

use siglink_protocol::ProtocolError;
use siglink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `siglink` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
///
/// Note that inside the running relay no error is fatal: transport
/// failures drive reconnect/removal and malformed payloads are dropped.
/// This type surfaces only setup failures (binding the listener) and
/// is what library callers match on.
#[derive(Debug, thiserror::Error)]
pub enum SiglinkError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A codec-level error (malformed payload, encode failure).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
