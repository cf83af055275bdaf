//! Error types for the codec layer.

/// Errors that can occur while decoding or encoding relay payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A received frame failed to parse as JSON.
    ///
    /// The relay drops such frames locally; the error is never sent
    /// back to the peer and is never fatal.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    /// Re-serializing a decoded value failed.
    ///
    /// Practically unreachable for plain JSON trees, but the codec
    /// contract returns a `Result` so alternative codecs can fail.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}
