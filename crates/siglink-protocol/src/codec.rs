//! Codec trait and the JSON implementation.
//!
//! A codec turns raw text frames into structured values and back. The
//! relay is payload-agnostic (it never looks inside a message), so the
//! decoded type is `serde_json::Value`, an arbitrary JSON tree. The
//! trait exists so the relay core stays independent of the concrete
//! wire format (strategy pattern, same as swapping JSON for a binary
//! codec in a richer protocol).

use serde_json::Value;

use crate::ProtocolError;

/// A codec that can decode raw text frames into opaque messages and
/// encode them back.
///
/// `Send + Sync + 'static` because the codec is shared by long-lived
/// Tokio tasks running on any worker thread.
pub trait Codec: Send + Sync + 'static {
    /// Attempts a structural parse of a raw frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedPayload`] if the frame is not
    /// well-formed JSON. Never panics: malformed input is an expected,
    /// non-fatal condition for the relay.
    fn decode(&self, raw: &str) -> Result<Value, ProtocolError>;

    /// Re-serializes a previously decoded value.
    ///
    /// The output need not be byte-identical to the frame the value was
    /// decoded from, only structurally equivalent.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode(&self, message: &Value) -> Result<String, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Accepts any JSON value: object, array, or scalar. The relay imposes
/// no envelope, versioning, or type discriminator.
///
/// ## Example
///
/// ```rust
/// use siglink_protocol::{Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg = codec.decode(r#"{"type":"offer","sdp":"x"}"#).unwrap();
/// assert_eq!(msg["type"], "offer");
///
/// let raw = codec.encode(&msg).unwrap();
/// assert_eq!(codec.decode(&raw).unwrap(), msg);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, raw: &str) -> Result<Value, ProtocolError> {
        serde_json::from_str(raw).map_err(ProtocolError::MalformedPayload)
    }

    fn encode(&self, message: &Value) -> Result<String, ProtocolError> {
        serde_json::to_string(message).map_err(ProtocolError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_object() {
        let msg = JsonCodec.decode(r#"{"type":"offer","sdp":"x"}"#).unwrap();
        assert_eq!(msg, json!({"type": "offer", "sdp": "x"}));
    }

    #[test]
    fn test_decode_array_and_scalars() {
        // The relay accepts any JSON value, not just objects.
        assert_eq!(JsonCodec.decode("[1,2,3]").unwrap(), json!([1, 2, 3]));
        assert_eq!(JsonCodec.decode("42").unwrap(), json!(42));
        assert_eq!(JsonCodec.decode("\"hi\"").unwrap(), json!("hi"));
        assert_eq!(JsonCodec.decode("null").unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_malformed_is_a_typed_error() {
        let err = JsonCodec.decode("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));
        assert!(err.to_string().starts_with("malformed payload"));
    }

    #[test]
    fn test_decode_empty_frame_is_malformed() {
        assert!(JsonCodec.decode("").is_err());
    }

    #[test]
    fn test_decode_trailing_garbage_is_malformed() {
        assert!(JsonCodec.decode("{} extra").is_err());
    }

    #[test]
    fn test_encode_is_structurally_stable() {
        // Whitespace differences are fine; structure must survive.
        let msg = JsonCodec.decode(r#"{ "a" : [1, {"b": null}] }"#).unwrap();
        let raw = JsonCodec.encode(&msg).unwrap();
        assert_eq!(JsonCodec.decode(&raw).unwrap(), msg);
    }
}
