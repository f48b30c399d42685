//! Codec trait and implementations for the bytes stored in the session cache.
//!
//! The broker doesn't care HOW a [`SessionPayload`](crate::SessionPayload)
//! becomes bytes, only that something implementing [`Codec`] can do it and
//! that the external consumer can read the result. Today that is JSON,
//! because the collaboration server parses the cache value as JSON.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec lives inside backends that are
/// shared across request tasks for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is the format of the cache protocol: the value stored under
/// `terminal_session:{id}` is a JSON object.
///
/// ## Example
///
/// ```rust
/// use termgate_protocol::{Codec, ConnectionId, JsonCodec, SessionPayload, UserId};
///
/// let codec = JsonCodec;
/// let payload = SessionPayload {
///     user_id: UserId::new("u1"),
///     connection_id: ConnectionId::new("c1"),
///     host: "10.0.0.5".into(),
///     port: 22,
///     username: "root".into(),
///     password: None,
///     private_key: None,
/// };
///
/// let bytes = codec.encode(&payload).unwrap();
/// let decoded: SessionPayload = codec.decode(&bytes).unwrap();
/// assert_eq!(payload, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
