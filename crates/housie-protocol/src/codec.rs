//! Codec trait and implementations for turning frames into bytes.
//!
//! The server only needs *something* implementing [`Codec`]. JSON is the
//! default because browser clients speak it natively.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Largest inbound frame a codec will look at, in bytes.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Encodes values to bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// `ProtocolError::Decode` if the bytes are malformed or don't match `T`.
    /// `ProtocolError::InvalidMessage` if the frame is over
    /// [`MAX_FRAME_LEN`].
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] over `serde_json`.
///
/// ```rust
/// use housie_protocol::{ClientFrame, ClientRequest, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame: ClientFrame = codec
///     .decode(br#"{"id": 1, "request": {"op": "health"}}"#)
///     .unwrap();
/// assert_eq!(frame.id, 1);
/// assert!(matches!(frame.request, ClientRequest::Health));
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
        if data.len() > MAX_FRAME_LEN {
            return Err(ProtocolError::InvalidMessage(format!(
                "frame is {} bytes, limit is {MAX_FRAME_LEN}",
                data.len()
            )));
        }
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
