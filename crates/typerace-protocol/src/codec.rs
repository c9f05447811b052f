//! Codec seam: how protocol types become text frames and back.
//!
//! The relay currently ships [`JsonCodec`] only (browser clients speak
//! JSON), but the handler is written against the trait so a binary
//! codec can be swapped in without touching routing code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes protocol values to text frames and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
