//! Wire form of envelopes on the bus: CBOR.

use thiserror::Error;

use crate::EventEnvelope;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("envelope encoding failed: {0}")]
    Encode(#[source] ciborium::ser::Error<std::io::Error>),

    #[error("envelope decoding failed: {0}")]
    Decode(#[source] ciborium::de::Error<std::io::Error>),
}

pub fn encode(envelope: &EventEnvelope) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(envelope, &mut bytes).map_err(CodecError::Encode)?;
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> Result<EventEnvelope, CodecError> {
    ciborium::de::from_reader(bytes).map_err(CodecError::Decode)
}
