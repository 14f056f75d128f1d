//! Transaction payload codec.
//!
//! The codec is chosen once by the host environment and injected at adapter
//! construction; the adapter never detects encoders at runtime.

use thiserror::Error;

use super::types::TransactionEnvelope;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode transaction: {0}")]
    Encode(String),
}

/// Turns a resolved transaction envelope into the byte payload that is
/// signed by the device and submitted to the node.
pub trait TransactionCodec: Send + Sync {
    fn encode(&self, envelope: &TransactionEnvelope) -> Result<Vec<u8>, CodecError>;
}

/// Default codec: compact binary serialization of the envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl TransactionCodec for BinaryCodec {
    fn encode(&self, envelope: &TransactionEnvelope) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(envelope).map_err(|e| CodecError::Encode(e.to_string()))
    }
}
