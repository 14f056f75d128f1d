//! Hardware signing device support.
//!
//! [`KeyProvider`] is the seam the adapter talks to; the concrete Ledger
//! implementation lives behind the `ledger` feature so the crate builds on
//! hosts without HID support.

pub mod ledger;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::domain::{ChainId, PermissionLevel, PublicKey, Signature};

/// Failures of the signing-device collaborator.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no Ledger device found; check that it is connected and unlocked")]
    NotFound,

    #[error("device transport error: {0}")]
    Transport(String),

    #[error("timed out waiting for the device")]
    Timeout,

    #[error("device returned status {status:#06x}: {description}")]
    Status { status: u16, description: String },

    #[error("malformed device response: {0}")]
    Malformed(String),

    #[error("invalid derivation path '{0}'")]
    InvalidPath(String),
}

/// A public key reported by the device, tagged with the derivation index
/// it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceKey {
    pub key_index: u32,
    pub key: PublicKey,
}

/// Defines the interface to the signing device.
///
/// The underlying transport supports a single in-flight request, so
/// callers issue their queries strictly sequentially.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Public keys for the given derivation indices, optionally restricted
    /// to one permission class.
    async fn available_keys(
        &self,
        indices: &[u32],
        permission: Option<PermissionLevel>,
    ) -> Result<Vec<DeviceKey>, DeviceError>;

    /// Sign a transaction payload with the key at `key_index`.
    async fn sign_transaction(
        &self,
        chain_id: &ChainId,
        payload: &[u8],
        key_index: u32,
    ) -> Result<Signature, DeviceError>;
}
