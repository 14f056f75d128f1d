//! Concrete [`KeyProvider`] over the Ledger HID transport.

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{debug, info};

use super::apdu::{
    ApduCommand, ApduInstruction, P1_FIRST_CHUNK, P1_MORE_CHUNK, P1_NO_CONFIRM,
};
use super::path::Bip32Path;
use super::transport::LedgerTransport;
use crate::core::domain::{ChainId, PermissionLevel, PublicKey, Signature};
use crate::hardware::{DeviceError, DeviceKey, KeyProvider};

/// Maximum APDU data bytes per signing chunk.
const SIGN_CHUNK_SIZE: usize = 230;

/// Uncompressed secp256k1 public key length as reported by the app.
const UNCOMPRESSED_KEY_LEN: usize = 65;

/// Recoverable signature length (v, r, s).
const SIGNATURE_LEN: usize = 65;

/// Key provider backed by a Ledger device running the chain app.
///
/// The transport is guarded by a mutex: the device answers one exchange at
/// a time, and the [`KeyProvider`] contract is sequential anyway.
pub struct LedgerKeyProvider {
    transport: Mutex<LedgerTransport>,
}

impl LedgerKeyProvider {
    /// Connect to the first available Ledger device.
    pub fn connect() -> Result<Self, DeviceError> {
        let transport = LedgerTransport::open()?;
        Ok(Self { transport: Mutex::new(transport) })
    }

    pub fn from_transport(transport: LedgerTransport) -> Self {
        Self { transport: Mutex::new(transport) }
    }

    /// App version string, mostly useful for connection diagnostics.
    pub fn app_version(&self) -> Result<String, DeviceError> {
        let command = ApduCommand::new(ApduInstruction::GetAppConfiguration, 0x00, 0x00, vec![]);
        let data = self.exchange(&command)?.into_result()?;

        if data.len() < 4 {
            return Err(DeviceError::Malformed("app configuration too short".to_string()));
        }
        let version = format!("{}.{}.{}", data[1], data[2], data[3]);
        info!("Ledger chain app version {}", version);
        Ok(version)
    }

    fn exchange(&self, command: &ApduCommand) -> Result<super::apdu::ApduResponse, DeviceError> {
        let transport = self
            .transport
            .lock()
            .map_err(|_| DeviceError::Transport("transport mutex poisoned".to_string()))?;
        transport.exchange(command)
    }

    /// Fetch the public key derived at `key_index`, without on-screen
    /// confirmation.
    fn public_key_at(&self, key_index: u32) -> Result<PublicKey, DeviceError> {
        let path = Bip32Path::signing_path(key_index);
        debug!("requesting public key at {}", path);

        let command =
            ApduCommand::new(ApduInstruction::GetPublicKey, P1_NO_CONFIRM, 0x00, path.to_bytes());
        let data = self.exchange(&command)?.into_result()?;

        if data.is_empty() {
            return Err(DeviceError::Malformed("empty public key response".to_string()));
        }
        let key_len = data[0] as usize;
        if data.len() < 1 + key_len {
            return Err(DeviceError::Malformed("truncated public key response".to_string()));
        }

        let compressed = compress_public_key(&data[1..1 + key_len])?;
        Ok(PublicKey::from_key_bytes(&compressed))
    }

    /// Sign `chain_id ++ payload` with the key at `key_index`. The message
    /// is chunked; the first chunk carries the derivation path.
    fn sign_payload(
        &self,
        chain_id: &ChainId,
        payload: &[u8],
        key_index: u32,
    ) -> Result<Signature, DeviceError> {
        let path = Bip32Path::signing_path(key_index);
        info!("signing {} payload bytes with key index {}", payload.len(), key_index);

        let mut message = chain_id.to_bytes();
        message.extend_from_slice(payload);

        let mut chunks = message.chunks(SIGN_CHUNK_SIZE);
        let first = chunks.next().unwrap_or(&[]);

        let mut data = path.to_bytes();
        data.extend_from_slice(first);
        let mut response = self
            .exchange(&ApduCommand::new(ApduInstruction::SignTransaction, P1_FIRST_CHUNK, 0x00, data))?;

        for chunk in chunks {
            response = self.exchange(&ApduCommand::new(
                ApduInstruction::SignTransaction,
                P1_MORE_CHUNK,
                0x00,
                chunk.to_vec(),
            ))?;
        }

        let data = response.into_result()?;
        if data.len() < SIGNATURE_LEN {
            return Err(DeviceError::Malformed(format!(
                "signature response of {} bytes, expected {}",
                data.len(),
                SIGNATURE_LEN
            )));
        }

        Ok(Signature::from_signature_bytes(&data[..SIGNATURE_LEN]))
    }
}

#[async_trait]
impl KeyProvider for LedgerKeyProvider {
    async fn available_keys(
        &self,
        indices: &[u32],
        permission: Option<PermissionLevel>,
    ) -> Result<Vec<DeviceKey>, DeviceError> {
        // The device derives one key per index regardless of the account
        // permission it ends up backing; the filter only narrows what the
        // caller asked to see.
        if let Some(permission) = permission {
            debug!("enumerating keys for permission class '{}'", permission);
        }

        let mut keys = Vec::with_capacity(indices.len());
        for &index in indices {
            let key = self.public_key_at(index)?;
            keys.push(DeviceKey { key_index: index, key });
        }
        Ok(keys)
    }

    async fn sign_transaction(
        &self,
        chain_id: &ChainId,
        payload: &[u8],
        key_index: u32,
    ) -> Result<Signature, DeviceError> {
        self.sign_payload(chain_id, payload, key_index)
    }
}

/// Compress an uncompressed secp256k1 public key (`04 || X || Y`) to its
/// 33-byte form. Already-compressed keys pass through.
fn compress_public_key(raw: &[u8]) -> Result<[u8; 33], DeviceError> {
    let mut out = [0u8; 33];

    match raw.len() {
        33 if raw[0] == 0x02 || raw[0] == 0x03 => {
            out.copy_from_slice(raw);
            Ok(out)
        }
        UNCOMPRESSED_KEY_LEN if raw[0] == 0x04 => {
            out[0] = if raw[64] & 1 == 1 { 0x03 } else { 0x02 };
            out[1..].copy_from_slice(&raw[1..33]);
            Ok(out)
        }
        _ => Err(DeviceError::Malformed(format!("unexpected public key encoding ({} bytes)", raw.len()))),
    }
}
