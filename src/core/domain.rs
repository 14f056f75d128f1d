//! Domain newtypes shared across the adapter.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Text prefix of a public key in its printable form.
pub const PUBLIC_KEY_PREFIX: &str = "PUB_K1_";
/// Text prefix of a signature in its printable form.
pub const SIGNATURE_PREFIX: &str = "SIG_K1_";

/// Chain account name (e.g. `mywalletacct`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Hex identifier of the chain the account lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes of the identifier; used when assembling signing payloads.
    pub fn to_bytes(&self) -> Vec<u8> {
        hex::decode(&self.0).unwrap_or_else(|_| self.0.as_bytes().to_vec())
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Public key in its printable form (`PUB_K1_...`).
///
/// Keys coming from the chain RPC and keys reported by the device are
/// compared through this type, so both sides must use the same text
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode raw compressed key bytes into the printable form.
    pub fn from_key_bytes(bytes: &[u8]) -> Self {
        Self(format!("{}{}", PUBLIC_KEY_PREFIX, encode_checked(bytes)))
    }

    /// Whether the text carries the expected prefix and a valid checksum.
    pub fn is_well_formed(&self) -> bool {
        self.0
            .strip_prefix(PUBLIC_KEY_PREFIX)
            .map(|body| decode_checked(body).is_some())
            .unwrap_or(false)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PublicKey {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Signature in its printable form (`SIG_K1_...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode the raw recoverable signature returned by a signing device.
    pub fn from_signature_bytes(bytes: &[u8]) -> Self {
        Self(format!("{}{}", SIGNATURE_PREFIX, encode_checked(bytes)))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named authorization level of an account permission the device can be
/// bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Owner,
    Active,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Owner => "owner",
            PermissionLevel::Active => "active",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "owner" => Some(PermissionLevel::Owner),
            "active" => Some(PermissionLevel::Active),
            _ => None,
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the key-discovery probe: which derivation index the connected
/// device controls, and under which account permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key_index: u32,
    pub permission: PermissionLevel,
}

/// base58 with a 4-byte double-sha256 checksum appended.
fn encode_checked(data: &[u8]) -> String {
    let mut payload = data.to_vec();
    payload.extend_from_slice(&checksum(data));
    bs58::encode(payload).into_string()
}

/// Inverse of [`encode_checked`]; `None` when the checksum does not match.
fn decode_checked(text: &str) -> Option<Vec<u8>> {
    let payload = bs58::decode(text).into_vec().ok()?;
    if payload.len() < 4 {
        return None;
    }
    let (data, check) = payload.split_at(payload.len() - 4);
    if checksum(data) != check {
        return None;
    }
    Some(data.to_vec())
}

fn checksum(data: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 4];
    out.copy_from_slice(&second[..4]);
    out
}
