//! Declared record types for the chain RPC boundary.
//!
//! The node returns open-ended JSON; everything the adapter consumes is
//! deserialized into these types so malformed responses fail at the
//! boundary instead of deep inside an operation.

use crate::core::domain::{AccountName, ChainId, PublicKey, Signature};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Permission names the key-discovery probe matches against.
pub const OWNER_PERMISSION: &str = "owner";
pub const ACTIVE_PERMISSION: &str = "active";

/// Chain node timestamps are ISO-8601 without a timezone suffix, with
/// optional millisecond precision.
pub mod chain_time {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f").map_err(serde::de::Error::custom)
    }
}

/// Summary state of the chain, fetched before assembling a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: ChainId,
    pub head_block_num: u32,
    #[serde(with = "chain_time")]
    pub head_block_time: NaiveDateTime,
    pub last_irreversible_block_num: u32,
}

/// The slice of a block the transaction header references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRef {
    pub block_num: u32,
    pub ref_block_prefix: u32,
    #[serde(with = "chain_time")]
    pub timestamp: NaiveDateTime,
}

impl BlockRef {
    /// Truncated block number carried in the transaction header.
    pub fn ref_block_num(&self) -> u16 {
        (self.block_num & 0xffff) as u16
    }
}

/// A public key and its voting weight inside a permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyWeight {
    pub key: PublicKey,
    pub weight: u16,
}

/// The authority backing a permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredAuth {
    pub threshold: u32,
    #[serde(default)]
    pub keys: Vec<KeyWeight>,
}

/// One named permission of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub perm_name: String,
    #[serde(default)]
    pub parent: String,
    pub required_auth: RequiredAuth,
}

/// On-chain account record, fetched fresh on every operation that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_name: AccountName,
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

/// Bare key lists of the `owner` and `active` permissions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountKeys {
    pub owner: Vec<PublicKey>,
    pub active: Vec<PublicKey>,
}

impl AccountKeys {
    /// Owner and active keys in record order.
    pub fn all(&self) -> impl Iterator<Item = &PublicKey> {
        self.owner.iter().chain(self.active.iter())
    }
}

/// Flatten the `owner` and `active` permission entries of an account down
/// to bare public keys. Absent entries yield empty lists; record order is
/// kept and duplicates are not removed.
pub fn extract_account_keys(account: &AccountRecord) -> AccountKeys {
    let keys_of = |name: &str| -> Vec<PublicKey> {
        account
            .permissions
            .iter()
            .find(|p| p.perm_name == name)
            .map(|p| p.required_auth.keys.iter().map(|kw| kw.key.clone()).collect())
            .unwrap_or_default()
    };

    AccountKeys { owner: keys_of(OWNER_PERMISSION), active: keys_of(ACTIVE_PERMISSION) }
}

/// Authorization carried by an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionAuthorization {
    pub actor: AccountName,
    pub permission: String,
}

/// A single contract action. `data` is the hex-encoded packed argument
/// payload produced by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub account: AccountName,
    pub name: String,
    #[serde(default)]
    pub authorization: Vec<ActionAuthorization>,
    #[serde(default)]
    pub data: String,
}

/// Transaction as supplied by the host: actions only. The header fields
/// are resolved by the transacting client at signing time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Fully resolved transaction: header plus actions, the codec input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    #[serde(with = "chain_time")]
    pub expiration: NaiveDateTime,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub actions: Vec<Action>,
}

/// Body submitted to the node's push endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTransactionRequest {
    pub signatures: Vec<Signature>,
    pub compression: u32,
    pub packed_trx: String,
}

/// Node response for an accepted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTransactionResponse {
    pub transaction_id: String,
    #[serde(default)]
    pub processed: serde_json::Value,
}
