//! The host authenticator framework's user contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::blockchain::types::Transaction;
use crate::core::domain::{AccountName, ChainId, PublicKey, Signature};
use crate::core::errors::AdapterError;

/// Options for [`AccountUser::sign_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignOptions {
    /// Submit the signed transaction to the node.
    #[serde(default = "SignOptions::default_broadcast")]
    pub broadcast: bool,

    /// How far behind the head block the reference block is taken.
    #[serde(default = "SignOptions::default_blocks_behind")]
    pub blocks_behind: u16,

    /// Transaction lifetime measured from the reference block time.
    #[serde(default = "SignOptions::default_expire_seconds")]
    pub expire_seconds: u32,
}

impl SignOptions {
    fn default_broadcast() -> bool {
        true
    }

    fn default_blocks_behind() -> u16 {
        3
    }

    fn default_expire_seconds() -> u32 {
        30
    }
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            broadcast: Self::default_broadcast(),
            blocks_behind: Self::default_blocks_behind(),
            expire_seconds: Self::default_expire_seconds(),
        }
    }
}

/// Result of a signing operation, shaped per the host framework's
/// transaction-result contract: the broadcast flag plus the raw completed
/// transaction payload (node response when broadcast, signed request body
/// otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub was_broadcast: bool,
    pub transaction: serde_json::Value,
}

/// Lifecycle contract a signing backend fulfils for the host framework.
#[async_trait]
pub trait AccountUser: Send + Sync {
    /// Sign (and by default broadcast) a transaction on behalf of the
    /// bound account.
    async fn sign_transaction(
        &self,
        transaction: Transaction,
        options: SignOptions,
    ) -> Result<TransactionResponse, AdapterError>;

    /// Sign an arbitrary message with the given key.
    async fn sign_arbitrary(
        &self,
        public_key: &PublicKey,
        data: &[u8],
    ) -> Result<Signature, AdapterError>;

    /// Prove ownership of the given key.
    async fn verify_key_ownership(&self, key: &PublicKey) -> Result<bool, AdapterError>;

    fn account_name(&self) -> &AccountName;

    fn chain_id(&self) -> &ChainId;

    /// Public keys the backing device currently reports for this user.
    async fn keys(&self) -> Result<Vec<PublicKey>, AdapterError>;

    /// Whether the backing device holds any key present on the account.
    async fn is_account_valid(&self) -> Result<bool, AdapterError>;
}
