use async_trait::async_trait;
use thiserror::Error;

use crate::blockchain::types::{
    AccountRecord, BlockRef, ChainInfo, PushTransactionRequest, PushTransactionResponse,
};
use crate::core::domain::AccountName;

/// Failures of the chain RPC collaborator. These never reach the host
/// directly; the adapter wraps them into its own taxonomy at the operation
/// boundary.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("node returned {status} for {endpoint}: {body}")]
    Node { endpoint: String, status: u16, body: String },

    #[error("malformed response from {endpoint}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Defines the interface to the remote chain node.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Current chain summary state.
    async fn get_info(&self) -> Result<ChainInfo, RpcError>;

    /// Fetch an account record by name.
    async fn get_account(&self, name: &AccountName) -> Result<AccountRecord, RpcError>;

    /// Fetch the reference slice of a block by number.
    async fn get_block_ref(&self, block_num: u32) -> Result<BlockRef, RpcError>;

    /// Submit a signed transaction for inclusion.
    async fn push_transaction(
        &self,
        request: &PushTransactionRequest,
    ) -> Result<PushTransactionResponse, RpcError>;
}
