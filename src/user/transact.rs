//! The transacting client: chain RPC + device signer + codec, bundled once
//! at initialization and reused for every signing call.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::traits::{SignOptions, TransactionResponse};
use crate::blockchain::codec::{CodecError, TransactionCodec};
use crate::blockchain::traits::{ChainRpc, RpcError};
use crate::blockchain::types::{PushTransactionRequest, Transaction, TransactionEnvelope};
use crate::core::domain::ChainId;
use crate::hardware::{DeviceError, KeyProvider};

/// Failures while assembling, signing or submitting a transaction. The
/// adapter folds these into its `Signing` error kind.
#[derive(Debug, Error)]
pub enum TransactError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Bundles everything needed to turn host-supplied actions into a signed
/// (and optionally broadcast) transaction.
pub struct TransactingClient {
    rpc: Arc<dyn ChainRpc>,
    provider: Arc<dyn KeyProvider>,
    codec: Arc<dyn TransactionCodec>,
    chain_id: ChainId,
    key_index: u32,
}

impl TransactingClient {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        provider: Arc<dyn KeyProvider>,
        codec: Arc<dyn TransactionCodec>,
        chain_id: ChainId,
        key_index: u32,
    ) -> Self {
        Self { rpc, provider, codec, chain_id, key_index }
    }

    /// Derivation index the client signs with.
    pub fn key_index(&self) -> u32 {
        self.key_index
    }

    /// Resolve the transaction header, sign the encoded payload with the
    /// bound device key, and submit it when `options.broadcast` is set.
    pub async fn transact(
        &self,
        transaction: Transaction,
        options: SignOptions,
    ) -> Result<TransactionResponse, TransactError> {
        let info = self.rpc.get_info().await?;
        let reference_num = info.head_block_num.saturating_sub(options.blocks_behind as u32);
        let block = self.rpc.get_block_ref(reference_num).await?;

        let envelope = TransactionEnvelope {
            expiration: block.timestamp + chrono::Duration::seconds(options.expire_seconds as i64),
            ref_block_num: block.ref_block_num(),
            ref_block_prefix: block.ref_block_prefix,
            actions: transaction.actions,
        };
        debug!(
            ref_block_num = envelope.ref_block_num,
            expiration = %envelope.expiration,
            "assembled transaction header"
        );

        let payload = self.codec.encode(&envelope)?;
        let signature =
            self.provider.sign_transaction(&self.chain_id, &payload, self.key_index).await?;

        let request = PushTransactionRequest {
            signatures: vec![signature],
            compression: 0,
            packed_trx: hex::encode(&payload),
        };

        if options.broadcast {
            let response = self.rpc.push_transaction(&request).await?;
            info!(transaction_id = %response.transaction_id, "transaction broadcast");
            Ok(TransactionResponse {
                was_broadcast: true,
                transaction: serde_json::to_value(&response).unwrap_or(serde_json::Value::Null),
            })
        } else {
            Ok(TransactionResponse {
                was_broadcast: false,
                transaction: serde_json::to_value(&request).unwrap_or(serde_json::Value::Null),
            })
        }
    }
}
