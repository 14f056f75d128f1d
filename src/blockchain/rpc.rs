//! HTTP implementation of the chain RPC collaborator.

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::traits::{ChainRpc, RpcError};
use super::types::{
    AccountRecord, BlockRef, ChainInfo, PushTransactionRequest, PushTransactionResponse,
};
use crate::core::domain::AccountName;

const GET_INFO: &str = "/v1/chain/get_info";
const GET_ACCOUNT: &str = "/v1/chain/get_account";
const GET_BLOCK: &str = "/v1/chain/get_block";
const PUSH_TRANSACTION: &str = "/v1/chain/push_transaction";

/// Chain node client over HTTP. All node queries are POSTs with a JSON
/// body, answered with JSON.
#[derive(Debug)]
pub struct HttpChainRpc {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChainRpc {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        reqwest::Url::parse(endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid chain RPC endpoint '{}': {}", endpoint, e))?;

        info!("Connecting to chain RPC at {}", endpoint);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { base_url: endpoint.to_string(), client })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, RpcError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::Transport { endpoint: path.to_string(), source: e })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("node returned {} for {}", status, path);
            return Err(RpcError::Node { endpoint: path.to_string(), status: status.as_u16(), body });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| RpcError::Decode { endpoint: path.to_string(), source: e })
    }
}

#[async_trait]
impl ChainRpc for HttpChainRpc {
    async fn get_info(&self) -> Result<ChainInfo, RpcError> {
        self.post(GET_INFO, &serde_json::json!({})).await
    }

    async fn get_account(&self, name: &AccountName) -> Result<AccountRecord, RpcError> {
        debug!("Fetching account record for {}", name);
        self.post(GET_ACCOUNT, &serde_json::json!({ "account_name": name })).await
    }

    async fn get_block_ref(&self, block_num: u32) -> Result<BlockRef, RpcError> {
        self.post(GET_BLOCK, &serde_json::json!({ "block_num_or_id": block_num })).await
    }

    async fn push_transaction(
        &self,
        request: &PushTransactionRequest,
    ) -> Result<PushTransactionResponse, RpcError> {
        let response: PushTransactionResponse = self.post(PUSH_TRANSACTION, request).await?;
        info!(transaction_id = %response.transaction_id, "Transaction accepted by node");
        Ok(response)
    }
}
