//! Shared mock collaborators for the adapter integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ledger_account_adapter::blockchain::traits::{ChainRpc, RpcError};
use ledger_account_adapter::blockchain::types::{
    AccountRecord, BlockRef, ChainInfo, KeyWeight, PermissionEntry, PushTransactionRequest,
    PushTransactionResponse, RequiredAuth,
};
use ledger_account_adapter::core::config::{ChainConfig, EndpointConfig};
use ledger_account_adapter::core::domain::{
    AccountName, ChainId, PermissionLevel, PublicKey, Signature,
};
use ledger_account_adapter::hardware::{DeviceError, DeviceKey, KeyProvider};
use ledger_account_adapter::user::LedgerUser;

pub const TEST_CHAIN_ID: &str = "cf057bbfb72640471fd910bcb67639c22df9f92470936cddc1ade0e2f2e7dc4f";

pub fn test_chain() -> ChainConfig {
    ChainConfig::new(
        ChainId::new(TEST_CHAIN_ID),
        vec![EndpointConfig::new("https", "api.example.org", 443)],
    )
}

pub fn noon() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
}

/// Account record with the given owner and active key texts.
pub fn account(owner: &[&str], active: &[&str]) -> AccountRecord {
    let entry = |name: &str, keys: &[&str]| PermissionEntry {
        perm_name: name.to_string(),
        parent: if name == "owner" { String::new() } else { "owner".to_string() },
        required_auth: RequiredAuth {
            threshold: 1,
            keys: keys.iter().map(|k| KeyWeight { key: PublicKey::new(*k), weight: 1 }).collect(),
        },
    };

    AccountRecord {
        account_name: AccountName::new("alice"),
        permissions: vec![entry("owner", owner), entry("active", active)],
    }
}

pub fn make_user(rpc: Arc<MockChainRpc>, provider: Arc<MockKeyProvider>) -> LedgerUser {
    LedgerUser::new(test_chain(), AccountName::new("alice"), false)
        .with_chain_rpc(rpc)
        .with_key_provider(provider)
}

/// Mock chain node. Records reference-block lookups and pushed
/// transactions for assertions.
pub struct MockChainRpc {
    account: Option<AccountRecord>,
    head_block_num: u32,
    block_timestamp: NaiveDateTime,
    ref_block_prefix: u32,
    fail_push: bool,
    /// Fail `get_account` after it succeeded this many times.
    fail_account_after: Option<usize>,
    account_calls: AtomicUsize,
    pub block_requests: Mutex<Vec<u32>>,
    pub pushed: Mutex<Vec<PushTransactionRequest>>,
}

impl MockChainRpc {
    pub fn new(account: AccountRecord) -> Self {
        Self {
            account: Some(account),
            head_block_num: 100,
            block_timestamp: noon(),
            ref_block_prefix: 0xDEAD_BEEF,
            fail_push: false,
            fail_account_after: None,
            account_calls: AtomicUsize::new(0),
            block_requests: Mutex::new(Vec::new()),
            pushed: Mutex::new(Vec::new()),
        }
    }

    /// Node that cannot resolve the account.
    pub fn failing_account() -> Self {
        let mut rpc = Self::new(account(&[], &[]));
        rpc.account = None;
        rpc
    }

    pub fn with_head(mut self, head_block_num: u32) -> Self {
        self.head_block_num = head_block_num;
        self
    }

    pub fn with_failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn with_account_failing_after(mut self, calls: usize) -> Self {
        self.fail_account_after = Some(calls);
        self
    }

    pub fn block_timestamp(&self) -> NaiveDateTime {
        self.block_timestamp
    }

    pub fn ref_block_prefix(&self) -> u32 {
        self.ref_block_prefix
    }
}

#[async_trait]
impl ChainRpc for MockChainRpc {
    async fn get_info(&self) -> Result<ChainInfo, RpcError> {
        Ok(ChainInfo {
            chain_id: ChainId::new(TEST_CHAIN_ID),
            head_block_num: self.head_block_num,
            head_block_time: self.block_timestamp,
            last_irreversible_block_num: self.head_block_num.saturating_sub(5),
        })
    }

    async fn get_account(&self, _name: &AccountName) -> Result<AccountRecord, RpcError> {
        let call = self.account_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let exhausted = self.fail_account_after.map(|limit| call > limit).unwrap_or(false);

        self.account.clone().filter(|_| !exhausted).ok_or(RpcError::Node {
            endpoint: "/v1/chain/get_account".to_string(),
            status: 500,
            body: "unknown account".to_string(),
        })
    }

    async fn get_block_ref(&self, block_num: u32) -> Result<BlockRef, RpcError> {
        self.block_requests.lock().unwrap().push(block_num);
        Ok(BlockRef {
            block_num,
            ref_block_prefix: self.ref_block_prefix,
            timestamp: self.block_timestamp,
        })
    }

    async fn push_transaction(
        &self,
        request: &PushTransactionRequest,
    ) -> Result<PushTransactionResponse, RpcError> {
        if self.fail_push {
            return Err(RpcError::Node {
                endpoint: "/v1/chain/push_transaction".to_string(),
                status: 500,
                body: "transaction declined".to_string(),
            });
        }

        self.pushed.lock().unwrap().push(request.clone());
        Ok(PushTransactionResponse {
            transaction_id: "ab".repeat(32),
            processed: serde_json::json!({ "block_num": self.head_block_num + 1 }),
        })
    }
}

enum FailMode {
    Never,
    Always,
    /// Succeed for the first `n` `available_keys` calls, fail afterwards.
    AfterCalls(usize),
}

/// Mock signing device. Keys are configured per derivation index; every
/// `available_keys` call is recorded with its permission filter.
pub struct MockKeyProvider {
    keys: HashMap<u32, Vec<PublicKey>>,
    mode: FailMode,
    calls: AtomicUsize,
    pub queried: Mutex<Vec<(Vec<u32>, Option<PermissionLevel>)>>,
}

impl MockKeyProvider {
    pub fn with_keys(pairs: &[(u32, &str)]) -> Self {
        let mut keys: HashMap<u32, Vec<PublicKey>> = HashMap::new();
        for (index, key) in pairs {
            keys.entry(*index).or_default().push(PublicKey::new(*key));
        }
        Self {
            keys,
            mode: FailMode::Never,
            calls: AtomicUsize::new(0),
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_keys(&[])
    }

    pub fn failing() -> Self {
        let mut provider = Self::empty();
        provider.mode = FailMode::Always;
        provider
    }

    pub fn failing_after(calls: usize, pairs: &[(u32, &str)]) -> Self {
        let mut provider = Self::with_keys(pairs);
        provider.mode = FailMode::AfterCalls(calls);
        provider
    }

    pub fn query_count(&self) -> usize {
        self.queried.lock().unwrap().len()
    }
}

#[async_trait]
impl KeyProvider for MockKeyProvider {
    async fn available_keys(
        &self,
        indices: &[u32],
        permission: Option<PermissionLevel>,
    ) -> Result<Vec<DeviceKey>, DeviceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.mode {
            FailMode::Always => return Err(DeviceError::NotFound),
            FailMode::AfterCalls(limit) if call > limit => return Err(DeviceError::NotFound),
            _ => {}
        }

        self.queried.lock().unwrap().push((indices.to_vec(), permission));

        Ok(indices
            .iter()
            .flat_map(|index| {
                self.keys
                    .get(index)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|key| DeviceKey { key_index: *index, key })
            })
            .collect())
    }

    async fn sign_transaction(
        &self,
        _chain_id: &ChainId,
        _payload: &[u8],
        key_index: u32,
    ) -> Result<Signature, DeviceError> {
        match self.mode {
            FailMode::Always => Err(DeviceError::NotFound),
            _ => Ok(Signature::new(format!("SIG_K1_mock_{}", key_index))),
        }
    }
}
