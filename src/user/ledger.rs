//! The Ledger account adapter: binds a chain account to a device key index
//! and proxies sign/query operations for the host framework.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::traits::{AccountUser, SignOptions, TransactionResponse};
use super::transact::TransactingClient;
use crate::blockchain::codec::{BinaryCodec, TransactionCodec};
use crate::blockchain::rpc::HttpChainRpc;
use crate::blockchain::traits::ChainRpc;
use crate::blockchain::types::{extract_account_keys, AccountKeys, Transaction};
use crate::core::config::ChainConfig;
use crate::core::domain::{
    AccountName, ChainId, KeyBinding, PermissionLevel, PublicKey, Signature,
};
use crate::core::errors::{AdapterError, ErrorKind};
use crate::hardware::{DeviceError, KeyProvider};

/// The key-discovery probe walks derivation indices `0..KEY_SEARCH_LIMIT`.
pub const KEY_SEARCH_LIMIT: u32 = 20;

/// Index signed with when discovery found no match.
pub const DEFAULT_KEY_INDEX: u32 = 0;

const NOT_INITIALIZED: &str = "the adapter is not initialized; call initialize() first";
const SIGNING_FALLBACK: &str = "unable to sign the transaction";
const KEYS_MESSAGE: &str =
    "unable to read keys from the device; check that it is connected and unlocked";

/// A chain account backed by a Ledger signing device.
///
/// Construct with the account identity, then call [`initialize`] before
/// any sign/query operation. The discovered key binding is stable for the
/// adapter's lifetime.
///
/// [`initialize`]: LedgerUser::initialize
pub struct LedgerUser {
    chain: ChainConfig,
    account_name: AccountName,
    request_default_permission: bool,
    codec: Arc<dyn TransactionCodec>,
    rpc: Option<Arc<dyn ChainRpc>>,
    provider: Option<Arc<dyn KeyProvider>>,
    binding: Option<KeyBinding>,
    transacting: Option<TransactingClient>,
}

impl LedgerUser {
    pub fn new(chain: ChainConfig, account_name: AccountName, request_default_permission: bool) -> Self {
        Self {
            chain,
            account_name,
            request_default_permission,
            codec: Arc::new(BinaryCodec),
            rpc: None,
            provider: None,
            binding: None,
            transacting: None,
        }
    }

    /// Replace the default codec. The codec is fixed at construction; the
    /// adapter never selects encoders at runtime.
    pub fn with_codec(mut self, codec: Arc<dyn TransactionCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Inject a chain RPC client instead of connecting to the configured
    /// endpoint. Useful for testing with a mock node.
    pub fn with_chain_rpc(mut self, rpc: Arc<dyn ChainRpc>) -> Self {
        self.rpc = Some(rpc);
        self
    }

    /// Inject a key provider instead of opening a Ledger device. Useful
    /// for testing with a mock device.
    pub fn with_key_provider(mut self, provider: Arc<dyn KeyProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// The discovered key binding, `None` until [`initialize`] matched a
    /// device key against the account (or when nothing matched).
    ///
    /// [`initialize`]: LedgerUser::initialize
    pub fn binding(&self) -> Option<&KeyBinding> {
        self.binding.as_ref()
    }

    /// Resolve the RPC connection, probe the device for a key matching the
    /// account's owner or active permission, and build the transacting
    /// client.
    ///
    /// Completes `Ok` even when no derivation index matches; the unbound
    /// state is observable through [`binding`] and logged as a warning.
    ///
    /// [`binding`]: LedgerUser::binding
    pub async fn initialize(&mut self) -> Result<(), AdapterError> {
        info!(account = %self.account_name, "initializing Ledger account adapter");

        let provider = self.resolve_provider()?;
        let rpc = self.resolve_rpc()?;

        let account = rpc.get_account(&self.account_name).await.map_err(|e| {
            AdapterError::wrap(
                ErrorKind::Initialization,
                format!("unable to fetch account '{}'", self.account_name),
                e,
            )
        })?;
        let account_keys = extract_account_keys(&account);

        let binding = discover_binding(provider.as_ref(), &account_keys).await.map_err(|e| {
            AdapterError::wrap(
                ErrorKind::Initialization,
                "error while probing the device for a matching key",
                e,
            )
        })?;

        match binding {
            Some(bound) => {
                info!(key_index = bound.key_index, permission = %bound.permission, "bound device key")
            }
            None => warn!(
                account = %self.account_name,
                limit = KEY_SEARCH_LIMIT,
                "no device key matches the account's owner or active permissions; \
                 signing will use key index 0"
            ),
        }

        let key_index = binding.map(|b| b.key_index).unwrap_or(DEFAULT_KEY_INDEX);
        self.binding = binding;
        self.transacting = Some(TransactingClient::new(
            rpc.clone(),
            provider.clone(),
            self.codec.clone(),
            self.chain.chain_id.clone(),
            key_index,
        ));
        self.rpc = Some(rpc);
        self.provider = Some(provider);
        Ok(())
    }

    fn resolve_rpc(&self) -> Result<Arc<dyn ChainRpc>, AdapterError> {
        if let Some(rpc) = &self.rpc {
            return Ok(rpc.clone());
        }

        let endpoint = self.chain.first_endpoint().ok_or_else(|| {
            AdapterError::new(ErrorKind::Initialization, "no RPC endpoint configured for the chain")
        })?;
        let rpc = HttpChainRpc::new(&endpoint.url()).map_err(|e| {
            AdapterError::wrap(ErrorKind::Initialization, "unable to construct the chain RPC client", e)
        })?;
        Ok(Arc::new(rpc))
    }

    #[cfg(feature = "ledger")]
    fn resolve_provider(&self) -> Result<Arc<dyn KeyProvider>, AdapterError> {
        if let Some(provider) = &self.provider {
            return Ok(provider.clone());
        }

        let provider = crate::hardware::ledger::LedgerKeyProvider::connect().map_err(|e| {
            AdapterError::wrap(ErrorKind::Initialization, "unable to open the Ledger device", e)
        })?;
        Ok(Arc::new(provider))
    }

    #[cfg(not(feature = "ledger"))]
    fn resolve_provider(&self) -> Result<Arc<dyn KeyProvider>, AdapterError> {
        self.provider.clone().ok_or_else(|| {
            AdapterError::new(
                ErrorKind::Initialization,
                "no key provider configured and hardware support is not compiled in \
                 (enable the `ledger` feature)",
            )
        })
    }
}

/// Walk derivation indices in order, asking the device for the key at each
/// one and matching it against the account's owner keys first, then its
/// active keys. Stops at the first match.
async fn discover_binding(
    provider: &dyn KeyProvider,
    account_keys: &AccountKeys,
) -> Result<Option<KeyBinding>, DeviceError> {
    for key_index in 0..KEY_SEARCH_LIMIT {
        let device_keys = provider.available_keys(&[key_index], None).await?;
        debug!(key_index, reported = device_keys.len(), "probed device index");

        if device_keys.iter().any(|dk| account_keys.owner.contains(&dk.key)) {
            return Ok(Some(KeyBinding { key_index, permission: PermissionLevel::Owner }));
        }
        if device_keys.iter().any(|dk| account_keys.active.contains(&dk.key)) {
            return Ok(Some(KeyBinding { key_index, permission: PermissionLevel::Active }));
        }
    }

    Ok(None)
}

#[async_trait]
impl AccountUser for LedgerUser {
    async fn sign_transaction(
        &self,
        transaction: Transaction,
        options: SignOptions,
    ) -> Result<TransactionResponse, AdapterError> {
        let client = self
            .transacting
            .as_ref()
            .ok_or_else(|| AdapterError::new(ErrorKind::Signing, NOT_INITIALIZED))?;

        client.transact(transaction, options).await.map_err(|e| {
            let message = e.to_string();
            let message = if message.is_empty() { SIGNING_FALLBACK.to_string() } else { message };
            AdapterError::wrap(ErrorKind::Signing, message, e)
        })
    }

    async fn sign_arbitrary(
        &self,
        _public_key: &PublicKey,
        _data: &[u8],
    ) -> Result<Signature, AdapterError> {
        Err(AdapterError::unsupported("sign_arbitrary"))
    }

    async fn verify_key_ownership(&self, _key: &PublicKey) -> Result<bool, AdapterError> {
        Err(AdapterError::unsupported("verify_key_ownership"))
    }

    fn account_name(&self) -> &AccountName {
        &self.account_name
    }

    fn chain_id(&self) -> &ChainId {
        &self.chain.chain_id
    }

    async fn keys(&self) -> Result<Vec<PublicKey>, AdapterError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| AdapterError::new(ErrorKind::DataRequest, NOT_INITIALIZED))?;

        let key_index = self.binding.map(|b| b.key_index).unwrap_or(DEFAULT_KEY_INDEX);
        let permission = self.binding.map(|b| b.permission).or({
            if self.request_default_permission {
                Some(PermissionLevel::Active)
            } else {
                None
            }
        });

        let device_keys = provider
            .available_keys(&[key_index], permission)
            .await
            .map_err(|e| AdapterError::wrap(ErrorKind::DataRequest, KEYS_MESSAGE, e))?;

        Ok(device_keys.into_iter().map(|dk| dk.key).collect())
    }

    async fn is_account_valid(&self) -> Result<bool, AdapterError> {
        let rpc = self
            .rpc
            .as_ref()
            .ok_or_else(|| AdapterError::new(ErrorKind::Validation, NOT_INITIALIZED))?;

        let account = rpc.get_account(&self.account_name).await.map_err(|e| {
            AdapterError::wrap(
                ErrorKind::Validation,
                format!("unable to fetch account '{}'", self.account_name),
                e,
            )
        })?;
        let account_keys = extract_account_keys(&account);

        let device_keys = match self.keys().await {
            Ok(keys) => keys,
            // Adapter-originated data-request failures propagate unchanged.
            Err(err @ AdapterError::DataRequest { .. }) => return Err(err),
            Err(err) => {
                return Err(AdapterError::wrap(
                    ErrorKind::Validation,
                    "unable to read device keys during validation",
                    err,
                ))
            }
        };

        let matched = account_keys.all().any(|key| device_keys.contains(key));
        Ok(matched)
    }
}
