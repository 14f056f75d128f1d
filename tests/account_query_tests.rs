//! Key enumeration and account-validity checks.

mod common;

use std::sync::Arc;

use common::{account, make_user, MockChainRpc, MockKeyProvider};
use ledger_account_adapter::core::domain::{AccountName, PermissionLevel, PublicKey};
use ledger_account_adapter::core::errors::ErrorKind;
use ledger_account_adapter::user::{AccountUser, LedgerUser, KEY_SEARCH_LIMIT};
use pretty_assertions::assert_eq;

#[test_log::test(tokio::test)]
async fn keys_are_read_at_the_bound_index_with_the_bound_permission() {
    let rpc = Arc::new(MockChainRpc::new(account(&["PUB_K1_dev"], &[])));
    let provider = Arc::new(MockKeyProvider::with_keys(&[(3, "PUB_K1_dev")]));

    let mut user = make_user(rpc, provider.clone());
    user.initialize().await.unwrap();

    let keys = user.keys().await.unwrap();
    assert_eq!(keys, vec![PublicKey::new("PUB_K1_dev")]);

    // The post-probe query targeted the bound index, filtered by the
    // bound permission.
    let queried = provider.queried.lock().unwrap();
    let last = queried.last().unwrap();
    assert_eq!(last.0, vec![3]);
    assert_eq!(last.1, Some(PermissionLevel::Owner));
}

#[tokio::test]
async fn unbound_keys_fall_back_to_the_default_index() {
    let rpc = Arc::new(MockChainRpc::new(account(&["PUB_K1_nomatch"], &[])));
    let provider = Arc::new(MockKeyProvider::with_keys(&[(0, "PUB_K1_dev0")]));

    let mut user = make_user(rpc, provider.clone());
    user.initialize().await.unwrap();
    assert!(user.binding().is_none());

    let keys = user.keys().await.unwrap();
    assert_eq!(keys, vec![PublicKey::new("PUB_K1_dev0")]);

    let queried = provider.queried.lock().unwrap();
    let last = queried.last().unwrap();
    assert_eq!(last.0, vec![0]);
    assert_eq!(last.1, None);
}

#[tokio::test]
async fn default_permission_flag_requests_the_active_class_when_unbound() {
    let rpc = Arc::new(MockChainRpc::new(account(&[], &[])));
    let provider = Arc::new(MockKeyProvider::empty());

    let mut user = LedgerUser::new(common::test_chain(), AccountName::new("alice"), true)
        .with_chain_rpc(rpc)
        .with_key_provider(provider.clone());
    user.initialize().await.unwrap();

    user.keys().await.unwrap();
    let queried = provider.queried.lock().unwrap();
    assert_eq!(queried.last().unwrap().1, Some(PermissionLevel::Active));
}

#[tokio::test]
async fn device_failure_maps_to_a_data_request_error() {
    let rpc = Arc::new(MockChainRpc::new(account(&["PUB_K1_nomatch"], &[])));
    // The device survives the 20 probe queries, then goes away.
    let provider = Arc::new(MockKeyProvider::failing_after(KEY_SEARCH_LIMIT as usize, &[]));

    let mut user = make_user(rpc, provider);
    user.initialize().await.unwrap();

    let err = user.keys().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataRequest);
    assert!(format!("{}", err).contains("connected and unlocked"));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn account_is_valid_when_key_sets_intersect() {
    let rpc = Arc::new(MockChainRpc::new(account(&["PUB_K1_abc"], &[])));
    let provider = Arc::new(MockKeyProvider::with_keys(&[(0, "PUB_K1_abc")]));

    let mut user = make_user(rpc, provider);
    user.initialize().await.unwrap();

    assert!(user.is_account_valid().await.unwrap());
}

#[tokio::test]
async fn account_is_invalid_for_disjoint_key_sets() {
    let rpc = Arc::new(MockChainRpc::new(account(&["PUB_K1_abc"], &[])));
    let provider = Arc::new(MockKeyProvider::with_keys(&[(0, "PUB_K1_xyz")]));

    let mut user = make_user(rpc, provider);
    user.initialize().await.unwrap();

    assert!(!user.is_account_valid().await.unwrap());
}

#[tokio::test]
async fn validity_check_rethrows_data_request_errors_unchanged() {
    let rpc = Arc::new(MockChainRpc::new(account(&["PUB_K1_nomatch"], &[])));
    let provider = Arc::new(MockKeyProvider::failing_after(KEY_SEARCH_LIMIT as usize, &[]));

    let mut user = make_user(rpc, provider);
    user.initialize().await.unwrap();

    // The inner keys() failure keeps its DataRequest kind instead of being
    // double-wrapped as Validation.
    let err = user.is_account_valid().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataRequest);
}

#[tokio::test]
async fn validity_check_wraps_account_fetch_failures() {
    // The node answers the account fetch during initialization, then
    // starts failing: the validity check wraps that as Validation.
    let rpc = Arc::new(
        MockChainRpc::new(account(&["PUB_K1_abc"], &[])).with_account_failing_after(1),
    );
    let provider = Arc::new(MockKeyProvider::with_keys(&[(0, "PUB_K1_abc")]));

    let mut user = make_user(rpc, provider);
    user.initialize().await.unwrap();

    let err = user.is_account_valid().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(std::error::Error::source(&err).is_some());
}
