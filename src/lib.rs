//! Ledger hardware-wallet signing backend for chain accounts.
//!
//! This crate binds a chain account name to a key-derivation index on a
//! connected Ledger device and proxies sign/query operations between a host
//! authenticator framework, the device, and the chain's RPC node.
//!
//! The entry point is [`user::LedgerUser`]: construct it with a
//! [`core::ChainConfig`] and an account name, call
//! [`initialize`](user::LedgerUser::initialize), then drive it through the
//! [`user::AccountUser`] contract. All failures surface as
//! [`core::AdapterError`] with one of five closed kinds.
//!
//! Talking to a physical device requires the `ledger` feature; without it,
//! a [`hardware::KeyProvider`] implementation must be injected.

pub mod blockchain;
pub mod core;
pub mod hardware;
pub mod user;

pub use crate::core::{AdapterError, ChainConfig, EndpointConfig, ErrorKind};
pub use crate::user::{AccountUser, LedgerUser, SignOptions, TransactionResponse};
