pub mod config;
pub mod domain;
pub mod errors;

pub use config::{ChainConfig, EndpointConfig};
pub use domain::{AccountName, ChainId, KeyBinding, PermissionLevel, PublicKey, Signature};
pub use errors::{AdapterError, ErrorKind};
