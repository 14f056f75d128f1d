pub mod codec;
pub mod rpc;
pub mod traits;
pub mod types;

pub use codec::{BinaryCodec, CodecError, TransactionCodec};
pub use rpc::HttpChainRpc;
pub use traits::{ChainRpc, RpcError};
pub use types::{extract_account_keys, AccountKeys, AccountRecord, Transaction};
