pub mod ledger;
pub mod traits;
pub mod transact;

pub use ledger::{LedgerUser, DEFAULT_KEY_INDEX, KEY_SEARCH_LIMIT};
pub use traits::{AccountUser, SignOptions, TransactionResponse};
pub use transact::{TransactError, TransactingClient};
