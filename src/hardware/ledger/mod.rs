//! Ledger device integration: APDU protocol, derivation paths, and (with
//! the `ledger` feature) the HID transport and the concrete key provider.

pub mod apdu;
pub mod path;

#[cfg(feature = "ledger")]
pub mod provider;
#[cfg(feature = "ledger")]
pub mod transport;

pub use apdu::{ApduCommand, ApduInstruction, ApduResponse};
pub use path::Bip32Path;

#[cfg(feature = "ledger")]
pub use provider::LedgerKeyProvider;
#[cfg(feature = "ledger")]
pub use transport::LedgerTransport;
