//! `pocc` namespace handler implementations.

mod accounts;
mod api;
mod blockchain;
pub mod error;
pub mod gas_oracle;
mod pubsub;
pub mod signer;
mod transactions;

pub use accounts::AccountApi;
pub use api::PoccApi;
pub use blockchain::{BlockChainApi, DEFAULT_EVM_TIMEOUT, RPC_DEFAULT_GAS_CAP};
pub use pubsub::PoccPubSub;
pub use transactions::{TransactionPoolApi, DEFAULT_TX_GAS};

pub(crate) use transactions::{fill_transaction, submit_transaction};

use pocc_interfaces::ProviderResult;

/// Turns a not-found read into `None`, keeping every other failure.
pub(crate) trait ProviderResultExt<T> {
    /// See trait docs.
    fn optional(self) -> ProviderResult<Option<T>>;
}

impl<T> ProviderResultExt<T> for ProviderResult<T> {
    fn optional(self) -> ProviderResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
