#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Pocc interface bindings
//!
//! The [`Backend`] capability trait and the narrow contracts of the collaborators it is built
//! from: chain and state access, the interpreter bridge, the transaction pool and key storage.

/// Key storage and signing.
pub mod accounts;

/// The node capability trait.
mod backend;
pub use backend::Backend;

/// The interpreter bridge.
pub mod evm;

/// Transaction pool types.
pub mod pool;

/// Chain and state access.
pub mod provider;

pub use accounts::{AccountManager, SignError};
pub use evm::{Evm, EvmError, EvmGuard, ExecutionResult, HaltReason, Message};
pub use pool::{PoolContent, PoolError, PoolResult, PoolStats};
pub use provider::{
    BlockReader, ProviderError, ProviderResult, StateProvider, StateProviderBox,
};
