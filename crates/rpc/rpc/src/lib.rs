#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Pocc RPC implementation
//!
//! Provides the implementation of all RPC interfaces on top of a
//! [`Backend`](pocc_interfaces::Backend), the per-address nonce lock shared by every service that
//! submits transactions, and the in-process [`ContractBackend`].
//!
//! ## Feature Flags
//!
//! - `test-utils`: Export an in-memory backend with a scripted interpreter for testing.

mod contract;
mod debug;
mod nonce_lock;
mod personal;
pub mod pocc;
mod rpc;
mod txpool;

pub use contract::{CallMsg, ContractBackend, LocalContractBackend};
pub use debug::{DebugApi, PrivateDebugApi};
pub use nonce_lock::{AddrLockGuard, AddrLocker};
pub use personal::{PersonalApi, DEFAULT_UNLOCK_DURATION};
pub use pocc::{
    AccountApi, BlockChainApi, PoccApi, PoccPubSub, TransactionPoolApi, DEFAULT_EVM_TIMEOUT,
    DEFAULT_TX_GAS, RPC_DEFAULT_GAS_CAP,
};
pub use rpc::RPCApi;
pub use txpool::TxPoolApi;

pub mod result;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
