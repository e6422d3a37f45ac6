#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Commonly used types in pocc.
//!
//! This crate contains the chain primitives shared by the node backend and the RPC layer: blocks,
//! headers, legacy signed transactions with their RLP codec and sender recovery, receipts, chain
//! events and the chain configuration.

pub mod abi;
mod block;
mod chain;
pub mod constants;
mod events;
mod receipt;
mod transaction;

/// Helpers for working with serde
pub mod serde_helper;

pub use block::{Block, BlockNumberOrTag, BlockSummary, Header, ParseBlockNumberError};
pub use chain::ChainConfig;
pub use constants::{GWEI_TO_WEI, MIN_TRANSACTION_GAS};
pub use events::{ChainEvent, ChainHeadEvent, ChainSideEvent, NewTxsEvent};
pub use receipt::{Log, Receipt};
pub use transaction::{
    util::secp256k1::{
        public_key_to_address, recover_signer, secret_key_to_address, sign_message,
    },
    InvalidTransactionError, Signature, Transaction, TransactionSigned,
    TransactionSignedEcRecovered,
};

/// A block hash.
pub type BlockHash = B256;
/// A block number.
pub type BlockNumber = u64;
/// A transaction hash is a keccak hash of an RLP encoded signed transaction.
pub type TxHash = B256;
/// Chain identifier type (introduced in EIP-155).
pub type ChainId = u64;
/// An account storage key.
pub type StorageKey = B256;
/// An account storage value.
pub type StorageValue = U256;

pub use alloy_primitives::{
    self, address, b256, bytes, hex, keccak256, Address, Bytes, TxKind, B256, U256, U64,
};
