//! Pocc RPC type definitions.
//!
//! Provides all relevant types for the various RPC endpoints, grouped by namespace. Quantities are
//! hex encoded on the wire.

mod block;
mod call;
pub mod pubsub;
mod transaction;
pub mod txpool;

pub use block::{Block, BlockError, BlockTransactions, Header};
pub use call::{CallRequest, ConflictingInputs};
pub use transaction::{Transaction, TransactionRequest};
