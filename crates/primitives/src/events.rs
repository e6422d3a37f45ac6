//! Notifications published by the chain and the transaction pool.

use crate::{Block, BlockHash, Log, TransactionSigned};
use std::sync::Arc;

/// A block was imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEvent {
    /// The imported block.
    pub block: Arc<Block>,
    /// Hash of the imported block.
    pub hash: BlockHash,
    /// Logs emitted by the block's transactions.
    pub logs: Vec<Log>,
}

/// A block became the canonical head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHeadEvent {
    /// The new head.
    pub block: Arc<Block>,
}

/// A block was imported on a side chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSideEvent {
    /// The side block.
    pub block: Arc<Block>,
}

/// Transactions entered the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTxsEvent {
    /// The admitted transactions.
    pub txs: Vec<Arc<TransactionSigned>>,
}
