use pocc_primitives::{Address, InvalidTransactionError, TransactionSignedEcRecovered, TxHash};
use std::collections::BTreeMap;

/// Transaction pool result type.
pub type PoolResult<T> = Result<T, PoolError>;

/// Reasons the pool refuses a transaction.
///
/// Admission is atomic: a refused transaction leaves no trace in the pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The exact transaction is already pooled.
    #[error("already known transaction: {0}")]
    AlreadyKnown(TxHash),
    /// The nonce was already used by a mined transaction.
    #[error("nonce too low: next nonce {state_nonce}, tx nonce {tx_nonce}")]
    NonceTooLow {
        /// Nonce of the refused transaction
        tx_nonce: u64,
        /// Confirmed nonce of the sender
        state_nonce: u64,
    },
    /// The gas price is below the pool's minimum.
    #[error("transaction underpriced")]
    Underpriced,
    /// A pooled transaction with the same sender and nonce pays more.
    #[error("replacement transaction underpriced")]
    ReplacementUnderpriced,
    /// The transaction failed validation.
    #[error(transparent)]
    Invalid(#[from] InvalidTransactionError),
    /// Any other failure of the pool.
    #[error("{0}")]
    Other(String),
}

/// Number of transactions held by the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Executable transactions
    pub pending: usize,
    /// Transactions waiting for a nonce gap to close
    pub queued: usize,
}

/// Pooled transactions grouped by sender, then keyed by nonce.
pub type TransactionsBySender = BTreeMap<Address, BTreeMap<u64, TransactionSignedEcRecovered>>;

/// The full content of the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolContent {
    /// Executable transactions
    pub pending: TransactionsBySender,
    /// Transactions waiting for a nonce gap to close
    pub queued: TransactionsBySender,
}

impl PoolContent {
    /// Returns only the transactions sent from `address`.
    pub fn from_sender(mut self, address: Address) -> Self {
        self.pending.retain(|sender, _| *sender == address);
        self.queued.retain(|sender, _| *sender == address);
        self
    }
}
