use async_trait::async_trait;
use pocc_primitives::{
    Address, Block, BlockHash, BlockNumber, BlockNumberOrTag, Bytes, Header, StorageKey,
    StorageValue, U256,
};
use std::sync::Arc;

/// Result alias for [`ProviderError`].
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Bundled errors variants thrown by chain data sources.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ProviderError {
    /// No header is known for the requested block.
    #[error("header not found for block {0}")]
    HeaderNotFound(BlockNumberOrTag),
    /// No block is known for the requested hash.
    #[error("block {0} not found")]
    BlockHashNotFound(BlockHash),
    /// The total difficulty for a block is missing.
    #[error("total difficulty not found for block {0}")]
    TotalDifficultyNotFound(BlockHash),
    /// The receipts of a block are missing.
    #[error("receipts not found for block {0}")]
    ReceiptsNotFound(BlockHash),
    /// The header is known but its state is not, e.g. because it was pruned.
    #[error("state not available for block #{0}")]
    StateUnavailable(BlockNumber),
    /// The chain can not be rewound to the requested height.
    #[error("cannot set head to block #{requested}, current head is #{head}")]
    InvalidRewind {
        /// Requested head
        requested: BlockNumber,
        /// Current head
        head: BlockNumber,
    },
    /// Any other failure of the underlying store, e.g. a failed network fetch of a light client.
    #[error("{0}")]
    Custom(String),
}

impl ProviderError {
    /// Returns `true` if the requested data does not exist, as opposed to being unavailable.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::HeaderNotFound(_) |
                Self::BlockHashNotFound(_) |
                Self::TotalDifficultyNotFound(_) |
                Self::ReceiptsNotFound(_)
        )
    }
}

/// Read access to the account state of one block.
///
/// Accounts that do not exist read as empty: zero balance and nonce, no code, zeroed storage.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait StateProvider: Send + Sync {
    /// Get the balance of an account.
    fn balance(&self, address: Address) -> ProviderResult<U256>;

    /// Get the nonce of an account.
    fn nonce(&self, address: Address) -> ProviderResult<u64>;

    /// Get the code deployed at an address.
    fn code(&self, address: Address) -> ProviderResult<Bytes>;

    /// Get a storage slot.
    fn storage(&self, address: Address, key: StorageKey) -> ProviderResult<StorageValue>;
}

/// A boxed [`StateProvider`] that can be moved onto a blocking task.
pub type StateProviderBox = Box<dyn StateProvider + 'static>;

/// Canonical block access, the narrow view used by helpers such as the gas price oracle.
#[async_trait]
pub trait BlockReader: Send + Sync {
    /// Returns the header of the canonical head.
    async fn latest_header(&self) -> ProviderResult<Header>;

    /// Returns the canonical block at the given height.
    async fn block(&self, number: BlockNumber) -> ProviderResult<Arc<Block>>;
}

#[async_trait]
impl<T: BlockReader + ?Sized> BlockReader for Arc<T> {
    async fn latest_header(&self) -> ProviderResult<Header> {
        (**self).latest_header().await
    }

    async fn block(&self, number: BlockNumber) -> ProviderResult<Arc<Block>> {
        (**self).block(number).await
    }
}
