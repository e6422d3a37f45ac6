//! The capability trait every node flavor implements.

use crate::{
    accounts::AccountManager,
    evm::{EvmError, EvmGuard, Message},
    pool::{PoolContent, PoolResult, PoolStats},
    provider::{ProviderResult, StateProviderBox},
};
use async_trait::async_trait;
use pocc_primitives::{
    Address, Block, BlockHash, BlockNumber, BlockNumberOrTag, BlockSummary, ChainConfig,
    ChainEvent, ChainHeadEvent, ChainSideEvent, Header, NewTxsEvent, Receipt,
    TransactionSignedEcRecovered, TxHash, U256,
};
use pocc_tokio_util::EventStream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything the RPC services need from a node.
///
/// Full and light nodes both implement this trait, so the services built on top of it never know
/// which flavor they are serving. Reads against a block that does not exist fail with a not-found
/// [`ProviderError`](crate::provider::ProviderError); they never produce zero values.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    // === node ===

    /// The wire protocol version the node speaks.
    fn protocol_version(&self) -> u64;

    /// A gas price likely to get a transaction included soon.
    async fn suggest_price(&self) -> ProviderResult<U256>;

    /// The chain's fork configuration.
    fn chain_config(&self) -> ChainConfig;

    /// The canonical head.
    fn current_block(&self) -> Arc<Block>;

    /// The header of the canonical head.
    fn current_header(&self) -> Header {
        self.current_block().header.clone()
    }

    /// Key storage and signing.
    fn account_manager(&self) -> &dyn AccountManager;

    /// Rewinds the canonical chain to `number`.
    async fn set_head(&self, number: BlockNumber) -> ProviderResult<()>;

    // === chain ===

    /// Resolves a block number or tag to its header. `Pending` resolves to the block being built
    /// on top of the head.
    async fn header_by_number(&self, number: BlockNumberOrTag) -> ProviderResult<Header>;

    /// Resolves a block number or tag to its block.
    async fn block_by_number(&self, number: BlockNumberOrTag) -> ProviderResult<Arc<Block>>;

    /// Looks up a block by hash.
    async fn block_by_hash(&self, hash: BlockHash) -> ProviderResult<Arc<Block>>;

    /// Summaries of up to `count` canonical blocks, walking back from `start`.
    async fn poc_blocks(
        &self,
        start: BlockNumberOrTag,
        count: u64,
    ) -> ProviderResult<Vec<BlockSummary>>;

    /// Receipts of the block with the given hash.
    async fn receipts(&self, hash: BlockHash) -> ProviderResult<Vec<Receipt>>;

    /// Total difficulty of the chain up to and including the block with the given hash.
    async fn total_difficulty(&self, hash: BlockHash) -> ProviderResult<U256>;

    /// Resolves a block number or tag to its state and header. `Pending` overlays the pooled
    /// transactions on top of the head state.
    async fn state_and_header_by_number(
        &self,
        number: BlockNumberOrTag,
    ) -> ProviderResult<(StateProviderBox, Header)>;

    // === execution ===

    /// Builds an interpreter that runs `msg` on `state` in the context of `header`.
    ///
    /// The instance stops with [`EvmError::Cancelled`] once `cancel` fires. Fails if the state
    /// behind `header` is unavailable.
    async fn evm(
        &self,
        msg: Message,
        state: StateProviderBox,
        header: &Header,
        cancel: CancellationToken,
    ) -> Result<EvmGuard, EvmError>;

    // === events ===

    /// Subscribes to imported blocks.
    fn subscribe_chain_events(&self) -> EventStream<ChainEvent>;

    /// Subscribes to canonical head changes.
    fn subscribe_chain_head_events(&self) -> EventStream<ChainHeadEvent>;

    /// Subscribes to side chain blocks.
    fn subscribe_chain_side_events(&self) -> EventStream<ChainSideEvent>;

    /// Subscribes to transactions entering the pool.
    fn subscribe_new_txs(&self) -> EventStream<NewTxsEvent>;

    // === pool ===

    /// Submits a signed transaction to the pool.
    async fn send_tx(&self, tx: TransactionSignedEcRecovered) -> PoolResult<TxHash>;

    /// All pooled transactions.
    fn pool_transactions(&self) -> Vec<TransactionSignedEcRecovered>;

    /// A pooled transaction by hash.
    fn pool_transaction(&self, hash: TxHash) -> Option<TransactionSignedEcRecovered>;

    /// The next nonce of `address` as seen by the pool: the confirmed nonce plus the number of
    /// the address's pooled transactions that continue it.
    async fn pool_nonce(&self, address: Address) -> ProviderResult<u64>;

    /// Pending and queued counts.
    fn pool_stats(&self) -> PoolStats;

    /// The pool content keyed by sender.
    fn pool_content(&self) -> PoolContent;
}
