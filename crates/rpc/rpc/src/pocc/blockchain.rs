//! Chain and state reads, message calls and gas estimation.

use crate::pocc::{
    error::{PoccApiError, PoccResult, RevertError},
    ProviderResultExt,
};
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use pocc_interfaces::{Backend, EvmError, ExecutionResult, Message};
use pocc_primitives::{
    Address, BlockHash, BlockNumberOrTag, BlockSummary, Bytes, Receipt, B256, MIN_TRANSACTION_GAS,
    U256, U64,
};
use pocc_rpc_api::BlockChainApiServer;
use pocc_rpc_types::{Block, CallRequest};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// The default gas limit for `pocc_call` and `pocc_estimateGas`.
pub const RPC_DEFAULT_GAS_CAP: u64 = 50_000_000;

/// The default time a single `pocc_call` may run.
pub const DEFAULT_EVM_TIMEOUT: Duration = Duration::from_secs(5);

/// `pocc` API for chain and state reads and message calls.
///
/// Reads of an unknown block fail with a not-found error; the block getters answer `null`
/// instead.
pub struct BlockChainApi<B> {
    inner: Arc<BlockChainApiInner<B>>,
}

struct BlockChainApiInner<B> {
    backend: Arc<B>,
    /// Upper bound of the gas limit of a call
    gas_cap: u64,
    /// Upper bound of the running time of a call
    evm_timeout: Duration,
}

impl<B> BlockChainApi<B> {
    /// Creates a new instance. A `gas_cap` of zero leaves the gas of calls unbounded.
    pub fn new(backend: Arc<B>, gas_cap: u64, evm_timeout: Duration) -> Self {
        Self { inner: Arc::new(BlockChainApiInner { backend, gas_cap, evm_timeout }) }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Returns the configured gas cap.
    pub fn gas_cap(&self) -> u64 {
        self.inner.gas_cap
    }
}

impl<B> Clone for BlockChainApi<B> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<B: Backend> BlockChainApi<B> {
    /// Returns the number of the canonical head.
    pub fn block_number(&self) -> u64 {
        self.backend().current_header().number
    }

    /// Returns the balance of `address` at the given block.
    pub async fn balance(&self, address: Address, at: BlockNumberOrTag) -> PoccResult<U256> {
        let (state, _) = self.backend().state_and_header_by_number(at).await?;
        Ok(state.balance(address)?)
    }

    /// Returns the storage slot of `address` at the given block.
    pub async fn storage_at(
        &self,
        address: Address,
        index: U256,
        at: BlockNumberOrTag,
    ) -> PoccResult<B256> {
        let (state, _) = self.backend().state_and_header_by_number(at).await?;
        let value = state.storage(address, B256::from(index))?;
        Ok(B256::from(value))
    }

    /// Returns the code deployed at `address` at the given block.
    pub async fn get_code(&self, address: Address, at: BlockNumberOrTag) -> PoccResult<Bytes> {
        let (state, _) = self.backend().state_and_header_by_number(at).await?;
        Ok(state.code(address)?)
    }

    /// Returns the block with the given number, `None` if it is unknown.
    pub async fn block_by_number(
        &self,
        number: BlockNumberOrTag,
        full: bool,
    ) -> PoccResult<Option<Block>> {
        let Some(block) = self.backend().block_by_number(number).await.optional()? else {
            return Ok(None)
        };
        if number.is_pending() {
            return Ok(Some(Block::from_block(&block, None, None, full)?))
        }
        self.rpc_block(&block, block.hash_slow(), full).await.map(Some)
    }

    /// Returns the block with the given hash, `None` if it is unknown.
    pub async fn block_by_hash(&self, hash: BlockHash, full: bool) -> PoccResult<Option<Block>> {
        let Some(block) = self.backend().block_by_hash(hash).await.optional()? else {
            return Ok(None)
        };
        self.rpc_block(&block, hash, full).await.map(Some)
    }

    async fn rpc_block(
        &self,
        block: &pocc_primitives::Block,
        hash: BlockHash,
        full: bool,
    ) -> PoccResult<Block> {
        let total_difficulty = self.backend().total_difficulty(hash).await.optional()?;
        Ok(Block::from_block(block, Some(hash), total_difficulty, full)?)
    }

    /// Returns summaries of up to `count` canonical blocks, walking back from `start`.
    pub async fn poc_blocks(
        &self,
        start: BlockNumberOrTag,
        count: u64,
    ) -> PoccResult<Vec<BlockSummary>> {
        Ok(self.backend().poc_blocks(start, count).await?)
    }

    /// Returns the receipts of the block with the given hash.
    pub async fn block_receipts(&self, hash: BlockHash) -> PoccResult<Vec<Receipt>> {
        Ok(self.backend().receipts(hash).await?)
    }

    /// Executes the call request at the given block and returns its output.
    ///
    /// A revert fails with [`PoccApiError::Revert`] carrying the revert payload, an exceptional
    /// halt with [`PoccApiError::ExecutionFailed`].
    pub async fn call(&self, request: CallRequest, at: BlockNumberOrTag) -> PoccResult<Bytes> {
        match self.transact(request, at, self.gas_cap()).await? {
            ExecutionResult::Success { output, .. } => Ok(output),
            ExecutionResult::Revert { output, .. } => Err(RevertError::new(output).into()),
            ExecutionResult::Halt { reason, .. } => Err(PoccApiError::ExecutionFailed(reason)),
        }
    }

    /// Estimates the gas the call request needs to succeed against the pending block.
    ///
    /// Binary searches the lowest gas limit at which the call does not fail, up to the gas of the
    /// request, or the pending block's gas limit if absent, capped by the gas cap.
    pub async fn estimate_gas(&self, request: CallRequest) -> PoccResult<u64> {
        let at = BlockNumberOrTag::Pending;

        let mut lo = MIN_TRANSACTION_GAS - 1;
        let mut hi = match request.gas.map(|gas| gas.to::<u64>()) {
            Some(gas) if gas >= MIN_TRANSACTION_GAS => gas,
            _ => self.backend().header_by_number(at).await?.gas_limit,
        };
        if self.gas_cap() != 0 && hi > self.gas_cap() {
            hi = self.gas_cap();
        }
        let cap = hi;

        while lo + 1 < hi {
            let mid = lo + (hi - lo) / 2;
            if self.executable(&request, at, mid).await? {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        if hi == cap {
            // the search never ran the cap itself
            let mut request = request;
            request.gas = Some(U64::from(cap));
            return match self.transact(request, at, cap).await {
                Ok(ExecutionResult::Success { .. }) => Ok(cap),
                Ok(ExecutionResult::Revert { output, .. }) => Err(RevertError::new(output).into()),
                Ok(ExecutionResult::Halt { .. }) |
                Err(PoccApiError::Evm(EvmError::InsufficientFunds)) => {
                    Err(PoccApiError::GasRequiredExceedsAllowance(cap))
                }
                Err(err) => Err(err),
            }
        }
        Ok(hi)
    }

    /// Returns `true` if the request completes with the given gas limit.
    ///
    /// Execution outcomes count as failures; failures to execute at all are returned.
    async fn executable(
        &self,
        request: &CallRequest,
        at: BlockNumberOrTag,
        gas: u64,
    ) -> PoccResult<bool> {
        let mut request = request.clone();
        request.gas = Some(U64::from(gas));
        match self.transact(request, at, self.gas_cap()).await {
            Ok(result) => Ok(result.is_success()),
            Err(PoccApiError::Evm(EvmError::InsufficientFunds)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Applies the call defaults to the request.
    ///
    /// The sender defaults to the first managed account, else the zero address. The gas defaults
    /// to `gas_cap` and never exceeds it. Price and value default to zero.
    fn message(&self, request: CallRequest, gas_cap: u64) -> PoccResult<Message> {
        let data = request.input_data()?.unwrap_or_default();
        let from = request.from.unwrap_or_else(|| {
            self.backend().account_manager().accounts().first().copied().unwrap_or_default()
        });
        let mut gas_limit = request.gas.map(|gas| gas.to::<u64>()).unwrap_or(u64::MAX / 2);
        if gas_cap != 0 && gas_limit > gas_cap {
            debug!(target: "rpc::pocc", requested = gas_limit, cap = gas_cap, "Caller gas above allowance, capping");
            gas_limit = gas_cap;
        }

        Ok(Message {
            from,
            to: request.to,
            gas_limit,
            gas_price: request.gas_price.unwrap_or_default(),
            value: request.value.unwrap_or_default(),
            data,
        })
    }

    /// Executes the request on the state of the given block and discards all changes.
    ///
    /// The interpreter runs on a blocking task under the configured timeout. It is interrupted
    /// when the timeout elapses or this future is dropped, and released exactly once in every
    /// case.
    async fn transact(
        &self,
        request: CallRequest,
        at: BlockNumberOrTag,
        gas_cap: u64,
    ) -> PoccResult<ExecutionResult> {
        let (state, header) = self.backend().state_and_header_by_number(at).await?;
        let msg = self.message(request, gas_cap)?;

        let cancel = CancellationToken::new();
        let mut evm = self.backend().evm(msg, state, &header, cancel.clone()).await?;
        let _cancel_on_drop = cancel.clone().drop_guard();

        let task = tokio::task::spawn_blocking(move || {
            let result = evm.transact();
            (result, evm.release())
        });

        let timeout = self.inner.evm_timeout;
        let (result, released) = match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined.map_err(|_| PoccApiError::InternalBlockingTaskError)?,
            Err(_) => {
                cancel.cancel();
                return Err(PoccApiError::ExecutionTimedOut(timeout))
            }
        };

        // failed state reads surface before the execution outcome
        released?;
        Ok(result?)
    }
}

#[async_trait]
impl<B: Backend> BlockChainApiServer for BlockChainApi<B> {
    /// Handler for: `pocc_blockNumber`
    fn block_number(&self) -> RpcResult<U64> {
        trace!(target: "rpc::pocc", "Serving pocc_blockNumber");
        Ok(U64::from(Self::block_number(self)))
    }

    /// Handler for: `pocc_getBalance`
    async fn balance(&self, address: Address, block: Option<BlockNumberOrTag>) -> RpcResult<U256> {
        trace!(target: "rpc::pocc", ?address, ?block, "Serving pocc_getBalance");
        Ok(Self::balance(self, address, block.unwrap_or_default()).await?)
    }

    /// Handler for: `pocc_getStorageAt`
    async fn storage_at(
        &self,
        address: Address,
        index: U256,
        block: Option<BlockNumberOrTag>,
    ) -> RpcResult<B256> {
        trace!(target: "rpc::pocc", ?address, ?index, ?block, "Serving pocc_getStorageAt");
        Ok(Self::storage_at(self, address, index, block.unwrap_or_default()).await?)
    }

    /// Handler for: `pocc_getCode`
    async fn get_code(&self, address: Address, block: Option<BlockNumberOrTag>) -> RpcResult<Bytes> {
        trace!(target: "rpc::pocc", ?address, ?block, "Serving pocc_getCode");
        Ok(Self::get_code(self, address, block.unwrap_or_default()).await?)
    }

    /// Handler for: `pocc_getBlockByNumber`
    async fn block_by_number(
        &self,
        number: BlockNumberOrTag,
        full: bool,
    ) -> RpcResult<Option<Block>> {
        trace!(target: "rpc::pocc", ?number, ?full, "Serving pocc_getBlockByNumber");
        Ok(Self::block_by_number(self, number, full).await?)
    }

    /// Handler for: `pocc_getBlockByHash`
    async fn block_by_hash(&self, hash: B256, full: bool) -> RpcResult<Option<Block>> {
        trace!(target: "rpc::pocc", ?hash, ?full, "Serving pocc_getBlockByHash");
        Ok(Self::block_by_hash(self, hash, full).await?)
    }

    /// Handler for: `pocc_getPocBlocks`
    async fn poc_blocks(
        &self,
        start: BlockNumberOrTag,
        count: U64,
    ) -> RpcResult<Vec<BlockSummary>> {
        trace!(target: "rpc::pocc", ?start, ?count, "Serving pocc_getPocBlocks");
        Ok(Self::poc_blocks(self, start, count.to()).await?)
    }

    /// Handler for: `pocc_getBlockReceipts`
    async fn block_receipts(&self, hash: B256) -> RpcResult<Vec<Receipt>> {
        trace!(target: "rpc::pocc", ?hash, "Serving pocc_getBlockReceipts");
        Ok(Self::block_receipts(self, hash).await?)
    }

    /// Handler for: `pocc_call`
    async fn call(&self, request: CallRequest, block: Option<BlockNumberOrTag>) -> RpcResult<Bytes> {
        trace!(target: "rpc::pocc", ?request, ?block, "Serving pocc_call");
        Ok(Self::call(self, request, block.unwrap_or_default()).await?)
    }

    /// Handler for: `pocc_estimateGas`
    async fn estimate_gas(&self, request: CallRequest) -> RpcResult<U64> {
        trace!(target: "rpc::pocc", ?request, "Serving pocc_estimateGas");
        Ok(U64::from(Self::estimate_gas(self, request).await?))
    }
}

impl<B> std::fmt::Debug for BlockChainApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockChainApi")
            .field("gas_cap", &self.inner.gas_cap)
            .field("evm_timeout", &self.inner.evm_timeout)
            .finish_non_exhaustive()
    }
}
