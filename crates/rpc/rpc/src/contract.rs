//! In-process contract access.
//!
//! [`ContractBackend`] is the surface contract bindings are written against: read code, call,
//! estimate gas and send transactions. [`LocalContractBackend`] serves it from the node's own API
//! objects instead of a network round trip.

use crate::{
    nonce_lock::AddrLocker,
    pocc::{
        error::PoccResult, BlockChainApi, PoccApi, TransactionPoolApi, DEFAULT_EVM_TIMEOUT,
        RPC_DEFAULT_GAS_CAP,
    },
};
use async_trait::async_trait;
use pocc_interfaces::Backend;
use pocc_primitives::{
    Address, BlockNumber, BlockNumberOrTag, Bytes, TransactionSigned, TxHash, U256, U64,
};
use pocc_rpc_types::CallRequest;
use std::sync::Arc;

/// A read-only contract invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMsg {
    /// Sender, the first managed account if absent
    pub from: Option<Address>,
    /// Callee, `None` runs `data` as init code
    pub to: Option<Address>,
    /// Gas limit
    pub gas: Option<u64>,
    /// Gas price
    pub gas_price: Option<U256>,
    /// Value transferred
    pub value: Option<U256>,
    /// Input data
    pub data: Bytes,
}

impl From<CallMsg> for CallRequest {
    fn from(msg: CallMsg) -> Self {
        Self {
            from: msg.from,
            to: msg.to,
            gas: msg.gas.map(U64::from),
            gas_price: msg.gas_price,
            value: msg.value,
            data: None,
            input: Some(msg.data),
        }
    }
}

/// Converts an optional height into a block tag, `None` meaning the latest block.
const fn to_block_number(number: Option<BlockNumber>) -> BlockNumberOrTag {
    match number {
        Some(number) => BlockNumberOrTag::Number(number),
        None => BlockNumberOrTag::Latest,
    }
}

/// What a contract binding needs from a node.
///
/// Execution outcomes such as a revert come back as [`PoccApiError::Revert`], distinct from
/// failures to reach the data.
///
/// [`PoccApiError::Revert`]: crate::pocc::error::PoccApiError::Revert
#[async_trait]
pub trait ContractBackend: Send + Sync {
    /// Returns the code at `contract` as of the given height, the latest block if `None`.
    async fn code_at(&self, contract: Address, number: Option<BlockNumber>) -> PoccResult<Bytes>;

    /// Returns the code at `contract` in the pending block.
    async fn pending_code_at(&self, contract: Address) -> PoccResult<Bytes>;

    /// Executes `msg` at the given height, the latest block if `None`, and returns its output.
    async fn call_contract(&self, msg: CallMsg, number: Option<BlockNumber>) -> PoccResult<Bytes>;

    /// Executes `msg` against the pending block.
    async fn pending_call_contract(&self, msg: CallMsg) -> PoccResult<Bytes>;

    /// Returns an upper bound of the gas `msg` needs.
    async fn estimate_gas(&self, msg: CallMsg) -> PoccResult<u64>;

    /// Returns the next nonce `account` should use, counting its pooled transactions.
    async fn pending_nonce_at(&self, account: Address) -> PoccResult<u64>;

    /// Returns a gas price likely to get a transaction included soon.
    async fn suggest_gas_price(&self) -> PoccResult<U256>;

    /// Submits a signed transaction.
    ///
    /// Nonce assignment is not serialized here: callers sharing one account coordinate among
    /// themselves.
    async fn send_transaction(&self, tx: &TransactionSigned) -> PoccResult<TxHash>;
}

/// [`ContractBackend`] backed by the node's `pocc` API objects.
pub struct LocalContractBackend<B> {
    pocc: PoccApi<B>,
    blockchain: BlockChainApi<B>,
    transactions: TransactionPoolApi<B>,
}

impl<B> LocalContractBackend<B> {
    /// Creates a backend with the default gas cap and execution timeout.
    ///
    /// It owns a locker of its own, separate from the one shared by the RPC services.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            pocc: PoccApi::new(Arc::clone(&backend)),
            blockchain: BlockChainApi::new(
                Arc::clone(&backend),
                RPC_DEFAULT_GAS_CAP,
                DEFAULT_EVM_TIMEOUT,
            ),
            transactions: TransactionPoolApi::new(backend, AddrLocker::new()),
        }
    }
}

#[async_trait]
impl<B: Backend> ContractBackend for LocalContractBackend<B> {
    async fn code_at(&self, contract: Address, number: Option<BlockNumber>) -> PoccResult<Bytes> {
        self.blockchain.get_code(contract, to_block_number(number)).await
    }

    async fn pending_code_at(&self, contract: Address) -> PoccResult<Bytes> {
        self.blockchain.get_code(contract, BlockNumberOrTag::Pending).await
    }

    async fn call_contract(&self, msg: CallMsg, number: Option<BlockNumber>) -> PoccResult<Bytes> {
        self.blockchain.call(msg.into(), to_block_number(number)).await
    }

    async fn pending_call_contract(&self, msg: CallMsg) -> PoccResult<Bytes> {
        self.blockchain.call(msg.into(), BlockNumberOrTag::Pending).await
    }

    async fn estimate_gas(&self, msg: CallMsg) -> PoccResult<u64> {
        self.blockchain.estimate_gas(msg.into()).await
    }

    async fn pending_nonce_at(&self, account: Address) -> PoccResult<u64> {
        self.transactions.transaction_count(account, BlockNumberOrTag::Pending).await
    }

    async fn suggest_gas_price(&self) -> PoccResult<U256> {
        self.pocc.gas_price().await
    }

    async fn send_transaction(&self, tx: &TransactionSigned) -> PoccResult<TxHash> {
        self.transactions.send_raw_transaction(tx.envelope_encoded()).await
    }
}

impl<B> std::fmt::Debug for LocalContractBackend<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalContractBackend").finish_non_exhaustive()
    }
}
