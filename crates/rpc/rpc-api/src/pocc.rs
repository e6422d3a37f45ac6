use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use pocc_primitives::{
    Address, BlockNumberOrTag, BlockSummary, Bytes, Receipt, B256, U256, U64,
};
use pocc_rpc_types::{Block, CallRequest, Transaction, TransactionRequest};

/// Node meta rpc interface.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "pocc"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "pocc"))]
pub trait PoccApi {
    /// Returns a gas price likely to get a transaction included soon.
    #[method(name = "gasPrice")]
    async fn gas_price(&self) -> RpcResult<U256>;

    /// Returns the protocol version.
    #[method(name = "protocolVersion")]
    fn protocol_version(&self) -> RpcResult<U64>;

    /// Returns the chain ID used for transaction signing at the current head.
    #[method(name = "chainId")]
    fn chain_id(&self) -> RpcResult<Option<U64>>;
}

/// Chain and state read rpc interface.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "pocc"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "pocc"))]
pub trait BlockChainApi {
    /// Returns the number of the most recent block.
    #[method(name = "blockNumber")]
    fn block_number(&self) -> RpcResult<U64>;

    /// Returns the balance of the account of given address.
    #[method(name = "getBalance")]
    async fn balance(&self, address: Address, block: Option<BlockNumberOrTag>) -> RpcResult<U256>;

    /// Returns the value from a storage position at a given address
    #[method(name = "getStorageAt")]
    async fn storage_at(
        &self,
        address: Address,
        index: U256,
        block: Option<BlockNumberOrTag>,
    ) -> RpcResult<B256>;

    /// Returns code at a given address at given block number.
    #[method(name = "getCode")]
    async fn get_code(&self, address: Address, block: Option<BlockNumberOrTag>) -> RpcResult<Bytes>;

    /// Returns information about a block by number.
    #[method(name = "getBlockByNumber")]
    async fn block_by_number(
        &self,
        number: BlockNumberOrTag,
        full: bool,
    ) -> RpcResult<Option<Block>>;

    /// Returns information about a block by hash.
    #[method(name = "getBlockByHash")]
    async fn block_by_hash(&self, hash: B256, full: bool) -> RpcResult<Option<Block>>;

    /// Returns summaries of up to `count` canonical blocks, walking back from `start`.
    #[method(name = "getPocBlocks")]
    async fn poc_blocks(&self, start: BlockNumberOrTag, count: U64)
        -> RpcResult<Vec<BlockSummary>>;

    /// Returns the receipts of the block with the given hash.
    #[method(name = "getBlockReceipts")]
    async fn block_receipts(&self, hash: B256) -> RpcResult<Vec<Receipt>>;

    /// Executes a new message call immediately without creating a transaction on the block chain.
    #[method(name = "call")]
    async fn call(&self, request: CallRequest, block: Option<BlockNumberOrTag>) -> RpcResult<Bytes>;

    /// Generates and returns an estimate of how much gas is necessary to allow the transaction to
    /// complete against the pending block.
    #[method(name = "estimateGas")]
    async fn estimate_gas(&self, request: CallRequest) -> RpcResult<U64>;
}

/// Transaction rpc interface.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "pocc"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "pocc"))]
pub trait TransactionPoolApi {
    /// Returns the number of transactions sent from an address at given block number.
    #[method(name = "getTransactionCount")]
    async fn transaction_count(
        &self,
        address: Address,
        block: Option<BlockNumberOrTag>,
    ) -> RpcResult<U64>;

    /// Returns the information about a pooled transaction requested by transaction hash.
    #[method(name = "getTransactionByHash")]
    async fn transaction_by_hash(&self, hash: B256) -> RpcResult<Option<Transaction>>;

    /// Returns information about a transaction by block number and transaction index position.
    #[method(name = "getTransactionByBlockNumberAndIndex")]
    async fn transaction_by_block_number_and_index(
        &self,
        number: BlockNumberOrTag,
        index: U64,
    ) -> RpcResult<Option<Transaction>>;

    /// Returns information about a transaction by block hash and transaction index position.
    #[method(name = "getTransactionByBlockHashAndIndex")]
    async fn transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: U64,
    ) -> RpcResult<Option<Transaction>>;

    /// Returns the number of transactions in a block matching the given block number.
    #[method(name = "getBlockTransactionCountByNumber")]
    async fn block_transaction_count_by_number(
        &self,
        number: BlockNumberOrTag,
    ) -> RpcResult<Option<U64>>;

    /// Returns the number of transactions in a block from a block matching the given block hash.
    #[method(name = "getBlockTransactionCountByHash")]
    async fn block_transaction_count_by_hash(&self, hash: B256) -> RpcResult<Option<U64>>;

    /// Returns the EIP-2718 encoded bytes of a pooled transaction.
    #[method(name = "getRawTransactionByHash")]
    async fn raw_transaction_by_hash(&self, hash: B256) -> RpcResult<Option<Bytes>>;

    /// Returns the pooled transactions sent from one of the node's managed accounts.
    #[method(name = "pendingTransactions")]
    async fn pending_transactions(&self) -> RpcResult<Vec<Transaction>>;

    /// Signs the transaction with the unlocked sender key and submits it.
    #[method(name = "sendTransaction")]
    async fn send_transaction(&self, request: TransactionRequest) -> RpcResult<B256>;

    /// Submits an already signed transaction.
    #[method(name = "sendRawTransaction")]
    async fn send_raw_transaction(&self, bytes: Bytes) -> RpcResult<B256>;

    /// Signs `data` with the prefixed message hash using the unlocked key of `address`.
    #[method(name = "sign")]
    async fn sign(&self, address: Address, data: Bytes) -> RpcResult<Bytes>;
}

/// Account rpc interface.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "pocc"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "pocc"))]
pub trait AccountApi {
    /// Returns a list of addresses owned by the node.
    #[method(name = "accounts")]
    fn accounts(&self) -> RpcResult<Vec<Address>>;
}
