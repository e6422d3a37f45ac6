//! Transaction lookups and submission.

use crate::{
    nonce_lock::AddrLocker,
    pocc::{
        error::{PoccApiError, PoccResult},
        signer::hash_message,
        ProviderResultExt,
    },
};
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use pocc_interfaces::{Backend, PoolError};
use pocc_primitives::{
    Address, Block as PrimitiveBlock, BlockHash, BlockNumberOrTag, Bytes, Transaction, TxHash,
    TxKind, TransactionSigned, TransactionSignedEcRecovered, B256, U256, U64,
};
use pocc_rpc_api::TransactionPoolApiServer;
use pocc_rpc_types::{Transaction as RpcTransaction, TransactionRequest};
use std::sync::Arc;
use tracing::{info, trace};

/// Gas limit of a submitted transaction that does not set one.
pub const DEFAULT_TX_GAS: u64 = 90_000;

/// `pocc` API for transaction lookups and submission.
///
/// Every submission of a locally signed transaction holds the sender's lock of the shared
/// [`AddrLocker`] from nonce selection to pool admission.
pub struct TransactionPoolApi<B> {
    backend: Arc<B>,
    locker: AddrLocker,
}

impl<B> TransactionPoolApi<B> {
    /// Creates a new instance sharing the given locker.
    pub const fn new(backend: Arc<B>, locker: AddrLocker) -> Self {
        Self { backend, locker }
    }

    /// Returns the locker serializing submissions.
    pub const fn locker(&self) -> &AddrLocker {
        &self.locker
    }
}

impl<B> Clone for TransactionPoolApi<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend), locker: self.locker.clone() }
    }
}

impl<B: Backend> TransactionPoolApi<B> {
    /// Returns the nonce of `address` at the given block. For the pending block this is the pool
    /// nonce, which counts the address's pooled transactions.
    pub async fn transaction_count(&self, address: Address, at: BlockNumberOrTag) -> PoccResult<u64> {
        if at.is_pending() {
            return Ok(self.backend.pool_nonce(address).await?)
        }
        let (state, _) = self.backend.state_and_header_by_number(at).await?;
        Ok(state.nonce(address)?)
    }

    /// Returns the pooled transaction with the given hash.
    pub fn transaction_by_hash(&self, hash: TxHash) -> Option<RpcTransaction> {
        self.backend.pool_transaction(hash).map(|tx| RpcTransaction::from_recovered(&tx))
    }

    /// Returns the transaction at `index` of the block with the given number.
    pub async fn transaction_by_block_number_and_index(
        &self,
        number: BlockNumberOrTag,
        index: usize,
    ) -> PoccResult<Option<RpcTransaction>> {
        let Some(block) = self.backend.block_by_number(number).await.optional()? else {
            return Ok(None)
        };
        let hash = (!number.is_pending()).then(|| block.hash_slow());
        transaction_at(&block, hash, index)
    }

    /// Returns the transaction at `index` of the block with the given hash.
    pub async fn transaction_by_block_hash_and_index(
        &self,
        hash: BlockHash,
        index: usize,
    ) -> PoccResult<Option<RpcTransaction>> {
        let Some(block) = self.backend.block_by_hash(hash).await.optional()? else {
            return Ok(None)
        };
        transaction_at(&block, Some(hash), index)
    }

    /// Returns the number of transactions of the block with the given number.
    pub async fn block_transaction_count_by_number(
        &self,
        number: BlockNumberOrTag,
    ) -> PoccResult<Option<usize>> {
        let block = self.backend.block_by_number(number).await.optional()?;
        Ok(block.map(|block| block.body.len()))
    }

    /// Returns the number of transactions of the block with the given hash.
    pub async fn block_transaction_count_by_hash(
        &self,
        hash: BlockHash,
    ) -> PoccResult<Option<usize>> {
        let block = self.backend.block_by_hash(hash).await.optional()?;
        Ok(block.map(|block| block.body.len()))
    }

    /// Returns the encoded pooled transaction with the given hash.
    pub fn raw_transaction_by_hash(&self, hash: TxHash) -> Option<Bytes> {
        self.backend.pool_transaction(hash).map(|tx| tx.envelope_encoded())
    }

    /// Returns the pooled transactions sent from managed accounts.
    pub fn pending_transactions(&self) -> Vec<RpcTransaction> {
        let accounts = self.backend.account_manager().accounts();
        self.backend
            .pool_transactions()
            .iter()
            .filter(|tx| accounts.contains(&tx.signer()))
            .map(RpcTransaction::from_recovered)
            .collect()
    }

    /// Fills in the request, signs it with the unlocked key of the sender and submits it.
    pub async fn send_transaction(&self, request: TransactionRequest) -> PoccResult<TxHash> {
        let from = request.from;
        let _guard = self.locker.lock_addr(from).await;

        let tx = fill_transaction(&*self.backend, request).await?;
        let signed = self.backend.account_manager().sign_transaction(from, tx)?;
        let recovered = TransactionSignedEcRecovered::from_signed_transaction(signed, from);
        submit_transaction(&*self.backend, recovered).await
    }

    /// Decodes and submits a signed transaction.
    ///
    /// No address is locked: the nonce was chosen by whoever signed it.
    pub async fn send_raw_transaction(&self, bytes: Bytes) -> PoccResult<TxHash> {
        let signed = TransactionSigned::decode_enveloped(&bytes)
            .map_err(|_| PoccApiError::FailedToDecodeSignedTransaction)?;
        let recovered = signed.into_ecrecovered().ok_or(PoccApiError::InvalidTransactionSignature)?;
        submit_transaction(&*self.backend, recovered).await
    }

    /// Signs the prefixed message hash of `data` with the unlocked key of `address`.
    pub fn sign(&self, address: Address, data: &[u8]) -> PoccResult<Bytes> {
        let signature = self.backend.account_manager().sign_hash(address, hash_message(data))?;
        Ok(signature.to_rsv_bytes().to_vec().into())
    }
}

/// Converts the transaction at `index` of `block`. `hash` is `None` for the pending block.
fn transaction_at(
    block: &PrimitiveBlock,
    hash: Option<BlockHash>,
    index: usize,
) -> PoccResult<Option<RpcTransaction>> {
    let Some(tx) = block.body.get(index) else { return Ok(None) };
    let signer = tx.recover_signer().ok_or(PoccApiError::InvalidTransactionSignature)?;
    let tx = TransactionSignedEcRecovered::from_signed_transaction(tx.clone(), signer);
    Ok(Some(match hash {
        Some(hash) => {
            RpcTransaction::from_recovered_with_block_context(&tx, hash, block.number(), index)
        }
        None => RpcTransaction::from_recovered(&tx),
    }))
}

/// Turns a request into an unsigned transaction.
///
/// Gas defaults to [`DEFAULT_TX_GAS`], the price to the suggested price, the value to zero and the
/// nonce to the sender's pool nonce. An explicit nonce below the pool nonce is refused. Callers
/// hold the sender's address lock.
pub(crate) async fn fill_transaction<B: Backend>(
    backend: &B,
    request: TransactionRequest,
) -> PoccResult<Transaction> {
    let input = request.input_data()?.unwrap_or_default();
    if request.to.is_none() && input.is_empty() {
        return Err(PoccApiError::ContractCreationWithoutData)
    }

    let gas_price = match request.gas_price {
        Some(price) => price,
        None => backend.suggest_price().await?,
    };
    let gas_price = u128::try_from(gas_price)
        .map_err(|_| PoccApiError::InvalidParams("gas price exceeds 128 bits".to_string()))?;

    let pool_nonce = backend.pool_nonce(request.from).await?;
    let nonce = match request.nonce.map(|nonce| nonce.to::<u64>()) {
        Some(nonce) if nonce < pool_nonce => {
            return Err(PoolError::NonceTooLow { tx_nonce: nonce, state_nonce: pool_nonce }.into())
        }
        Some(nonce) => nonce,
        None => pool_nonce,
    };

    let head = backend.current_header().number;
    Ok(Transaction {
        chain_id: backend.chain_config().signing_chain_id(head),
        nonce,
        gas_price,
        gas_limit: request.gas.map(|gas| gas.to::<u64>()).unwrap_or(DEFAULT_TX_GAS),
        to: request.to.map_or(TxKind::Create, TxKind::Call),
        value: request.value.unwrap_or(U256::ZERO),
        input,
    })
}

/// Submits a signed transaction to the pool and logs it.
pub(crate) async fn submit_transaction<B: Backend>(
    backend: &B,
    tx: TransactionSignedEcRecovered,
) -> PoccResult<TxHash> {
    let from = tx.signer();
    let nonce = tx.nonce;
    let to = tx.to();

    let hash = backend.send_tx(tx).await?;
    match to {
        Some(to) => {
            info!(target: "rpc::pocc", %hash, %from, nonce, %to, "Submitted transaction")
        }
        None => {
            let contract = from.create(nonce);
            info!(target: "rpc::pocc", %hash, %from, nonce, %contract, "Submitted contract creation")
        }
    }
    Ok(hash)
}

#[async_trait]
impl<B: Backend> TransactionPoolApiServer for TransactionPoolApi<B> {
    /// Handler for: `pocc_getTransactionCount`
    async fn transaction_count(
        &self,
        address: Address,
        block: Option<BlockNumberOrTag>,
    ) -> RpcResult<U64> {
        trace!(target: "rpc::pocc", ?address, ?block, "Serving pocc_getTransactionCount");
        Ok(U64::from(Self::transaction_count(self, address, block.unwrap_or_default()).await?))
    }

    /// Handler for: `pocc_getTransactionByHash`
    async fn transaction_by_hash(&self, hash: B256) -> RpcResult<Option<RpcTransaction>> {
        trace!(target: "rpc::pocc", ?hash, "Serving pocc_getTransactionByHash");
        Ok(Self::transaction_by_hash(self, hash))
    }

    /// Handler for: `pocc_getTransactionByBlockNumberAndIndex`
    async fn transaction_by_block_number_and_index(
        &self,
        number: BlockNumberOrTag,
        index: U64,
    ) -> RpcResult<Option<RpcTransaction>> {
        trace!(target: "rpc::pocc", ?number, ?index, "Serving pocc_getTransactionByBlockNumberAndIndex");
        Ok(Self::transaction_by_block_number_and_index(self, number, index.to()).await?)
    }

    /// Handler for: `pocc_getTransactionByBlockHashAndIndex`
    async fn transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: U64,
    ) -> RpcResult<Option<RpcTransaction>> {
        trace!(target: "rpc::pocc", ?hash, ?index, "Serving pocc_getTransactionByBlockHashAndIndex");
        Ok(Self::transaction_by_block_hash_and_index(self, hash, index.to()).await?)
    }

    /// Handler for: `pocc_getBlockTransactionCountByNumber`
    async fn block_transaction_count_by_number(
        &self,
        number: BlockNumberOrTag,
    ) -> RpcResult<Option<U64>> {
        trace!(target: "rpc::pocc", ?number, "Serving pocc_getBlockTransactionCountByNumber");
        Ok(Self::block_transaction_count_by_number(self, number).await?.map(U64::from))
    }

    /// Handler for: `pocc_getBlockTransactionCountByHash`
    async fn block_transaction_count_by_hash(&self, hash: B256) -> RpcResult<Option<U64>> {
        trace!(target: "rpc::pocc", ?hash, "Serving pocc_getBlockTransactionCountByHash");
        Ok(Self::block_transaction_count_by_hash(self, hash).await?.map(U64::from))
    }

    /// Handler for: `pocc_getRawTransactionByHash`
    async fn raw_transaction_by_hash(&self, hash: B256) -> RpcResult<Option<Bytes>> {
        trace!(target: "rpc::pocc", ?hash, "Serving pocc_getRawTransactionByHash");
        Ok(Self::raw_transaction_by_hash(self, hash))
    }

    /// Handler for: `pocc_pendingTransactions`
    async fn pending_transactions(&self) -> RpcResult<Vec<RpcTransaction>> {
        trace!(target: "rpc::pocc", "Serving pocc_pendingTransactions");
        Ok(Self::pending_transactions(self))
    }

    /// Handler for: `pocc_sendTransaction`
    async fn send_transaction(&self, request: TransactionRequest) -> RpcResult<B256> {
        trace!(target: "rpc::pocc", ?request, "Serving pocc_sendTransaction");
        Ok(Self::send_transaction(self, request).await?)
    }

    /// Handler for: `pocc_sendRawTransaction`
    async fn send_raw_transaction(&self, bytes: Bytes) -> RpcResult<B256> {
        trace!(target: "rpc::pocc", ?bytes, "Serving pocc_sendRawTransaction");
        Ok(Self::send_raw_transaction(self, bytes).await?)
    }

    /// Handler for: `pocc_sign`
    async fn sign(&self, address: Address, data: Bytes) -> RpcResult<Bytes> {
        trace!(target: "rpc::pocc", ?address, ?data, "Serving pocc_sign");
        Ok(Self::sign(self, address, &data)?)
    }
}

impl<B> std::fmt::Debug for TransactionPoolApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionPoolApi").field("locker", &self.locker).finish_non_exhaustive()
    }
}
