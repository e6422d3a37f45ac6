use async_trait::async_trait;
use jsonrpsee::core::RpcResult as Result;
use pocc_interfaces::{pool::TransactionsBySender, Backend};
use pocc_primitives::{Address, TransactionSignedEcRecovered, U256, U64};
use pocc_rpc_api::TxPoolApiServer;
use pocc_rpc_types::{
    txpool::{TxpoolContent, TxpoolContentFrom, TxpoolInspect, TxpoolInspectSummary, TxpoolStatus},
    Transaction,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::trace;

/// `txpool` API implementation.
///
/// This type provides the functionality for handling `txpool` related requests.
pub struct TxPoolApi<B> {
    /// The node whose pool is served
    backend: Arc<B>,
}

impl<B> TxPoolApi<B> {
    /// Creates a new instance of `TxPoolApi`.
    pub const fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

impl<B> Clone for TxPoolApi<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend) }
    }
}

/// Converts every transaction of a sender-grouped pool section, keying by decimal nonce.
fn convert<T>(
    section: TransactionsBySender,
    f: impl Fn(&TransactionSignedEcRecovered) -> T,
) -> BTreeMap<Address, BTreeMap<String, T>> {
    section
        .into_iter()
        .map(|(sender, txs)| {
            let txs = txs.iter().map(|(nonce, tx)| (nonce.to_string(), f(tx))).collect();
            (sender, txs)
        })
        .collect()
}

fn inspect_summary(tx: &TransactionSignedEcRecovered) -> TxpoolInspectSummary {
    TxpoolInspectSummary {
        to: tx.to(),
        value: tx.value,
        gas: U256::from(tx.gas_limit),
        gas_price: U256::from(tx.gas_price),
    }
}

impl<B: Backend> TxPoolApi<B> {
    fn content(&self) -> TxpoolContent {
        let content = self.backend.pool_content();
        TxpoolContent {
            pending: convert(content.pending, Transaction::from_recovered),
            queued: convert(content.queued, Transaction::from_recovered),
        }
    }
}

#[async_trait]
impl<B: Backend> TxPoolApiServer for TxPoolApi<B> {
    /// Returns the number of transactions currently pending for inclusion in the next block(s), as
    /// well as the ones that are being scheduled for future execution only.
    /// Ref: [Here](https://geth.ethereum.org/docs/rpc/ns-txpool#txpool_status)
    ///
    /// Handler for `txpool_status`
    async fn txpool_status(&self) -> Result<TxpoolStatus> {
        trace!(target: "rpc::txpool", "Serving txpool_status");
        let stats = self.backend.pool_stats();
        Ok(TxpoolStatus { pending: U64::from(stats.pending), queued: U64::from(stats.queued) })
    }

    /// Returns a summary of all the transactions currently pending for inclusion in the next
    /// block(s), as well as the ones that are being scheduled for future execution only.
    ///
    /// See [here](https://geth.ethereum.org/docs/rpc/ns-txpool#txpool_inspect) for more details
    ///
    /// Handler for `txpool_inspect`
    async fn txpool_inspect(&self) -> Result<TxpoolInspect> {
        trace!(target: "rpc::txpool", "Serving txpool_inspect");
        let content = self.backend.pool_content();
        Ok(TxpoolInspect {
            pending: convert(content.pending, inspect_summary),
            queued: convert(content.queued, inspect_summary),
        })
    }

    /// Retrieves the transactions contained within the txpool, returning pending as well as queued
    /// transactions of this address, grouped by nonce.
    ///
    /// See [here](https://geth.ethereum.org/docs/rpc/ns-txpool#txpool_contentFrom) for more details
    /// Handler for `txpool_contentFrom`
    async fn txpool_content_from(&self, from: Address) -> Result<TxpoolContentFrom> {
        trace!(target: "rpc::txpool", ?from, "Serving txpool_contentFrom");
        Ok(self.content().remove_from(&from))
    }

    /// Returns the details of all transactions currently pending for inclusion in the next
    /// block(s), as well as the ones that are being scheduled for future execution only.
    ///
    /// See [here](https://geth.ethereum.org/docs/rpc/ns-txpool#txpool_content) for more details
    /// Handler for `txpool_content`
    async fn txpool_content(&self) -> Result<TxpoolContent> {
        trace!(target: "rpc::txpool", "Serving txpool_content");
        Ok(self.content())
    }
}

impl<B> std::fmt::Debug for TxPoolApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxPoolApi").finish_non_exhaustive()
    }
}
