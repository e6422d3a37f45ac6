//! `pocc_` `PubSub` RPC handler implementation

use crate::result::internal_rpc_err;
use futures::{
    stream::{self, BoxStream},
    Stream, StreamExt,
};
use jsonrpsee::{
    server::SubscriptionMessage, types::ErrorObject, PendingSubscriptionSink, SubscriptionSink,
};
use pocc_interfaces::Backend;
use pocc_primitives::TxHash;
use pocc_rpc_api::PoccPubSubApiServer;
use pocc_rpc_types::{
    pubsub::{SubscriptionKind, SubscriptionResult},
    Header,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

/// `pocc` pubsub RPC implementation.
///
/// This handles `pocc_subscribe` RPC calls. Every accepted subscription gets its own listener on
/// the backend's event feeds, so a slow client never holds back other subscribers.
pub struct PoccPubSub<B> {
    backend: Arc<B>,
}

// === impl PoccPubSub ===

impl<B> PoccPubSub<B> {
    /// Creates a new, shareable instance.
    ///
    /// Subscription tasks are spawned via [`tokio::task::spawn`]
    pub const fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

impl<B> Clone for PoccPubSub<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend) }
    }
}

impl<B: Backend> PoccPubSub<B> {
    /// Returns a stream that yields the header of every new canonical head.
    pub fn new_headers_stream(&self) -> impl Stream<Item = Header> + Unpin {
        self.backend.subscribe_chain_head_events().map(|event| {
            let hash = event.block.hash_slow();
            Header::from_primitive(&event.block.header, Some(hash))
        })
    }

    /// Returns a stream that yields the hash of every transaction admitted to the pool.
    pub fn pending_transaction_hashes_stream(&self) -> impl Stream<Item = TxHash> + Unpin {
        self.backend
            .subscribe_new_txs()
            .flat_map(|event| stream::iter(event.txs.into_iter().map(|tx| tx.hash())))
    }

    /// Returns the notification stream of the given subscription kind.
    ///
    /// The backend listener is registered when this is called, so nothing published afterwards
    /// is missed.
    pub fn subscription_stream(
        &self,
        kind: SubscriptionKind,
    ) -> BoxStream<'static, SubscriptionResult> {
        match kind {
            SubscriptionKind::NewHeads => self
                .new_headers_stream()
                .map(|header| SubscriptionResult::Header(Box::new(header)))
                .boxed(),
            SubscriptionKind::NewPendingTransactions => self
                .pending_transaction_hashes_stream()
                .map(SubscriptionResult::TransactionHash)
                .boxed(),
        }
    }
}

#[async_trait::async_trait]
impl<B: Backend> PoccPubSubApiServer for PoccPubSub<B> {
    /// Handler for `pocc_subscribe`
    async fn subscribe(
        &self,
        pending: PendingSubscriptionSink,
        kind: SubscriptionKind,
    ) -> jsonrpsee::core::SubscriptionResult {
        trace!(target: "rpc::pocc", ?kind, "Serving pocc_subscribe");
        let stream = self.subscription_stream(kind);
        let sink = pending.accept().await?;
        tokio::spawn(async move {
            if let Err(err) = pipe_from_stream(sink, stream).await {
                debug!(target: "rpc::pocc", ?err, ?kind, "Subscription closed with error");
            }
        });

        Ok(())
    }
}

/// Helper to convert a serde error into an [`ErrorObject`]
#[derive(Debug, thiserror::Error)]
#[error("Failed to serialize subscription item: {0}")]
pub struct SubscriptionSerializeError(#[from] serde_json::Error);

impl From<SubscriptionSerializeError> for ErrorObject<'static> {
    fn from(value: SubscriptionSerializeError) -> Self {
        internal_rpc_err(value.to_string())
    }
}

/// Pipes all stream items to the subscription sink.
async fn pipe_from_stream<T, St>(
    sink: SubscriptionSink,
    mut stream: St,
) -> Result<(), ErrorObject<'static>>
where
    St: Stream<Item = T> + Unpin,
    T: Serialize,
{
    loop {
        tokio::select! {
            _ = sink.closed() => {
                // connection dropped
                break Ok(())
            },
            maybe_item = stream.next() => {
                let Some(item) = maybe_item else {
                    // stream ended
                    break Ok(())
                };
                let msg = SubscriptionMessage::from_json(&item)
                    .map_err(SubscriptionSerializeError::from)?;

                if sink.send(msg).await.is_err() {
                    break Ok(())
                }
            }
        }
    }
}

impl<B> std::fmt::Debug for PoccPubSub<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoccPubSub").finish_non_exhaustive()
    }
}
