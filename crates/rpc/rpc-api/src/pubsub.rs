//! `pocc_` RPC API for pubsub subscription.

use jsonrpsee::proc_macros::rpc;
use pocc_rpc_types::pubsub::{SubscriptionKind, SubscriptionResult};

/// Pocc pub-sub rpc interface.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "pocc"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "pocc"))]
pub trait PoccPubSubApi {
    /// Create a pocc subscription for the given kind.
    #[subscription(
        name = "subscribe" => "subscription",
        unsubscribe = "unsubscribe",
        item = SubscriptionResult
    )]
    async fn subscribe(&self, kind: SubscriptionKind) -> jsonrpsee::core::SubscriptionResult;
}
