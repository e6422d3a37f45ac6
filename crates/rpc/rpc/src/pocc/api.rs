use crate::pocc::error::PoccApiError;
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use pocc_interfaces::Backend;
use pocc_primitives::{U256, U64};
use pocc_rpc_api::PoccApiServer;
use std::sync::Arc;
use tracing::trace;

/// `pocc` API for node information: gas price, protocol version and chain id.
pub struct PoccApi<B> {
    backend: Arc<B>,
}

impl<B> PoccApi<B> {
    /// Creates a new instance.
    pub const fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

impl<B> Clone for PoccApi<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend) }
    }
}

impl<B: Backend> PoccApi<B> {
    /// Returns a suggested gas price.
    pub async fn gas_price(&self) -> Result<U256, PoccApiError> {
        Ok(self.backend.suggest_price().await?)
    }

    /// Returns the chain id used for signing at the current head, `None` before replay
    /// protection activates.
    pub fn chain_id(&self) -> Option<u64> {
        let head = self.backend.current_header().number;
        self.backend.chain_config().signing_chain_id(head)
    }
}

#[async_trait]
impl<B: Backend> PoccApiServer for PoccApi<B> {
    /// Handler for: `pocc_gasPrice`
    async fn gas_price(&self) -> RpcResult<U256> {
        trace!(target: "rpc::pocc", "Serving pocc_gasPrice");
        Ok(Self::gas_price(self).await?)
    }

    /// Handler for: `pocc_protocolVersion`
    fn protocol_version(&self) -> RpcResult<U64> {
        trace!(target: "rpc::pocc", "Serving pocc_protocolVersion");
        Ok(U64::from(self.backend.protocol_version()))
    }

    /// Handler for: `pocc_chainId`
    fn chain_id(&self) -> RpcResult<Option<U64>> {
        trace!(target: "rpc::pocc", "Serving pocc_chainId");
        Ok(Self::chain_id(self).map(U64::from))
    }
}

impl<B> std::fmt::Debug for PoccApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoccApi").finish_non_exhaustive()
    }
}
