use crate::{pocc::error::PoccResult, result::ToRpcResult};
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use jsonrpsee_types::error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE};
use pocc_interfaces::{Backend, ProviderError};
use pocc_primitives::{Block, BlockNumber, BlockNumberOrTag, Bytes, U64};
use pocc_rpc_api::{DebugApiServer, PrivateDebugApiServer};
use std::sync::Arc;
use tracing::{info, trace};

/// `debug` API implementation.
///
/// This type provides the functionality for handling the public `debug` requests.
pub struct DebugApi<B> {
    backend: Arc<B>,
}

// === impl DebugApi ===

impl<B> DebugApi<B> {
    /// Create a new instance of the [DebugApi]
    pub const fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

impl<B> Clone for DebugApi<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend) }
    }
}

impl<B: Backend> DebugApi<B> {
    async fn canonical_block(&self, number: BlockNumber) -> PoccResult<Arc<Block>> {
        Ok(self.backend.block_by_number(BlockNumberOrTag::Number(number)).await?)
    }

    /// Returns the RLP encoding of the canonical block at `number`.
    pub async fn block_rlp(&self, number: BlockNumber) -> PoccResult<Bytes> {
        let block = self.canonical_block(number).await?;
        Ok(alloy_rlp::encode(&*block).into())
    }

    /// Returns a human readable dump of the canonical block at `number`.
    pub async fn print_block(&self, number: BlockNumber) -> PoccResult<String> {
        let block = self.canonical_block(number).await?;
        Ok(format!("{block:#?}"))
    }
}

#[async_trait]
impl<B: Backend> DebugApiServer for DebugApi<B> {
    /// Handler for `debug_getBlockRlp`
    async fn get_block_rlp(&self, number: U64) -> RpcResult<Bytes> {
        trace!(target: "rpc::debug", ?number, "Serving debug_getBlockRlp");
        Ok(Self::block_rlp(self, number.to()).await?)
    }

    /// Handler for `debug_printBlock`
    async fn print_block(&self, number: U64) -> RpcResult<String> {
        trace!(target: "rpc::debug", ?number, "Serving debug_printBlock");
        Ok(Self::print_block(self, number.to()).await?)
    }
}

impl<B> std::fmt::Debug for DebugApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugApi").finish_non_exhaustive()
    }
}

/// Private `debug` API implementation: chain manipulation.
pub struct PrivateDebugApi<B> {
    backend: Arc<B>,
}

impl<B> PrivateDebugApi<B> {
    /// Create a new instance of the [PrivateDebugApi]
    pub const fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

impl<B> Clone for PrivateDebugApi<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend) }
    }
}

#[async_trait]
impl<B: Backend> PrivateDebugApiServer for PrivateDebugApi<B> {
    /// Handler for `debug_setHead`
    async fn set_head(&self, number: U64) -> RpcResult<()> {
        let number = number.to::<u64>();
        info!(target: "rpc::debug", number, "Rewinding chain head");
        self.backend.set_head(number).await.map_rpc_err(|err| {
            let code = match err {
                ProviderError::InvalidRewind { .. } => INVALID_PARAMS_CODE,
                _ => INTERNAL_ERROR_CODE,
            };
            (code, err.to_string(), None)
        })
    }
}

impl<B> std::fmt::Debug for PrivateDebugApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateDebugApi").finish_non_exhaustive()
    }
}
