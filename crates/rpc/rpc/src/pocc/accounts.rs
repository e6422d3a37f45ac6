use jsonrpsee::core::RpcResult;
use pocc_interfaces::Backend;
use pocc_primitives::Address;
use pocc_rpc_api::AccountApiServer;
use std::sync::Arc;
use tracing::trace;

/// `pocc` API listing the accounts managed by the node.
pub struct AccountApi<B> {
    backend: Arc<B>,
}

impl<B> AccountApi<B> {
    /// Creates a new instance.
    pub const fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

impl<B> Clone for AccountApi<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend) }
    }
}

impl<B: Backend> AccountApiServer for AccountApi<B> {
    /// Handler for: `pocc_accounts`
    fn accounts(&self) -> RpcResult<Vec<Address>> {
        trace!(target: "rpc::pocc", "Serving pocc_accounts");
        Ok(self.backend.account_manager().accounts())
    }
}

impl<B> std::fmt::Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountApi").finish_non_exhaustive()
    }
}
