use jsonrpsee::core::RpcResult;
use pocc_rpc_api::RpcApiServer;
use std::{collections::HashMap, sync::Arc};

/// `rpc` API implementation.
///
/// This type handles `rpc_modules`, reporting the namespaces a transport serves.
#[derive(Debug, Clone, Default)]
pub struct RPCApi {
    /// The namespaces served and their versions.
    rpc_modules: Arc<HashMap<String, String>>,
}

impl RPCApi {
    /// Return a new `RPCApi` struct, with given `module_map`
    pub fn new(module_map: HashMap<String, String>) -> Self {
        Self { rpc_modules: Arc::new(module_map) }
    }
}

impl RpcApiServer for RPCApi {
    fn rpc_modules(&self) -> RpcResult<HashMap<String, String>> {
        Ok(self.rpc_modules.as_ref().clone())
    }
}
