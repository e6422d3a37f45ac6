//! Assembling the per-transport modules and starting the servers.

use crate::{
    apis,
    config::PoccApiConfig,
    constants::API_VERSION,
    error::{RpcError, ServerKind, WsHttpSamePortError},
    PoccRpcModule, RpcApi, RpcModuleSelection,
};
use jsonrpsee::{
    server::{Server, ServerHandle},
    RpcModule,
};
use pocc_interfaces::Backend;
use pocc_rpc::RPCApi;
use pocc_rpc_api::RpcApiServer;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tracing::{debug, info};

/// Holds modules to be installed per transport type
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TransportRpcModuleConfig {
    /// http module configuration
    http: Option<RpcModuleSelection>,
    /// ws module configuration
    ws: Option<RpcModuleSelection>,
}

// === impl TransportRpcModuleConfig ===

impl TransportRpcModuleConfig {
    /// Creates a new config with only http set
    pub fn set_http(http: impl Into<RpcModuleSelection>) -> Self {
        Self::default().with_http(http)
    }

    /// Creates a new config with only ws set
    pub fn set_ws(ws: impl Into<RpcModuleSelection>) -> Self {
        Self::default().with_ws(ws)
    }

    /// Sets the [`RpcModuleSelection`] for the http transport.
    pub fn with_http(mut self, http: impl Into<RpcModuleSelection>) -> Self {
        self.http = Some(http.into());
        self
    }

    /// Sets the [`RpcModuleSelection`] for the ws transport.
    pub fn with_ws(mut self, ws: impl Into<RpcModuleSelection>) -> Self {
        self.ws = Some(ws.into());
        self
    }

    /// Returns true if no transports are configured
    pub const fn is_empty(&self) -> bool {
        self.http.is_none() && self.ws.is_none()
    }

    /// Returns the [`RpcModuleSelection`] for the http transport
    pub const fn http(&self) -> Option<&RpcModuleSelection> {
        self.http.as_ref()
    }

    /// Returns the [`RpcModuleSelection`] for the ws transport
    pub const fn ws(&self) -> Option<&RpcModuleSelection> {
        self.ws.as_ref()
    }
}

/// Holds installed modules per transport type.
#[derive(Debug, Clone, Default)]
pub struct TransportRpcModules {
    /// The original config
    config: TransportRpcModuleConfig,
    /// rpcs module for http
    http: Option<RpcModule<()>>,
    /// rpcs module for ws
    ws: Option<RpcModule<()>>,
}

// === impl TransportRpcModules ===

impl TransportRpcModules {
    /// Merges the services each configured transport selects.
    ///
    /// Every transport also gets an `rpc_modules` answer listing the namespaces it serves, if the
    /// `rpc` module is selected.
    pub fn new(apis: &[RpcApi], config: TransportRpcModuleConfig) -> Result<Self, RpcError> {
        let http = config.http().map(|selection| merge_selected(apis, selection)).transpose()?;
        let ws = config.ws().map(|selection| merge_selected(apis, selection)).transpose()?;
        Ok(Self { config, http, ws })
    }

    /// Returns the [`TransportRpcModuleConfig`] used to configure this instance.
    pub const fn module_config(&self) -> &TransportRpcModuleConfig {
        &self.config
    }

    /// Returns the module installed on the http transport, if any.
    pub const fn http(&self) -> Option<&RpcModule<()>> {
        self.http.as_ref()
    }

    /// Returns the module installed on the ws transport, if any.
    pub const fn ws(&self) -> Option<&RpcModule<()>> {
        self.ws.as_ref()
    }

    /// Starts the configured servers.
    ///
    /// A transport without an address in `server_config` is not started. If http and ws share an
    /// address they must serve the same modules and are started as one server.
    pub async fn start_server(
        self,
        server_config: RpcServerConfig,
    ) -> Result<RpcServerHandle, RpcError> {
        let mut handle = RpcServerHandle::default();
        let http = self.http.zip(server_config.http_addr);
        let ws = self.ws.zip(server_config.ws_addr);

        match (http, ws) {
            (Some((http, http_addr)), Some((_, ws_addr))) if http_addr == ws_addr => {
                if !RpcModuleSelection::are_identical(self.config.http(), self.config.ws()) {
                    return Err(WsHttpSamePortError {
                        addr: http_addr,
                        http: display_selection(self.config.http()),
                        ws: display_selection(self.config.ws()),
                    }
                    .into())
                }
                let kind = ServerKind::WsHttp(http_addr);
                let server = Server::builder()
                    .build(http_addr)
                    .await
                    .map_err(|err| RpcError::server_error(err, kind))?;
                let addr = server.local_addr().map_err(|err| RpcError::server_error(err, kind))?;
                handle.http_local_addr = Some(addr);
                handle.ws_local_addr = Some(addr);
                handle.http = Some(server.start(http));
            }
            (http, ws) => {
                if let Some((module, addr)) = http {
                    let kind = ServerKind::Http(addr);
                    let server = Server::builder()
                        .http_only()
                        .build(addr)
                        .await
                        .map_err(|err| RpcError::server_error(err, kind))?;
                    handle.http_local_addr =
                        Some(server.local_addr().map_err(|err| RpcError::server_error(err, kind))?);
                    handle.http = Some(server.start(module));
                }
                if let Some((module, addr)) = ws {
                    let kind = ServerKind::WS(addr);
                    let server = Server::builder()
                        .ws_only()
                        .build(addr)
                        .await
                        .map_err(|err| RpcError::server_error(err, kind))?;
                    handle.ws_local_addr =
                        Some(server.local_addr().map_err(|err| RpcError::server_error(err, kind))?);
                    handle.ws = Some(server.start(module));
                }
            }
        }

        if let Some(addr) = handle.http_local_addr {
            info!(target: "rpc::builder", url=%addr, "RPC HTTP server started");
        }
        if let Some(addr) = handle.ws_local_addr {
            info!(target: "rpc::builder", url=%addr, "RPC WS server started");
        }
        Ok(handle)
    }
}

fn display_selection(selection: Option<&RpcModuleSelection>) -> String {
    selection.map(ToString::to_string).unwrap_or_else(|| "disabled".to_string())
}

/// Merges the services `selection` installs into one module.
fn merge_selected(
    apis: &[RpcApi],
    selection: &RpcModuleSelection,
) -> Result<RpcModule<()>, RpcError> {
    let mut module = RpcModule::new(());
    let mut namespaces = HashMap::new();
    for api in apis.iter().filter(|api| selection.installs(&api.namespace, api.public)) {
        module.merge(api.service.clone())?;
        namespaces.insert(api.namespace.to_string(), api.version.to_string());
    }
    if selection.contains(&PoccRpcModule::Rpc) {
        namespaces.insert(PoccRpcModule::Rpc.to_string(), API_VERSION.to_string());
        module.merge(RPCApi::new(namespaces).into_rpc())?;
    }
    debug!(target: "rpc::builder", %selection, methods = module.method_names().count(), "Installed RPC module");
    Ok(module)
}

/// Addresses of the servers to start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcServerConfig {
    /// Address of the http server, not started if `None`
    http_addr: Option<SocketAddr>,
    /// Address of the ws server, not started if `None`
    ws_addr: Option<SocketAddr>,
}

// === impl RpcServerConfig ===

impl RpcServerConfig {
    /// Configures the http server to listen on `addr`.
    pub const fn with_http_address(mut self, addr: SocketAddr) -> Self {
        self.http_addr = Some(addr);
        self
    }

    /// Configures the ws server to listen on `addr`.
    pub const fn with_ws_address(mut self, addr: SocketAddr) -> Self {
        self.ws_addr = Some(addr);
        self
    }

    /// Returns the address the http server is configured with.
    pub const fn http_address(&self) -> Option<SocketAddr> {
        self.http_addr
    }

    /// Returns the address the ws server is configured with.
    pub const fn ws_address(&self) -> Option<SocketAddr> {
        self.ws_addr
    }
}

/// A handle to the spawned servers.
///
/// When this type is dropped or [`RpcServerHandle::stop`] has been called the servers will be
/// stopped.
#[derive(Debug, Clone, Default)]
#[must_use = "Server stops if dropped"]
pub struct RpcServerHandle {
    http_local_addr: Option<SocketAddr>,
    ws_local_addr: Option<SocketAddr>,
    http: Option<ServerHandle>,
    ws: Option<ServerHandle>,
}

// === impl RpcServerHandle ===

impl RpcServerHandle {
    /// Returns the [`SocketAddr`] of the http server if started.
    pub const fn http_local_addr(&self) -> Option<SocketAddr> {
        self.http_local_addr
    }

    /// Returns the [`SocketAddr`] of the ws server if started.
    pub const fn ws_local_addr(&self) -> Option<SocketAddr> {
        self.ws_local_addr
    }

    /// Returns the url to the http server
    pub fn http_url(&self) -> Option<String> {
        self.http_local_addr.map(|addr| format!("http://{addr}"))
    }

    /// Returns the url to the ws server
    pub fn ws_url(&self) -> Option<String> {
        self.ws_local_addr.map(|addr| format!("ws://{addr}"))
    }

    /// Tell the servers to stop without waiting for them to shut down.
    pub fn stop(self) -> Result<(), jsonrpsee::server::AlreadyStoppedError> {
        if let Some(handle) = self.http {
            handle.stop()?
        }
        if let Some(handle) = self.ws {
            handle.stop()?
        }
        Ok(())
    }
}

/// Installs the services of `backend` and starts the configured servers.
pub async fn launch<B: Backend>(
    backend: Arc<B>,
    api_config: &PoccApiConfig,
    module_config: TransportRpcModuleConfig,
    server_config: RpcServerConfig,
) -> Result<RpcServerHandle, RpcError> {
    debug!(target: "rpc::builder", http=?module_config.http(), ws=?module_config.ws(), "Using RPC module config");
    let apis = apis(backend, api_config);
    TransportRpcModules::new(&apis, module_config)?.start_server(server_config).await
}
