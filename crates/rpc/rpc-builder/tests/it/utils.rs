use pocc_interfaces::AccountManager;
use pocc_primitives::{Address, U256};
use pocc_rpc::test_utils::{random_secret, MockAccount, MockBackend};
use pocc_rpc_builder::{
    apis, PoccApiConfig, RpcModuleSelection, RpcServerConfig, RpcServerHandle,
    TransportRpcModuleConfig, TransportRpcModules,
};
use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
};

/// Chain id of the test chain.
pub const CHAIN_ID: u64 = 1337;

/// Localhost with port 0 so a free port is used.
pub const fn test_address() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
}

/// Returns a backend holding one unlocked, funded account.
pub fn test_backend() -> (Arc<MockBackend>, Address) {
    let backend = MockBackend::new(CHAIN_ID);
    let address = backend.key_store().import_raw_key(random_secret(), "test").unwrap();
    backend.key_store().unlock(address, "test", None).unwrap();
    backend.set_account(address, MockAccount::with_balance(U256::from(10).pow(U256::from(18))));
    (Arc::new(backend), address)
}

/// Returns the transport modules of `backend` for the given config.
pub fn test_modules(
    backend: Arc<MockBackend>,
    config: TransportRpcModuleConfig,
) -> TransportRpcModules {
    TransportRpcModules::new(&apis(backend, &PoccApiConfig::default()), config).unwrap()
}

/// Launches a new http server serving `modules`.
pub async fn launch_http(
    backend: Arc<MockBackend>,
    modules: impl Into<RpcModuleSelection>,
) -> RpcServerHandle {
    test_modules(backend, TransportRpcModuleConfig::set_http(modules))
        .start_server(RpcServerConfig::default().with_http_address(test_address()))
        .await
        .unwrap()
}

/// Launches a new ws server serving `modules`.
pub async fn launch_ws(
    backend: Arc<MockBackend>,
    modules: impl Into<RpcModuleSelection>,
) -> RpcServerHandle {
    test_modules(backend, TransportRpcModuleConfig::set_ws(modules))
        .start_server(RpcServerConfig::default().with_ws_address(test_address()))
        .await
        .unwrap()
}
