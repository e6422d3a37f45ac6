//! Startup tests
use crate::utils::{launch_http, launch_ws, test_address, test_backend, test_modules};
use assert_matches::assert_matches;
use pocc_rpc_builder::{
    error::{RpcError, ServerKind},
    PoccRpcModule, RpcModuleSelection, RpcServerConfig, TransportRpcModuleConfig,
};
use std::net::{Ipv4Addr, SocketAddr};

#[tokio::test(flavor = "multi_thread")]
async fn test_http_addr_in_use() {
    let (backend, _) = test_backend();
    let handle = launch_http(backend.clone(), [PoccRpcModule::Pocc]).await;
    let addr = handle.http_local_addr().unwrap();
    let modules = test_modules(backend, TransportRpcModuleConfig::set_http([PoccRpcModule::Pocc]));
    let result = modules.start_server(RpcServerConfig::default().with_http_address(addr)).await;
    assert_matches!(
        result,
        Err(RpcError::AddressAlreadyInUse { kind: ServerKind::Http(a), .. }) if a == addr
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ws_addr_in_use() {
    let (backend, _) = test_backend();
    let handle = launch_ws(backend.clone(), [PoccRpcModule::Pocc]).await;
    let addr = handle.ws_local_addr().unwrap();
    let modules = test_modules(backend, TransportRpcModuleConfig::set_ws([PoccRpcModule::Pocc]));
    let result = modules.start_server(RpcServerConfig::default().with_ws_address(addr)).await;
    assert_matches!(
        result,
        Err(RpcError::AddressAlreadyInUse { kind: ServerKind::WS(a), .. }) if a == addr
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_launch_same_port_different_modules() {
    let (backend, _) = test_backend();
    let config = TransportRpcModuleConfig::set_http(RpcModuleSelection::Standard)
        .with_ws([PoccRpcModule::Pocc, PoccRpcModule::Personal]);
    let addr = test_address();
    let result = test_modules(backend, config)
        .start_server(RpcServerConfig::default().with_http_address(addr).with_ws_address(addr))
        .await;
    assert_matches!(result, Err(RpcError::WsHttpSamePortError(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_launch_same_port_same_modules() {
    let (backend, _) = test_backend();
    let config = TransportRpcModuleConfig::set_http(RpcModuleSelection::Standard)
        .with_ws(RpcModuleSelection::Standard);
    let addr = test_address();
    let handle = test_modules(backend, config)
        .start_server(RpcServerConfig::default().with_http_address(addr).with_ws_address(addr))
        .await
        .unwrap();
    assert!(handle.http_local_addr().is_some());
    assert_eq!(handle.http_local_addr(), handle.ws_local_addr());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_launch_separate_ports() {
    let (backend, _) = test_backend();
    let config = TransportRpcModuleConfig::set_http(RpcModuleSelection::Standard)
        .with_ws(RpcModuleSelection::All);
    let handle = test_modules(backend, config)
        .start_server(
            RpcServerConfig::default()
                .with_http_address(test_address())
                .with_ws_address(SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0)),
        )
        .await
        .unwrap();
    assert_ne!(handle.http_local_addr(), handle.ws_local_addr());
    assert!(handle.http_url().unwrap().starts_with("http://127.0.0.1:"));
    assert!(handle.ws_url().unwrap().starts_with("ws://0.0.0.0:"));
    handle.stop().unwrap();
}
