//! Standalone http and ws tests
use crate::utils::{launch_http, launch_ws, test_backend};
use jsonrpsee::{
    core::client::ClientT,
    http_client::HttpClientBuilder,
    rpc_params,
    types::error::METHOD_NOT_FOUND_CODE,
    ws_client::WsClientBuilder,
};
use pocc_primitives::{BlockNumberOrTag, U64};
use pocc_rpc_api::clients::*;
use pocc_rpc_builder::{PoccRpcModule, RpcModuleSelection};
use pocc_rpc_types::{
    pubsub::{SubscriptionKind, SubscriptionResult},
    TransactionRequest,
};
use std::{collections::HashMap, time::Duration};

fn is_method_not_found(err: jsonrpsee::core::ClientError) -> bool {
    matches!(err, jsonrpsee::core::ClientError::Call(error) if error.code() == METHOD_NOT_FOUND_CODE)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_standard_modules_over_http() {
    pocc_tracing::init_test_tracing();
    let (backend, from) = test_backend();
    let handle = launch_http(backend.clone(), RpcModuleSelection::Standard).await;
    let client = HttpClientBuilder::default().build(handle.http_url().unwrap()).unwrap();

    assert_eq!(BlockChainApiClient::block_number(&client).await.unwrap(), U64::ZERO);
    assert_eq!(AccountApiClient::accounts(&client).await.unwrap(), vec![from]);
    assert!(
        BlockChainApiClient::block_by_number(&client, BlockNumberOrTag::Number(3), false)
            .await
            .unwrap()
            .is_none()
    );

    let modules = RpcApiClient::rpc_modules(&client).await.unwrap();
    let expected = ["pocc", "txpool", "debug", "rpc"]
        .into_iter()
        .map(|namespace| (namespace.to_string(), "1.0".to_string()))
        .collect::<HashMap<_, _>>();
    assert_eq!(modules, expected);

    // non-public services are not installed
    let err = PersonalApiClient::list_accounts(&client).await.unwrap_err();
    assert!(is_method_not_found(err));
    let err = PrivateDebugApiClient::set_head(&client, U64::ZERO).await.unwrap_err();
    assert!(is_method_not_found(err));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_send_and_inspect_pool_over_http() {
    let (backend, from) = test_backend();
    let handle = launch_http(backend, RpcModuleSelection::Standard).await;
    let client = HttpClientBuilder::default().build(handle.http_url().unwrap()).unwrap();

    let request = TransactionRequest { from, to: Some(from), ..Default::default() };
    let hash = TransactionPoolApiClient::send_transaction(&client, request).await.unwrap();
    let tx = TransactionPoolApiClient::transaction_by_hash(&client, hash).await.unwrap().unwrap();
    assert_eq!(tx.hash, hash);

    let status = TxPoolApiClient::txpool_status(&client).await.unwrap();
    assert_eq!(status.pending, U64::from(1));
    assert_eq!(status.queued, U64::ZERO);

    let count: U64 = client
        .request("pocc_getTransactionCount", rpc_params![from, "pending"])
        .await
        .unwrap();
    assert_eq!(count, U64::from(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_explicit_selection_installs_private_services() {
    let (backend, from) = test_backend();
    let handle =
        launch_http(backend, [PoccRpcModule::Pocc, PoccRpcModule::Personal, PoccRpcModule::Debug])
            .await;
    let client = HttpClientBuilder::default().build(handle.http_url().unwrap()).unwrap();

    assert_eq!(PersonalApiClient::list_accounts(&client).await.unwrap(), vec![from]);
    assert!(PersonalApiClient::lock_account(&client, from).await.unwrap());

    let request = TransactionRequest { from, to: Some(from), ..Default::default() };
    PersonalApiClient::send_transaction(&client, request, "test".to_string()).await.unwrap();
    assert_eq!(
        TransactionPoolApiClient::transaction_count(&client, from, Some(BlockNumberOrTag::Pending))
            .await
            .unwrap(),
        U64::from(1)
    );

    PrivateDebugApiClient::set_head(&client, U64::ZERO).await.unwrap();

    // `rpc` was not selected
    let err = RpcApiClient::rpc_modules(&client).await.unwrap_err();
    assert!(is_method_not_found(err));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_new_heads_over_ws() {
    let (backend, _) = test_backend();
    let handle = launch_ws(backend.clone(), RpcModuleSelection::Standard).await;
    let client = WsClientBuilder::default().build(handle.ws_url().unwrap()).await.unwrap();

    let mut sub = PoccPubSubApiClient::subscribe(&client, SubscriptionKind::NewHeads).await.unwrap();
    let block = backend.mine();

    let item = tokio::time::timeout(Duration::from_secs(5), sub.next()).await.unwrap();
    match item.unwrap().unwrap() {
        SubscriptionResult::Header(header) => assert_eq!(header.hash, Some(block.hash_slow())),
        other => panic!("unexpected notification {other:?}"),
    }
    sub.unsubscribe().await.unwrap();
    assert!(client.is_connected());
}
