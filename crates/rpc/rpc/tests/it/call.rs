use crate::utils::backend_with_account;
use assert_matches::assert_matches;
use jsonrpsee_types::ErrorObject;
use pocc_interfaces::{Backend, EvmError};
use pocc_primitives::{Address, BlockNumberOrTag, Bytes, U256, U64};
use pocc_rpc::{
    pocc::error::PoccApiError,
    test_utils::{
        gas_hungry_script, random_address, revert_script, MockAccount, MockBackend,
        MOCK_BLOCK_GAS_LIMIT,
    },
    AddrLocker, BlockChainApi, TransactionPoolApi, DEFAULT_EVM_TIMEOUT, RPC_DEFAULT_GAS_CAP,
};
use pocc_rpc_types::{CallRequest, TransactionRequest};
use std::{sync::Arc, time::Duration};

fn call_to(to: Address) -> CallRequest {
    CallRequest { to: Some(to), ..Default::default() }
}

/// Waits until every handed out interpreter has been released.
async fn wait_for_releases(backend: &MockBackend, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while backend.evm_releases() < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("interpreter released");
}

#[tokio::test]
async fn historical_calls_are_deterministic() {
    let (backend, from) = backend_with_account();
    let contract = random_address();
    backend.set_account(
        contract,
        MockAccount { code: Bytes::from_static(&[0x60, 0x01]), ..Default::default() },
    );
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, DEFAULT_EVM_TIMEOUT);
    let txs = TransactionPoolApi::new(backend.clone(), AddrLocker::new());

    let at = BlockNumberOrTag::Number(0);
    let first = api.call(call_to(contract), at).await.unwrap();
    assert_eq!(first, Bytes::from_static(&[0x60, 0x01]));

    // change the pool and the head in between
    txs.send_transaction(TransactionRequest { from, to: Some(contract), ..Default::default() })
        .await
        .unwrap();
    backend.mine();
    backend.set_account(contract, MockAccount::default());

    let second = api.call(call_to(contract), at).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(api.call(call_to(contract), BlockNumberOrTag::Latest).await.unwrap(), Bytes::new());
}

#[tokio::test]
async fn revert_is_distinct_from_not_found() {
    let (backend, _) = backend_with_account();
    let payload = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]);
    backend.set_evm_script(revert_script(payload.clone()));
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, DEFAULT_EVM_TIMEOUT);

    let err = api.call(call_to(random_address()), BlockNumberOrTag::Latest).await.unwrap_err();
    let PoccApiError::Revert(revert) = &err else { panic!("expected revert, got {err:?}") };
    assert_eq!(revert.output(), Some(&payload));
    assert!(!err.is_not_found());
    let rpc_err = ErrorObject::from(err);
    assert_eq!(rpc_err.code(), 3);
    assert_eq!(rpc_err.data().map(|data| data.get()), Some("\"0xdeadbeef\""));

    let err =
        api.call(call_to(random_address()), BlockNumberOrTag::Number(99)).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(ErrorObject::from(err).code(), -32001);
}

#[tokio::test]
async fn insufficient_funds_fail_the_call() {
    let backend = Arc::new(MockBackend::new(1));
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, DEFAULT_EVM_TIMEOUT);

    let request = CallRequest { value: Some(U256::from(1)), ..call_to(random_address()) };
    assert_matches!(
        api.call(request, BlockNumberOrTag::Latest).await,
        Err(PoccApiError::Evm(EvmError::InsufficientFunds))
    );
}

#[tokio::test]
async fn every_instance_is_released_once() {
    let (backend, _) = backend_with_account();
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, DEFAULT_EVM_TIMEOUT);

    api.call(call_to(random_address()), BlockNumberOrTag::Latest).await.unwrap();
    backend.set_evm_script(revert_script(Bytes::new()));
    api.call(call_to(random_address()), BlockNumberOrTag::Latest).await.unwrap_err();
    api.estimate_gas(call_to(random_address())).await.unwrap_err();

    wait_for_releases(&backend, backend.evm_instances()).await;
    assert_eq!(backend.evm_releases(), backend.evm_instances());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_call_is_cancelled_and_released() {
    let (backend, _) = backend_with_account();
    backend.set_evm_delay(Duration::from_secs(30));
    let timeout = Duration::from_millis(50);
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, timeout);

    let err = api.call(call_to(random_address()), BlockNumberOrTag::Latest).await.unwrap_err();
    assert_matches!(err, PoccApiError::ExecutionTimedOut(t) if t == timeout);
    assert_eq!(ErrorObject::from(err).code(), -32000);

    wait_for_releases(&backend, 1).await;
    assert_eq!(backend.evm_instances(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_call_is_cancelled_and_released() {
    let (backend, _) = backend_with_account();
    backend.set_evm_delay(Duration::from_secs(30));
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, DEFAULT_EVM_TIMEOUT);

    let call = api.call(call_to(random_address()), BlockNumberOrTag::Latest);
    assert!(tokio::time::timeout(Duration::from_millis(50), call).await.is_err());

    wait_for_releases(&backend, 1).await;
    assert_eq!(backend.evm_instances(), 1);
}

#[tokio::test]
async fn estimate_finds_minimum_gas() {
    let (backend, _) = backend_with_account();
    backend.set_evm_script(gas_hungry_script(53_000));
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, DEFAULT_EVM_TIMEOUT);

    assert_eq!(api.estimate_gas(call_to(random_address())).await.unwrap(), 53_000);

    // the request's gas bounds the search
    let request = CallRequest { gas: Some(U64::from(40_000)), ..call_to(random_address()) };
    assert_matches!(
        api.estimate_gas(request).await,
        Err(PoccApiError::GasRequiredExceedsAllowance(40_000))
    );
}

#[tokio::test]
async fn estimate_without_gas_cap_accepts_any_request_gas() {
    let (backend, _) = backend_with_account();
    backend.set_evm_script(gas_hungry_script(53_000));
    let api = BlockChainApi::new(backend.clone(), 0, DEFAULT_EVM_TIMEOUT);

    let request = CallRequest { gas: Some(U64::from(u64::MAX)), ..call_to(random_address()) };
    assert_eq!(api.estimate_gas(request).await.unwrap(), 53_000);
}

#[tokio::test]
async fn estimate_at_cap() {
    let (backend, _) = backend_with_account();
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, DEFAULT_EVM_TIMEOUT);

    backend.set_evm_script(gas_hungry_script(u64::MAX));
    assert_matches!(
        api.estimate_gas(call_to(random_address())).await,
        Err(PoccApiError::GasRequiredExceedsAllowance(MOCK_BLOCK_GAS_LIMIT))
    );

    backend.set_evm_script(revert_script(Bytes::from_static(&[1])));
    assert_matches!(api.estimate_gas(call_to(random_address())).await, Err(PoccApiError::Revert(_)));

    // a smaller gas cap wins over the block gas limit
    backend.set_evm_script(gas_hungry_script(u64::MAX));
    let api = BlockChainApi::new(backend.clone(), 100_000, DEFAULT_EVM_TIMEOUT);
    assert_matches!(
        api.estimate_gas(call_to(random_address())).await,
        Err(PoccApiError::GasRequiredExceedsAllowance(100_000))
    );
}

#[tokio::test]
async fn reads_of_unknown_blocks() {
    let (backend, from) = backend_with_account();
    let api = BlockChainApi::new(backend.clone(), RPC_DEFAULT_GAS_CAP, DEFAULT_EVM_TIMEOUT);

    assert_eq!(api.block_by_number(BlockNumberOrTag::Number(7), false).await.unwrap(), None);
    assert!(api.balance(from, BlockNumberOrTag::Number(7)).await.unwrap_err().is_not_found());
    assert_eq!(
        api.balance(from, BlockNumberOrTag::Latest).await.unwrap(),
        U256::from(10).pow(U256::from(18))
    );

    let pending = api.block_by_number(BlockNumberOrTag::Pending, false).await.unwrap().unwrap();
    assert_eq!(pending.header.hash, None);
    assert_eq!(pending.header.number, None);
    assert_eq!(pending.total_difficulty, None);

    let head = backend.current_block().hash_slow();
    let latest = api.block_by_hash(head, true).await.unwrap().unwrap();
    assert_eq!(latest.header.hash, Some(head));
    assert_eq!(latest.total_difficulty, Some(U256::from(1)));
}
