use crate::utils::backend_with_account;
use assert_matches::assert_matches;
use pocc_interfaces::{AccountManager, Backend, PoolError};
use pocc_primitives::{Bytes, U256, U64};
use pocc_rpc::{
    pocc::error::PoccApiError,
    test_utils::{random_address, random_secret, MockAccount},
    AddrLocker, PersonalApi, TransactionPoolApi, DEFAULT_TX_GAS,
};
use pocc_rpc_types::TransactionRequest;
use std::time::Duration;
use tokio::time::timeout;

fn transfer_request(from: pocc_primitives::Address) -> TransactionRequest {
    TransactionRequest { from, to: Some(random_address()), ..Default::default() }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_get_consecutive_nonces() {
    let (backend, from) = backend_with_account();
    let api = TransactionPoolApi::new(backend.clone(), AddrLocker::new());

    let handles = (0..32)
        .map(|_| {
            let api = api.clone();
            tokio::spawn(async move { api.send_transaction(transfer_request(from)).await })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let content = backend.pool_content();
    let nonces = content.pending[&from].keys().copied().collect::<Vec<_>>();
    assert_eq!(nonces, (0..32).collect::<Vec<_>>());
    assert!(content.queued.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn personal_and_pool_share_the_locker() {
    let (backend, from) = backend_with_account();
    let locker = AddrLocker::new();
    let pool_api = TransactionPoolApi::new(backend.clone(), locker.clone());
    let personal = PersonalApi::new(backend.clone(), locker);

    let mut handles = Vec::new();
    for i in 0..16 {
        let pool_api = pool_api.clone();
        let personal = personal.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                pool_api.send_transaction(transfer_request(from)).await
            } else {
                personal.send_transaction(transfer_request(from), "test").await
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(backend.pool_nonce(from).await.unwrap(), 16);
    assert_eq!(backend.pool_stats().pending, 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn held_sender_does_not_block_others() {
    let (backend, blocked) = backend_with_account();
    let other = backend.key_store().import_raw_key(random_secret(), "test").unwrap();
    backend.key_store().unlock(other, "test", None).unwrap();
    backend.set_account(other, MockAccount::with_balance(U256::from(10).pow(U256::from(18))));

    let api = TransactionPoolApi::new(backend.clone(), AddrLocker::new());
    let held = api.locker().lock_addr(blocked).await;

    let stuck = tokio::spawn({
        let api = api.clone();
        async move { api.send_transaction(transfer_request(blocked)).await }
    });
    timeout(Duration::from_secs(5), api.send_transaction(transfer_request(other)))
        .await
        .unwrap()
        .unwrap();
    assert!(!stuck.is_finished());
    assert_eq!(backend.pool_nonce(blocked).await.unwrap(), 0);

    drop(held);
    timeout(Duration::from_secs(5), stuck).await.unwrap().unwrap().unwrap();
    assert_eq!(backend.pool_nonce(blocked).await.unwrap(), 1);
}

#[tokio::test]
async fn fills_transaction_defaults() {
    let (backend, from) = backend_with_account();
    let api = TransactionPoolApi::new(backend.clone(), AddrLocker::new());

    let hash = api.send_transaction(transfer_request(from)).await.unwrap();
    let tx = backend.pool_transaction(hash).unwrap();
    assert_eq!(tx.signer(), from);
    assert_eq!(tx.nonce, 0);
    assert_eq!(tx.gas_limit, DEFAULT_TX_GAS);
    assert_eq!(tx.chain_id, Some(crate::utils::CHAIN_ID));
    assert_eq!(tx.gas_price, backend.suggest_price().await.unwrap().to::<u128>());
}

#[tokio::test]
async fn explicit_nonce_below_pool_nonce_is_rejected() {
    let (backend, from) = backend_with_account();
    let api = TransactionPoolApi::new(backend.clone(), AddrLocker::new());
    api.send_transaction(transfer_request(from)).await.unwrap();
    api.send_transaction(transfer_request(from)).await.unwrap();

    let request = TransactionRequest { nonce: Some(U64::from(1)), ..transfer_request(from) };
    assert_matches!(
        api.send_transaction(request).await,
        Err(PoccApiError::Pool(PoolError::NonceTooLow { tx_nonce: 1, state_nonce: 2 }))
    );

    // a nonce ahead of the pool is queued
    let request = TransactionRequest { nonce: Some(U64::from(5)), ..transfer_request(from) };
    api.send_transaction(request).await.unwrap();
    assert_eq!(backend.pool_stats().queued, 1);
    assert_eq!(backend.pool_nonce(from).await.unwrap(), 2);
}

#[tokio::test]
async fn rejects_malformed_requests() {
    let (backend, from) = backend_with_account();
    let api = TransactionPoolApi::new(backend.clone(), AddrLocker::new());

    let creation = TransactionRequest { from, ..Default::default() };
    assert_matches!(
        api.send_transaction(creation).await,
        Err(PoccApiError::ContractCreationWithoutData)
    );

    let conflicting = TransactionRequest {
        data: Some(Bytes::from_static(&[1])),
        input: Some(Bytes::from_static(&[2])),
        ..transfer_request(from)
    };
    assert_matches!(
        api.send_transaction(conflicting).await,
        Err(PoccApiError::ConflictingInputs(_))
    );

    // nothing reached the pool and no nonce was consumed
    assert_eq!(backend.pool_nonce(from).await.unwrap(), 0);
}

#[tokio::test]
async fn locked_account_can_not_send() {
    let (backend, from) = backend_with_account();
    pocc_interfaces::AccountManager::lock(backend.key_store(), from).unwrap();
    let api = TransactionPoolApi::new(backend.clone(), AddrLocker::new());

    let err = api.send_transaction(transfer_request(from)).await.unwrap_err();
    assert_matches!(err, PoccApiError::Sign(_));
    assert_eq!(jsonrpsee_types::ErrorObject::from(err).code(), -32000);
}
