use crate::utils::{backend_with_account, CHAIN_ID};
use assert_matches::assert_matches;
use pocc_primitives::{Bytes, U256};
use pocc_rpc::{
    pocc::error::PoccApiError,
    test_utils::{random_address, random_secret, revert_script, transfer, MockAccount},
    CallMsg, ContractBackend, LocalContractBackend,
};

#[tokio::test]
async fn pending_nonce_follows_sent_transactions() {
    let (backend, _) = backend_with_account();
    let contracts = LocalContractBackend::new(backend.clone());

    let secret = random_secret();
    let tx = transfer(secret, 0, random_address(), U256::ZERO, Some(CHAIN_ID));
    let sender = tx.signer();
    assert_eq!(contracts.pending_nonce_at(sender).await.unwrap(), 0);

    let hash = contracts.send_transaction(&tx.into_signed()).await.unwrap();
    assert_eq!(contracts.pending_nonce_at(sender).await.unwrap(), 1);

    // a replacement must pay more than the pooled transaction
    let again = transfer(secret, 0, random_address(), U256::ZERO, Some(CHAIN_ID));
    assert_ne!(again.hash(), hash);
    assert_matches!(
        contracts.send_transaction(&again.into_signed()).await,
        Err(PoccApiError::Pool(_))
    );
}

#[tokio::test]
async fn reads_code_at_heights() {
    let (backend, _) = backend_with_account();
    let contracts = LocalContractBackend::new(backend.clone());
    let contract = random_address();
    let code = Bytes::from_static(&[0x60, 0x00, 0x60, 0x00]);

    backend.set_account(contract, MockAccount { code: code.clone(), ..Default::default() });
    backend.mine();

    assert_eq!(contracts.code_at(contract, None).await.unwrap(), code);
    assert_eq!(contracts.code_at(contract, Some(1)).await.unwrap(), code);
    assert_eq!(contracts.pending_code_at(contract).await.unwrap(), code);
    assert_eq!(contracts.code_at(random_address(), None).await.unwrap(), Bytes::new());
    assert!(contracts.code_at(contract, Some(5)).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn calls_and_estimates() {
    let (backend, _) = backend_with_account();
    let contracts = LocalContractBackend::new(backend.clone());
    let contract = random_address();
    backend.set_account(
        contract,
        MockAccount { code: Bytes::from_static(&[0xfe]), ..Default::default() },
    );

    let code = Bytes::from_static(&[0xfe]);
    let msg = CallMsg { to: Some(contract), ..Default::default() };
    assert_eq!(contracts.call_contract(msg.clone(), None).await.unwrap(), code);
    assert_eq!(contracts.pending_call_contract(msg.clone()).await.unwrap(), code);
    assert_eq!(contracts.estimate_gas(msg.clone()).await.unwrap(), 21_000);
    assert!(contracts.suggest_gas_price().await.unwrap() > U256::ZERO);

    backend.set_evm_script(revert_script(Bytes::from_static(&[0x01, 0x02])));
    let err = contracts.call_contract(msg, None).await.unwrap_err();
    assert!(!err.is_not_found());
    let PoccApiError::Revert(revert) = &err else { panic!("expected revert, got {err:?}") };
    assert_eq!(revert.output(), Some(&Bytes::from_static(&[0x01, 0x02])));
}
