use crate::utils::{backend_with_account, CHAIN_ID};
use pocc_interfaces::Backend;
use pocc_primitives::{TxHash, B256, U256};
use pocc_rpc::{
    test_utils::{random_address, random_secret, transfer},
    PoccPubSub,
};
use pocc_rpc_api::PoccPubSubApiServer;
use pocc_rpc_types::Header;
use std::time::Duration;

const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn new_pending_transactions() {
    let (backend, _) = backend_with_account();
    let module = PoccPubSub::new(backend.clone()).into_rpc();
    let mut sub = module
        .subscribe_unbounded("pocc_subscribe", ["newPendingTransactions"])
        .await
        .unwrap();

    let secret = random_secret();
    let mut sent = Vec::new();
    for nonce in 0..3 {
        let tx = transfer(secret, nonce, random_address(), U256::ZERO, Some(CHAIN_ID));
        sent.push(backend.send_tx(tx).await.unwrap());
    }

    for expected in sent {
        let (hash, _) = tokio::time::timeout(NOTIFICATION_TIMEOUT, sub.next::<TxHash>())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(hash, expected);
    }
}

#[tokio::test]
async fn new_heads() {
    let (backend, _) = backend_with_account();
    let module = PoccPubSub::new(backend.clone()).into_rpc();
    let mut sub = module.subscribe_unbounded("pocc_subscribe", ["newHeads"]).await.unwrap();

    let block = backend.mine();
    let (header, _) = tokio::time::timeout(NOTIFICATION_TIMEOUT, sub.next::<Header>())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(header.hash, Some(block.hash_slow()));
    assert_eq!(header.number.map(|n| n.to::<u64>()), Some(1));

    // a rewind announces the new head as well
    backend.set_head(0).await.unwrap();
    let (header, _) = tokio::time::timeout(NOTIFICATION_TIMEOUT, sub.next::<Header>())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(header.parent_hash, B256::ZERO);
    assert_eq!(header.number.map(|n| n.to::<u64>()), Some(0));
}

#[tokio::test]
async fn unknown_kind_is_rejected() {
    let (backend, _) = backend_with_account();
    let module = PoccPubSub::new(backend).into_rpc();
    assert!(module.subscribe_unbounded("pocc_subscribe", ["logs"]).await.is_err());
}
