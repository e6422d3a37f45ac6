use pocc_interfaces::AccountManager;
use pocc_primitives::{Address, U256};
use pocc_rpc::test_utils::{random_secret, MockAccount, MockBackend};
use std::sync::Arc;

/// Chain id of the test chain.
pub const CHAIN_ID: u64 = 1337;

/// Returns a backend holding one unlocked, funded account.
pub fn backend_with_account() -> (Arc<MockBackend>, Address) {
    pocc_tracing::init_test_tracing();
    let backend = MockBackend::new(CHAIN_ID);
    let address = backend.key_store().import_raw_key(random_secret(), "test").unwrap();
    backend.key_store().unlock(address, "test", None).unwrap();
    backend.set_account(address, MockAccount::with_balance(U256::from(10).pow(U256::from(18))));
    (Arc::new(backend), address)
}
