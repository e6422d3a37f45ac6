//! Common helpers for testing the RPC services.

mod generators;
mod mock;

pub use generators::{random_address, random_secret, sign_tx, transfer};
pub use mock::{
    gas_hungry_script, revert_script, EvmScript, MockAccount, MockBackend, MockChain,
    MOCK_BLOCK_GAS_LIMIT, MOCK_PROTOCOL_VERSION,
};
