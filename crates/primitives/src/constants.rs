//! Chain-wide constants.

use crate::B256;
use alloy_primitives::b256;

/// The minimum gas any transaction costs: the intrinsic cost of a plain value transfer.
pub const MIN_TRANSACTION_GAS: u64 = 21_000;

/// The length of a function selector.
pub const SELECTOR_LEN: usize = 4;

/// Multiplier for converting gwei to wei.
pub const GWEI_TO_WEI: u64 = 1_000_000_000;

/// Multiplier for converting ether to wei.
pub const ETH_TO_WEI: u128 = GWEI_TO_WEI as u128 * GWEI_TO_WEI as u128;

/// Keccak256 over empty array.
pub const KECCAK_EMPTY: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

/// Half of the secp256k1 curve order. Signatures with an `s` above this value are malleable and
/// rejected (EIP-2).
pub const SECP256K1N_HALF: B256 =
    b256!("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0");
