//! Eth ABI helpers.
use crate::constants::SELECTOR_LEN;
use alloy_sol_types::{Revert, SolError};

/// Returns the revert reason from the given output data, if it's an abi encoded `Error(string)`.
/// Returns `None` if the output is not long enough to contain a function selector or the content
/// is not a valid abi encoded String.
pub fn decode_revert_reason(out: impl AsRef<[u8]>) -> Option<String> {
    let out = out.as_ref();
    if out.len() < SELECTOR_LEN {
        return None
    }
    Revert::abi_decode(out, true).ok().map(|revert| revert.reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_string() {
        let encoded = Revert { reason: "revert: bad input".to_string() }.abi_encode();
        assert_eq!(&encoded[..SELECTOR_LEN], &[0x08, 0xc3, 0x79, 0xa0]);
        assert_eq!(decode_revert_reason(&encoded).as_deref(), Some("revert: bad input"));
    }

    #[test]
    fn decode_short_output() {
        assert_eq!(decode_revert_reason([0x08, 0xc3]), None);
        assert_eq!(decode_revert_reason([0xde, 0xad, 0xbe, 0xef, 0x00]), None);
    }
}
