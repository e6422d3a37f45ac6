use crate::{BlockNumber, ChainId};
use serde::{Deserialize, Serialize};

/// The fork configuration of a chain.
///
/// Only the switches the RPC layer consults are carried; consensus rules live with the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// The chain id used for replay protection.
    pub chain_id: ChainId,
    /// First block with EIP-155 replay protection, `None` if it never activates.
    pub eip155_block: Option<BlockNumber>,
}

impl ChainConfig {
    /// Creates a config with replay protection active from genesis.
    pub const fn new(chain_id: ChainId) -> Self {
        Self { chain_id, eip155_block: Some(0) }
    }

    /// Returns `true` if EIP-155 is active at the given block.
    pub fn is_eip155(&self, number: BlockNumber) -> bool {
        self.eip155_block.is_some_and(|fork| fork <= number)
    }

    /// The chain id to sign with at the given block, `None` before EIP-155.
    pub fn signing_chain_id(&self, number: BlockNumber) -> Option<ChainId> {
        self.is_eip155(number).then_some(self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_chain_id_follows_fork() {
        let config = ChainConfig { chain_id: 9, eip155_block: Some(10) };
        assert_eq!(config.signing_chain_id(9), None);
        assert_eq!(config.signing_chain_id(10), Some(9));

        let config = ChainConfig { chain_id: 9, eip155_block: None };
        assert!(!config.is_eip155(u64::MAX));
    }
}
