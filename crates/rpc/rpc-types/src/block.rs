use crate::Transaction;
use pocc_primitives::{
    Address, Block as PrimitiveBlock, Bytes, Header as PrimitiveHeader, TransactionSignedEcRecovered,
    TxHash, B256, U256, U64,
};
use serde::{Deserialize, Serialize};

/// Error that can occur when converting a block for RPC output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    /// A transaction failed sender recovery
    #[error("transaction failed sender recovery")]
    InvalidSignature,
}

/// Block Transactions depending on the boolean attribute of `getBlockBy*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    /// Only hashes
    Hashes(Vec<TxHash>),
    /// Full transactions
    Full(Vec<Transaction>),
}

impl BlockTransactions {
    /// Returns the number of transactions.
    pub fn len(&self) -> usize {
        match self {
            Self::Hashes(hashes) => hashes.len(),
            Self::Full(txs) => txs.len(),
        }
    }

    /// Returns `true` if the block has no transactions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BlockTransactions {
    fn default() -> Self {
        Self::Hashes(Vec::new())
    }
}

/// Block header representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Hash of the block, `None` for the pending block
    pub hash: Option<B256>,
    /// Hash of the parent
    pub parent_hash: B256,
    /// Alias of `beneficiary`
    pub miner: Address,
    /// State root hash
    pub state_root: B256,
    /// Transactions root hash
    pub transactions_root: B256,
    /// Transactions receipts root hash
    pub receipts_root: B256,
    /// Difficulty
    pub difficulty: U256,
    /// Block number, `None` for the pending block
    pub number: Option<U64>,
    /// Gas Limit
    pub gas_limit: U64,
    /// Gas Used
    pub gas_used: U64,
    /// Timestamp
    pub timestamp: U64,
    /// Extra data
    pub extra_data: Bytes,
}

impl Header {
    /// Converts a header. `hash` is `None` for the pending block, in which case the number is
    /// left out as well.
    pub fn from_primitive(header: &PrimitiveHeader, hash: Option<B256>) -> Self {
        Self {
            hash,
            parent_hash: header.parent_hash,
            miner: header.beneficiary,
            state_root: header.state_root,
            transactions_root: header.transactions_root,
            receipts_root: header.receipts_root,
            difficulty: header.difficulty,
            number: hash.map(|_| U64::from(header.number)),
            gas_limit: U64::from(header.gas_limit),
            gas_used: U64::from(header.gas_used),
            timestamp: U64::from(header.timestamp),
            extra_data: header.extra_data.clone(),
        }
    }
}

/// Block representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Header of the block
    #[serde(flatten)]
    pub header: Header,
    /// Total difficulty, `None` if unknown
    pub total_difficulty: Option<U256>,
    /// Size in bytes of the RLP encoded block
    pub size: U64,
    /// Transactions
    pub transactions: BlockTransactions,
}

impl Block {
    /// Converts a chain block.
    ///
    /// With `full` set, transactions are returned as objects with recovered senders, otherwise as
    /// hashes. A `None` hash marks the pending block.
    pub fn from_block(
        block: &PrimitiveBlock,
        hash: Option<B256>,
        total_difficulty: Option<U256>,
        full: bool,
    ) -> Result<Self, BlockError> {
        let transactions = if full {
            let txs = block
                .body
                .iter()
                .enumerate()
                .map(|(idx, tx)| {
                    let signer = tx.recover_signer().ok_or(BlockError::InvalidSignature)?;
                    let recovered =
                        TransactionSignedEcRecovered::from_signed_transaction(tx.clone(), signer);
                    Ok(match hash {
                        Some(hash) => Transaction::from_recovered_with_block_context(
                            &recovered,
                            hash,
                            block.number(),
                            idx,
                        ),
                        None => Transaction::from_recovered(&recovered),
                    })
                })
                .collect::<Result<Vec<_>, BlockError>>()?;
            BlockTransactions::Full(txs)
        } else {
            BlockTransactions::Hashes(block.body.iter().map(|tx| tx.hash()).collect())
        };

        Ok(Self {
            header: Header::from_primitive(&block.header, hash),
            total_difficulty,
            size: U64::from(alloy_rlp::Encodable::length(block)),
            transactions,
        })
    }
}
