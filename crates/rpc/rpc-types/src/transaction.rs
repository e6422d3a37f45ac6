use crate::{call::pick_input, ConflictingInputs};
use pocc_primitives::{
    Address, BlockHash, BlockNumber, Bytes, TransactionSignedEcRecovered, TxHash, U256, U64,
};
use serde::{Deserialize, Serialize};

/// Transaction object used in RPC
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Hash
    pub hash: TxHash,
    /// Nonce
    pub nonce: U64,
    /// Block hash, `None` while pooled
    pub block_hash: Option<BlockHash>,
    /// Block number, `None` while pooled
    pub block_number: Option<U64>,
    /// Transaction Index, `None` while pooled
    pub transaction_index: Option<U64>,
    /// Sender
    pub from: Address,
    /// Recipient, `None` for contract creation
    pub to: Option<Address>,
    /// Transferred value
    pub value: U256,
    /// Gas Price
    pub gas_price: U256,
    /// Gas amount
    pub gas: U64,
    /// Data
    pub input: Bytes,
    /// The `v` value including the replay protection offset
    pub v: U64,
    /// The `r` value
    pub r: U256,
    /// The `s` value
    pub s: U256,
    /// The chain id of the transaction, if any.
    pub chain_id: Option<U64>,
}

impl Transaction {
    /// Converts a pooled transaction; block fields stay empty.
    pub fn from_recovered(tx: &TransactionSignedEcRecovered) -> Self {
        let signature = tx.signature();
        Self {
            hash: tx.hash(),
            nonce: U64::from(tx.nonce),
            block_hash: None,
            block_number: None,
            transaction_index: None,
            from: tx.signer(),
            to: tx.to(),
            value: tx.value,
            gas_price: U256::from(tx.gas_price),
            gas: U64::from(tx.gas_limit),
            input: tx.input.clone(),
            v: U64::from(signature.v(tx.chain_id)),
            r: signature.r,
            s: signature.s,
            chain_id: tx.chain_id.map(U64::from),
        }
    }

    /// Converts a mined transaction at position `index` of the given block.
    pub fn from_recovered_with_block_context(
        tx: &TransactionSignedEcRecovered,
        block_hash: BlockHash,
        block_number: BlockNumber,
        index: usize,
    ) -> Self {
        Self {
            block_hash: Some(block_hash),
            block_number: Some(U64::from(block_number)),
            transaction_index: Some(U64::from(index)),
            ..Self::from_recovered(tx)
        }
    }
}

/// Arguments of `sendTransaction`.
///
/// Only the sender is mandatory; the node fills in the remaining fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Sender, must be a managed account
    pub from: Address,
    /// Recipient, `None` deploys a contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
    /// Gas price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// Transferred value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Nonce, picked from the pool when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U64>,
    /// Data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Input, the newer name of `data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Bytes>,
}

impl TransactionRequest {
    /// Returns the transaction data, preferring `input` over `data`.
    ///
    /// Fails if both are set and differ.
    pub fn input_data(&self) -> Result<Option<Bytes>, ConflictingInputs> {
        pick_input(&self.data, &self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocc_primitives::{
        address, Signature, Transaction as PrimitiveTransaction, TransactionSigned, TxKind,
    };

    #[test]
    fn serde_transaction() {
        let transaction = PrimitiveTransaction {
            chain_id: Some(4),
            nonce: 2,
            gas_price: 1_000_000_000,
            gas_limit: 21_000,
            to: TxKind::Call(address!("d3e8763675e4c425df46cc3b5c0f6cbdac396046")),
            value: U256::from(1),
            input: Bytes::new(),
        };
        let signed = TransactionSigned::from_transaction_and_signature(
            transaction,
            Signature { r: U256::from(1), s: U256::from(2), odd_y_parity: true },
        );
        let sender = address!("0000000000000000000000000000000000000009");
        let recovered = TransactionSignedEcRecovered::from_signed_transaction(signed, sender);

        let tx = Transaction::from_recovered(&recovered);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["nonce"], "0x2");
        assert_eq!(json["gasPrice"], "0x3b9aca00");
        assert_eq!(json["v"], "0x2c");
        assert_eq!(json["blockHash"], serde_json::Value::Null);
        assert_eq!(json["from"], "0x0000000000000000000000000000000000000009");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn serde_transaction_request() {
        let s = r#"{"from":"0x0000000000000000000000000000000000000001","value":"0x10"}"#;
        let req = serde_json::from_str::<TransactionRequest>(s).unwrap();
        assert_eq!(req.value, Some(U256::from(16)));
        assert!(req.nonce.is_none());
        assert_eq!(req.input_data().unwrap(), None);

        // the sender is mandatory
        assert!(serde_json::from_str::<TransactionRequest>(r#"{"value":"0x10"}"#).is_err());
    }
}
