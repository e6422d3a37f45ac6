use crate::{keccak256, Address, Bytes, ChainId, TxHash, TxKind, B256, U256};
use alloy_rlp::{
    length_of_length, Decodable, Encodable, Error as RlpError, Header, EMPTY_STRING_CODE,
};
use std::ops::Deref;

pub use error::InvalidTransactionError;
pub use signature::Signature;

mod error;
mod signature;
pub(crate) mod util;

/// Legacy transaction.
///
/// This is the only transaction envelope the chain accepts. Replay protection follows
/// [EIP-155](https://eips.ethereum.org/EIPS/eip-155) when a chain id is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Transaction {
    /// Added as EIP-155: Simple replay attack protection
    pub chain_id: Option<ChainId>,
    /// A scalar value equal to the number of transactions sent by the sender; formally Tn.
    pub nonce: u64,
    /// A scalar value equal to the number of
    /// Wei to be paid per unit of gas for all computation
    /// costs incurred as a result of the execution of this transaction; formally Tp.
    pub gas_price: u128,
    /// A scalar value equal to the maximum
    /// amount of gas that should be used in executing
    /// this transaction. This is paid up-front, before any
    /// computation is done and may not be increased
    /// later; formally Tg.
    pub gas_limit: u64,
    /// The 160-bit address of the message call's recipient or, for a contract creation
    /// transaction, [TxKind::Create]; formally Tt.
    pub to: TxKind,
    /// A scalar value equal to the number of Wei to
    /// be transferred to the message call's recipient or,
    /// in the case of contract creation, as an endowment
    /// to the newly created account; formally Tv.
    pub value: U256,
    /// Input has two uses depending if transaction is Create or Call (if `to` field is None or
    /// Some). init: An unlimited size byte array specifying the
    /// EVM-code for the account initialisation procedure CREATE,
    /// data: An unlimited size byte array specifying the
    /// input data of the message call, formally Td.
    pub input: Bytes,
}

impl Transaction {
    /// Returns the recipient, `None` for contract creation.
    pub const fn to(&self) -> Option<Address> {
        match self.to {
            TxKind::Call(to) => Some(to),
            TxKind::Create => None,
        }
    }

    /// Returns `true` if this transaction creates a contract.
    pub const fn is_create(&self) -> bool {
        matches!(self.to, TxKind::Create)
    }

    /// The maximum amount the sender pays: `gas_price * gas_limit + value`.
    ///
    /// Returns `None` on overflow.
    pub fn cost(&self) -> Option<U256> {
        U256::from(self.gas_price)
            .checked_mul(U256::from(self.gas_limit))?
            .checked_add(self.value)
    }

    /// Calculates the hash that is signed: the RLP encoding of the fields, extended with
    /// `[chain_id, 0, 0]` when replay protection is enabled.
    pub fn signature_hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(self.payload_len_for_signature());
        self.encode_for_signing(&mut buf);
        keccak256(&buf)
    }

    /// Outputs the length of the transaction's fields, without a RLP header.
    fn fields_len(&self) -> usize {
        self.nonce.length() +
            self.gas_price.length() +
            self.gas_limit.length() +
            self.to.length() +
            self.value.length() +
            self.input.length()
    }

    /// Encodes only the transaction's fields into the desired buffer, without a RLP header.
    fn encode_fields(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.input.encode(out);
    }

    /// Decodes the transaction's fields, without a RLP header. The chain id is not part of the
    /// fields and is left unset.
    fn decode_fields(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self {
            chain_id: None,
            nonce: Decodable::decode(buf)?,
            gas_price: Decodable::decode(buf)?,
            gas_limit: Decodable::decode(buf)?,
            to: Decodable::decode(buf)?,
            value: Decodable::decode(buf)?,
            input: Decodable::decode(buf)?,
        })
    }

    /// Outputs the length of EIP-155 fields. Only outputs a non-zero value for EIP-155 legacy
    /// transactions.
    fn eip155_fields_len(&self) -> usize {
        if let Some(id) = self.chain_id {
            // EIP-155 encodes the chain ID and two zeroes, so we add 2 to the length of the chain
            // ID to get the length of all 3 fields
            id.length() + 2
        } else {
            // this is either a pre-EIP-155 legacy transaction or a typed transaction
            0
        }
    }

    fn payload_len_for_signature(&self) -> usize {
        let payload_length = self.fields_len() + self.eip155_fields_len();
        // 'header length' + 'payload length'
        length_of_length(payload_length) + payload_length
    }

    fn encode_for_signing(&self, out: &mut dyn alloy_rlp::BufMut) {
        Header { list: true, payload_length: self.fields_len() + self.eip155_fields_len() }
            .encode(out);
        self.encode_fields(out);
        if let Some(id) = self.chain_id {
            // EIP-155 encodes the chain ID and two zeroes
            id.encode(out);
            out.put_u8(EMPTY_STRING_CODE);
            out.put_u8(EMPTY_STRING_CODE);
        }
    }
}

/// Signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TransactionSigned {
    /// Transaction hash
    hash: TxHash,
    /// The transaction signature values
    signature: Signature,
    /// Raw transaction info
    transaction: Transaction,
}

impl TransactionSigned {
    /// Create a new signed transaction from a transaction and its signature.
    ///
    /// This will also calculate the transaction hash using its encoding.
    pub fn from_transaction_and_signature(transaction: Transaction, signature: Signature) -> Self {
        let mut initial_tx = Self { transaction, hash: Default::default(), signature };
        initial_tx.hash = keccak256(alloy_rlp::encode(&initial_tx));
        initial_tx
    }

    /// Transaction signature.
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Transaction hash. Used to identify transaction.
    pub const fn hash(&self) -> TxHash {
        self.hash
    }

    /// Reference to the raw transaction info.
    pub const fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Recover signer from signature and hash.
    ///
    /// Returns `None` if the transaction's signature is invalid.
    pub fn recover_signer(&self) -> Option<Address> {
        let signature_hash = self.transaction.signature_hash();
        self.signature.recover_signer(signature_hash)
    }

    /// Consumes the type, recover signer and return [`TransactionSignedEcRecovered`]
    ///
    /// Returns `None` if the transaction's signature is invalid.
    pub fn into_ecrecovered(self) -> Option<TransactionSignedEcRecovered> {
        let signer = self.recover_signer()?;
        Some(TransactionSignedEcRecovered { signed_transaction: self, signer })
    }

    /// Returns the canonical wire encoding of the transaction.
    pub fn envelope_encoded(&self) -> Bytes {
        alloy_rlp::encode(self).into()
    }

    /// Decodes a transaction from its canonical wire encoding.
    ///
    /// Fails if the input holds anything after the transaction.
    pub fn decode_enveloped(mut data: &[u8]) -> alloy_rlp::Result<Self> {
        let tx = Self::decode(&mut data)?;
        if !data.is_empty() {
            return Err(RlpError::UnexpectedLength)
        }
        Ok(tx)
    }

    fn payload_len(&self) -> usize {
        self.transaction.fields_len() +
            self.signature.payload_len_with_eip155_chain_id(self.transaction.chain_id)
    }
}

impl Deref for TransactionSigned {
    type Target = Transaction;

    fn deref(&self) -> &Self::Target {
        &self.transaction
    }
}

impl Encodable for TransactionSigned {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        Header { list: true, payload_length: self.payload_len() }.encode(out);
        self.transaction.encode_fields(out);
        self.signature.encode_with_eip155_chain_id(out, self.transaction.chain_id);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_len();
        length_of_length(payload_length) + payload_length
    }
}

/// This `Decodable` implementation only supports decoding the legacy RLP list format
/// `rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])`.
///
/// The hash is calculated over the exact bytes consumed.
impl Decodable for TransactionSigned {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let original = *buf;
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(RlpError::UnexpectedString)
        }

        let remaining = buf.len();
        let mut transaction = Transaction::decode_fields(buf)?;
        let (signature, chain_id) = Signature::decode_with_eip155_chain_id(buf)?;
        transaction.chain_id = chain_id;

        let consumed = remaining - buf.len();
        if consumed != header.payload_length {
            return Err(RlpError::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            })
        }

        let hash = keccak256(&original[..original.len() - buf.len()]);
        Ok(Self { hash, signature, transaction })
    }
}

/// Signed transaction with recovered signer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionSignedEcRecovered {
    /// Signer of the transaction
    signer: Address,
    /// Signed transaction
    signed_transaction: TransactionSigned,
}

impl TransactionSignedEcRecovered {
    /// Signer of transaction recovered from signature
    pub const fn signer(&self) -> Address {
        self.signer
    }

    /// Transform back to [`TransactionSigned`]
    pub fn into_signed(self) -> TransactionSigned {
        self.signed_transaction
    }

    /// Dissolve Self to its component
    pub fn to_components(self) -> (TransactionSigned, Address) {
        (self.signed_transaction, self.signer)
    }

    /// Create [`TransactionSignedEcRecovered`] from [`TransactionSigned`] and [`Address`] of the
    /// signer.
    pub const fn from_signed_transaction(
        signed_transaction: TransactionSigned,
        signer: Address,
    ) -> Self {
        Self { signed_transaction, signer }
    }
}

impl Deref for TransactionSignedEcRecovered {
    type Target = TransactionSigned;

    fn deref(&self) -> &Self::Target {
        &self.signed_transaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{address, b256, hex, sign_message};
    use assert_matches::assert_matches;
    use secp256k1::SecretKey;
    use std::str::FromStr;

    #[test]
    fn raw_kind_encoding_sanity() {
        // check the 0x80 encoding for Create
        let mut buf = Vec::new();
        TxKind::Create.encode(&mut buf);
        assert_eq!(buf, vec![0x80]);

        // check decoding
        let buf = [0x80];
        let decoded = TxKind::decode(&mut &buf[..]).unwrap();
        assert_eq!(decoded, TxKind::Create);
    }

    #[test]
    fn test_decode_empty_tx() {
        let input = [0x80u8];
        let res = TransactionSigned::decode(&mut &input[..]).unwrap_err();
        assert_eq!(RlpError::UnexpectedString, res);
    }

    #[test]
    fn decode_multiple_network_txs() {
        let bytes = hex!("f86b02843b9aca00830186a094d3e8763675e4c425df46cc3b5c0f6cbdac39604687038d7ea4c68000802ba00eb96ca19e8a77102767a41fc85a36afd5c61ccb09911cec5d3e86e193d9c5aea03a456401896b1b6055311536bf00a718568c744d8c1f9df59879e8350220ca18");
        let transaction = Transaction {
            chain_id: Some(4u64),
            nonce: 2,
            gas_price: 1000000000,
            gas_limit: 100000,
            to: address!("d3e8763675e4c425df46cc3b5c0f6cbdac396046").into(),
            value: U256::from(1000000000000000u64),
            input: Bytes::default(),
        };
        let signature = Signature {
            r: U256::from_str("0xeb96ca19e8a77102767a41fc85a36afd5c61ccb09911cec5d3e86e193d9c5ae")
                .unwrap(),
            s: U256::from_str("0x3a456401896b1b6055311536bf00a718568c744d8c1f9df59879e8350220ca18")
                .unwrap(),
            odd_y_parity: false,
        };
        let hash = b256!("a517b206d2223278f860ea017d3626cacad4f52ff51030dc9a96b432f17f8d34");
        test_decode_and_encode(&bytes, transaction, signature, Some(hash));

        let bytes = hex!("f8650f84832156008287fb94cf7f9e66af820a19257a2108375b180b0ec491678204d2802ca035b7bfeb9ad9ece2cbafaaf8e202e706b4cfaeb233f46198f00b44d4a566a981a0612638fb29427ca33b9a3be2a0a561beecfe0269655be160d35e72d366a6a860");
        let transaction = Transaction {
            chain_id: Some(4),
            nonce: 15,
            gas_price: 2200000000,
            gas_limit: 34811,
            to: address!("cf7f9e66af820a19257a2108375b180b0ec49167").into(),
            value: U256::from(1234),
            input: Bytes::default(),
        };
        let signature = Signature {
            r: U256::from_str("0x35b7bfeb9ad9ece2cbafaaf8e202e706b4cfaeb233f46198f00b44d4a566a981")
                .unwrap(),
            s: U256::from_str("0x612638fb29427ca33b9a3be2a0a561beecfe0269655be160d35e72d366a6a860")
                .unwrap(),
            odd_y_parity: true,
        };
        test_decode_and_encode(&bytes, transaction, signature, None);
    }

    fn test_decode_and_encode(
        bytes: &[u8],
        transaction: Transaction,
        signature: Signature,
        hash: Option<B256>,
    ) {
        let expected = TransactionSigned::from_transaction_and_signature(transaction, signature);
        if let Some(hash) = hash {
            assert_eq!(hash, expected.hash());
        }
        assert_eq!(bytes.len(), expected.length());

        let decoded = TransactionSigned::decode_enveloped(bytes).unwrap();
        assert_eq!(expected, decoded);
        assert_eq!(bytes, &alloy_rlp::encode(expected));
    }

    #[test]
    fn decode_raw_tx_and_recover_signer() {
        // transaction is from ropsten
        let hash = b256!("559fb34c4a7f115db26cbf8505389475caaab3df45f5c7a0faa4abfa3835306c");
        let signer = address!("641c5d790f862a58ec7abcfd644c0442e9c201b3");
        let raw = hex!("f88b8212b085028fa6ae00830f424094aad593da0c8116ef7d2d594dd6a63241bccfc26c80a48318b64b000000000000000000000000641c5d790f862a58ec7abcfd644c0442e9c201b32aa0a6ef9e170bca5ffb7ac05433b13b7043de667fbb0b4a5e45d3b54fb2d6efcc63a0037ec2c05c3d60c5f5f78244ce0a3859e3a18a36c61efb061b383507d3ce19d2");

        let tx = TransactionSigned::decode_enveloped(&raw).unwrap();
        assert_eq!(tx.hash(), hash, "Expected same hash");
        assert_eq!(tx.chain_id, Some(3));
        assert_eq!(tx.recover_signer(), Some(signer), "Recovering signer should pass.");
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut raw = hex!("f86b02843b9aca00830186a094d3e8763675e4c425df46cc3b5c0f6cbdac39604687038d7ea4c68000802ba00eb96ca19e8a77102767a41fc85a36afd5c61ccb09911cec5d3e86e193d9c5aea03a456401896b1b6055311536bf00a718568c744d8c1f9df59879e8350220ca18").to_vec();
        raw.push(0x01);
        assert_matches!(TransactionSigned::decode_enveloped(&raw), Err(RlpError::UnexpectedLength));
    }

    #[test]
    fn sign_and_recover_roundtrip() {
        let secret = SecretKey::new(&mut rand::thread_rng());
        let sender = util::secp256k1::secret_key_to_address(&secret);

        let transaction = Transaction {
            chain_id: Some(1),
            nonce: 7,
            gas_price: 20_000_000_000,
            gas_limit: 90_000,
            to: TxKind::Create,
            value: U256::ZERO,
            input: Bytes::from_static(&[0x60, 0x00]),
        };
        let signature =
            sign_message(B256::from_slice(&secret.secret_bytes()), transaction.signature_hash())
                .unwrap();
        let signed = TransactionSigned::from_transaction_and_signature(transaction, signature);

        let recovered = signed.clone().into_ecrecovered().unwrap();
        assert_eq!(recovered.signer(), sender);
        assert!(recovered.is_create());

        // a different chain id changes the signing payload
        let mut replayed = signed.transaction().clone();
        replayed.chain_id = Some(2);
        let replayed = TransactionSigned::from_transaction_and_signature(replayed, signature);
        assert_ne!(replayed.recover_signer(), Some(sender));
    }

    #[test]
    fn cost_includes_value() {
        let tx = Transaction {
            gas_price: 2,
            gas_limit: 21_000,
            value: U256::from(5),
            ..Default::default()
        };
        assert_eq!(tx.cost(), Some(U256::from(42_005)));

        let tx = Transaction { gas_price: u128::MAX, gas_limit: u64::MAX, value: U256::MAX, ..Default::default() };
        assert_eq!(tx.cost(), None);
    }
}
