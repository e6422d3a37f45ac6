use pocc_primitives::{
    secret_key_to_address, sign_message, Address, ChainId, Transaction, TransactionSigned,
    TransactionSignedEcRecovered, TxKind, B256, U256,
};
use rand::Rng;
use secp256k1::SecretKey;

/// Generates a random secret key.
pub fn random_secret() -> B256 {
    B256::from(SecretKey::new(&mut secp256k1::rand::thread_rng()).secret_bytes())
}

/// Generates a random address.
pub fn random_address() -> Address {
    Address::from(rand::thread_rng().gen::<[u8; 20]>())
}

/// Signs the transaction with the given secret.
///
/// Panics if the secret is not a valid key.
pub fn sign_tx(secret: B256, tx: Transaction) -> TransactionSigned {
    let signature = sign_message(secret, tx.signature_hash()).expect("valid secret key");
    TransactionSigned::from_transaction_and_signature(tx, signature)
}

/// Creates a signed value transfer from the key `secret` with a gas price of one wei.
pub fn transfer(
    secret: B256,
    nonce: u64,
    to: Address,
    value: U256,
    chain_id: Option<ChainId>,
) -> TransactionSignedEcRecovered {
    let tx = Transaction {
        chain_id,
        nonce,
        gas_price: 1,
        gas_limit: 21_000,
        to: TxKind::Call(to),
        value,
        input: Default::default(),
    };
    let key = SecretKey::from_slice(secret.as_slice()).expect("valid secret key");
    TransactionSignedEcRecovered::from_signed_transaction(
        sign_tx(secret, tx),
        secret_key_to_address(&key),
    )
}
