use pocc_primitives::{Address, Signature, Transaction, TransactionSigned, B256};
use std::time::Duration;

/// Errors raised by an [`AccountManager`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    /// No key is stored for the address.
    #[error("no key for given address or file")]
    UnknownAccount(Address),
    /// The key exists but must be unlocked, or a passphrase supplied, first.
    #[error("authentication needed: password or unlock")]
    Locked(Address),
    /// The passphrase does not match.
    #[error("could not decrypt key with given passphrase")]
    InvalidPassphrase,
    /// The key is already stored.
    #[error("account already exists")]
    AccountExists(Address),
    /// The secret is not a valid secp256k1 key.
    #[error("invalid private key")]
    InvalidKey,
}

/// Key storage and signing.
///
/// Only hashes are signed; callers compute the hash of what they sign.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait AccountManager: Send + Sync {
    /// All managed addresses, in creation order.
    fn accounts(&self) -> Vec<Address>;

    /// Returns `true` if the address is managed.
    fn has_account(&self, address: Address) -> bool {
        self.accounts().contains(&address)
    }

    /// Creates a new key protected by the passphrase.
    fn new_account(&self, passphrase: &str) -> Result<Address, SignError>;

    /// Stores the given secret key protected by the passphrase.
    fn import_raw_key(&self, secret: B256, passphrase: &str) -> Result<Address, SignError>;

    /// Unlocks the key for signing without a passphrase, until `duration` elapses or forever if
    /// `None`.
    fn unlock(
        &self,
        address: Address,
        passphrase: &str,
        duration: Option<Duration>,
    ) -> Result<(), SignError>;

    /// Locks the key again.
    fn lock(&self, address: Address) -> Result<(), SignError>;

    /// Signs the hash with an unlocked key.
    fn sign_hash(&self, address: Address, hash: B256) -> Result<Signature, SignError>;

    /// Signs the hash, unlocking the key with the passphrase for this one signature.
    fn sign_hash_with_passphrase(
        &self,
        address: Address,
        passphrase: &str,
        hash: B256,
    ) -> Result<Signature, SignError>;

    /// Signs a transaction with an unlocked key.
    fn sign_transaction(
        &self,
        address: Address,
        transaction: Transaction,
    ) -> Result<TransactionSigned, SignError> {
        let signature = self.sign_hash(address, transaction.signature_hash())?;
        Ok(TransactionSigned::from_transaction_and_signature(transaction, signature))
    }

    /// Signs a transaction with the passphrase of the key.
    fn sign_transaction_with_passphrase(
        &self,
        address: Address,
        passphrase: &str,
        transaction: Transaction,
    ) -> Result<TransactionSigned, SignError> {
        let signature =
            self.sign_hash_with_passphrase(address, passphrase, transaction.signature_hash())?;
        Ok(TransactionSigned::from_transaction_and_signature(transaction, signature))
    }
}
