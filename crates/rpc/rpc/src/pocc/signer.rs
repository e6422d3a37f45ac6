//! An in-memory key store and the message signing helpers shared by `pocc_sign` and the
//! `personal_` namespace.

use parking_lot::RwLock;
use pocc_interfaces::{AccountManager, SignError};
use pocc_primitives::{
    keccak256, recover_signer, secret_key_to_address, sign_message, Address, Signature, B256,
};
use secp256k1::SecretKey;
use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

/// Hashes a message the way `personal_sign` and `pocc_sign` do.
///
/// `keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)`
pub fn hash_message(message: impl AsRef<[u8]>) -> B256 {
    let message = message.as_ref();
    let mut data = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    data.extend_from_slice(message);
    keccak256(data)
}

/// Recovers the signer of a signed text message.
///
/// `signature` is `r || s || v` with `v` in `{27, 28}`.
pub fn recover_message_signer(message: impl AsRef<[u8]>, signature: &[u8]) -> Option<Address> {
    let mut sig: [u8; 65] = signature.try_into().ok()?;
    if sig[64] != 27 && sig[64] != 28 {
        return None
    }
    sig[64] -= 27;
    recover_signer(&sig, &hash_message(message).0).ok()
}

/// Unlock state of a stored key.
#[derive(Debug, Clone, Copy)]
enum Unlocked {
    Until(Instant),
    Forever,
}

struct StoredKey {
    secret: SecretKey,
    passphrase: B256,
    unlocked: Option<Unlocked>,
}

impl StoredKey {
    fn check(&self, passphrase: &str) -> Result<(), SignError> {
        if keccak256(passphrase) == self.passphrase {
            Ok(())
        } else {
            Err(SignError::InvalidPassphrase)
        }
    }

    fn is_unlocked(&self, now: Instant) -> bool {
        match self.unlocked {
            Some(Unlocked::Forever) => true,
            Some(Unlocked::Until(deadline)) => now < deadline,
            None => false,
        }
    }

    fn sign(&self, hash: B256) -> Result<Signature, SignError> {
        sign_message(B256::from(self.secret.secret_bytes()), hash).map_err(|_| SignError::InvalidKey)
    }
}

#[derive(Default)]
struct Inner {
    /// Addresses in creation order
    addresses: Vec<Address>,
    keys: HashMap<Address, StoredKey>,
}

/// An [`AccountManager`] keeping secp256k1 keys in memory.
///
/// Keys are protected by a passphrase and start locked. An unlock with a duration expires on
/// its own.
#[derive(Default)]
pub struct KeyStore {
    inner: RwLock<Inner>,
}

impl KeyStore {
    /// Creates an empty key store.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, secret: SecretKey, passphrase: &str) -> Result<Address, SignError> {
        let address = secret_key_to_address(&secret);
        let mut inner = self.inner.write();
        if inner.keys.contains_key(&address) {
            return Err(SignError::AccountExists(address))
        }
        inner.addresses.push(address);
        inner
            .keys
            .insert(address, StoredKey { secret, passphrase: keccak256(passphrase), unlocked: None });
        Ok(address)
    }
}

impl AccountManager for KeyStore {
    fn accounts(&self) -> Vec<Address> {
        self.inner.read().addresses.clone()
    }

    fn has_account(&self, address: Address) -> bool {
        self.inner.read().keys.contains_key(&address)
    }

    fn new_account(&self, passphrase: &str) -> Result<Address, SignError> {
        let secret = SecretKey::new(&mut secp256k1::rand::thread_rng());
        self.insert(secret, passphrase)
    }

    fn import_raw_key(&self, secret: B256, passphrase: &str) -> Result<Address, SignError> {
        let secret = SecretKey::from_slice(secret.as_slice()).map_err(|_| SignError::InvalidKey)?;
        self.insert(secret, passphrase)
    }

    fn unlock(
        &self,
        address: Address,
        passphrase: &str,
        duration: Option<Duration>,
    ) -> Result<(), SignError> {
        let mut inner = self.inner.write();
        let key = inner.keys.get_mut(&address).ok_or(SignError::UnknownAccount(address))?;
        key.check(passphrase)?;
        key.unlocked = Some(match duration {
            Some(duration) => Unlocked::Until(Instant::now() + duration),
            None => Unlocked::Forever,
        });
        Ok(())
    }

    fn lock(&self, address: Address) -> Result<(), SignError> {
        let mut inner = self.inner.write();
        let key = inner.keys.get_mut(&address).ok_or(SignError::UnknownAccount(address))?;
        key.unlocked = None;
        Ok(())
    }

    fn sign_hash(&self, address: Address, hash: B256) -> Result<Signature, SignError> {
        let inner = self.inner.read();
        let key = inner.keys.get(&address).ok_or(SignError::UnknownAccount(address))?;
        if !key.is_unlocked(Instant::now()) {
            return Err(SignError::Locked(address))
        }
        key.sign(hash)
    }

    fn sign_hash_with_passphrase(
        &self,
        address: Address,
        passphrase: &str,
        hash: B256,
    ) -> Result<Signature, SignError> {
        let inner = self.inner.read();
        let key = inner.keys.get(&address).ok_or(SignError::UnknownAccount(address))?;
        key.check(passphrase)?;
        key.sign(hash)
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore").field("accounts", &self.inner.read().addresses).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pocc_primitives::b256;

    const SECRET: B256 = b256!("4646464646464646464646464646464646464646464646464646464646464646");

    #[test]
    fn import_and_sign() {
        let store = KeyStore::new();
        let address = store.import_raw_key(SECRET, "pass").unwrap();
        // the EIP-155 example key
        assert_eq!(address, pocc_primitives::address!("9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"));
        assert_eq!(store.accounts(), vec![address]);
        assert!(store.has_account(address));

        let hash = B256::with_last_byte(1);
        assert_matches!(store.sign_hash(address, hash), Err(SignError::Locked(a)) if a == address);
        assert_matches!(
            store.sign_hash_with_passphrase(address, "wrong", hash),
            Err(SignError::InvalidPassphrase)
        );

        let signature = store.sign_hash_with_passphrase(address, "pass", hash).unwrap();
        assert_eq!(signature.recover_signer(hash), Some(address));
    }

    #[test]
    fn unlock_and_lock() {
        let store = KeyStore::new();
        let address = store.new_account("pass").unwrap();
        let hash = B256::with_last_byte(2);

        assert_matches!(store.unlock(address, "nope", None), Err(SignError::InvalidPassphrase));
        store.unlock(address, "pass", None).unwrap();
        assert!(store.sign_hash(address, hash).is_ok());

        store.lock(address).unwrap();
        assert_matches!(store.sign_hash(address, hash), Err(SignError::Locked(_)));
    }

    #[test]
    fn unlock_expires() {
        let store = KeyStore::new();
        let address = store.new_account("pass").unwrap();
        store.unlock(address, "pass", Some(Duration::ZERO)).unwrap();
        assert_matches!(
            store.sign_hash(address, B256::with_last_byte(3)),
            Err(SignError::Locked(_))
        );
    }

    #[test]
    fn duplicate_and_unknown_accounts() {
        let store = KeyStore::new();
        let address = store.import_raw_key(SECRET, "a").unwrap();
        assert_matches!(store.import_raw_key(SECRET, "b"), Err(SignError::AccountExists(a)) if a == address);
        assert_matches!(store.import_raw_key(B256::ZERO, "b"), Err(SignError::InvalidKey));
        assert_matches!(
            store.lock(Address::with_last_byte(1)),
            Err(SignError::UnknownAccount(_))
        );
    }

    #[test]
    fn sign_and_recover_message() {
        let store = KeyStore::new();
        let address = store.import_raw_key(SECRET, "pass").unwrap();
        let message = b"hello pocc";

        let signature = store
            .sign_hash_with_passphrase(address, "pass", hash_message(message))
            .unwrap()
            .to_rsv_bytes();
        assert!(signature[64] == 27 || signature[64] == 28);
        assert_eq!(recover_message_signer(message, &signature), Some(address));

        let mut bad_v = signature;
        bad_v[64] = 1;
        assert_eq!(recover_message_signer(message, &bad_v), None);
        assert_eq!(recover_message_signer(message, &signature[..64]), None);
    }
}
