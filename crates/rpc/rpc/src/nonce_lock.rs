//! Per-address serialization of nonce assignment.

use parking_lot::Mutex;
use pocc_primitives::Address;
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one lock per sender address.
///
/// Submissions for the same address hold its lock while they read the pool nonce, sign and submit,
/// so two of them never observe the same next nonce. Addresses never wait on each other: the map
/// mutex is only held to look up or install an entry, never while an address lock is awaited.
///
/// Entries are created on first use and kept for the lifetime of the locker. Clones share the
/// same entries.
///
/// There is no timeout: a submission that never completes keeps its address locked.
#[derive(Clone, Default)]
pub struct AddrLocker {
    locks: Arc<Mutex<HashMap<Address, Arc<AsyncMutex<()>>>>>,
}

impl AddrLocker {
    /// Creates an empty locker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds the lock of `address` and acquires it.
    ///
    /// The lock is released when the returned guard is dropped, on every exit path.
    pub async fn lock_addr(&self, address: Address) -> AddrLockGuard {
        let lock = self.lock_for(address);
        AddrLockGuard { address, _guard: lock.lock_owned().await }
    }

    /// Returns the lock of `address`, installing it on first reference.
    fn lock_for(&self, address: Address) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.locks.lock().entry(address).or_default())
    }

    /// Number of addresses that were ever locked.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns `true` if no address was ever locked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both lockers share the same entries.
    pub fn same_locker(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.locks, &other.locks)
    }
}

impl fmt::Debug for AddrLocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddrLocker").field("addresses", &self.len()).finish()
    }
}

/// Exclusive hold on one address. Unlocks on drop.
#[must_use = "the address is unlocked as soon as the guard is dropped"]
pub struct AddrLockGuard {
    address: Address,
    _guard: OwnedMutexGuard<()>,
}

impl AddrLockGuard {
    /// The locked address.
    pub const fn address(&self) -> Address {
        self.address
    }
}

impl fmt::Debug for AddrLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddrLockGuard").field("address", &self.address).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn same_address_is_exclusive() {
        let locker = AddrLocker::new();
        let addr = Address::with_last_byte(1);

        let guard = locker.lock_addr(addr).await;
        assert_eq!(guard.address(), addr);
        assert!(timeout(Duration::from_millis(50), locker.lock_addr(addr)).await.is_err());

        drop(guard);
        let _guard = timeout(Duration::from_secs(1), locker.lock_addr(addr)).await.unwrap();
    }

    #[tokio::test]
    async fn distinct_addresses_do_not_contend() {
        let locker = AddrLocker::new();
        let _a = locker.lock_addr(Address::with_last_byte(1)).await;
        let _b = timeout(Duration::from_secs(1), locker.lock_addr(Address::with_last_byte(2)))
            .await
            .unwrap();
        assert_eq!(locker.len(), 2);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let locker = AddrLocker::new();
        let clone = locker.clone();
        assert!(locker.same_locker(&clone));
        assert!(!locker.same_locker(&AddrLocker::new()));

        let addr = Address::with_last_byte(7);
        let _guard = locker.lock_addr(addr).await;
        assert!(timeout(Duration::from_millis(50), clone.lock_addr(addr)).await.is_err());
    }

    #[tokio::test]
    async fn entries_are_reused() {
        let locker = AddrLocker::new();
        let addr = Address::with_last_byte(3);
        drop(locker.lock_addr(addr).await);
        drop(locker.lock_addr(addr).await);
        assert_eq!(locker.len(), 1);
    }
}
