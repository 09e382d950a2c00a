use crate::core::Transaction;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Unconfirmed transactions in admission order.
///
/// A poisoned lock is recovered; no operation here can leave the vector
/// half-updated.
pub struct MemoryPool {
    inner: RwLock<Vec<Transaction>>,
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool {
            inner: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, tx: Transaction) {
        self.write().push(tx);
    }

    /// Value copies of every pooled transaction, in order. The proof-of-work
    /// search iterates this snapshot while the live pool stays writable.
    pub fn get_all(&self) -> Vec<Transaction> {
        self.read().clone()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Transaction>> {
        self.inner.read().unwrap_or_else(|poisoned| {
            log::warn!("Memory pool lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Transaction>> {
        self.inner.write().unwrap_or_else(|poisoned| {
            log::warn!("Memory pool lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}
