//! Per-item mutation locks.
//!
//! A key is "busy" while a mutating request for it is in flight. Busy keys
//! live in a shared map so distinct items never serialize against each
//! other; a [`BusyGuard`] releases its key when dropped, on success, error,
//! or cancellation alike.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;

/// Set of item keys with a mutation in flight.
#[derive(Debug)]
pub struct BusyKeys<K>
where
    K: Eq + Hash + Clone,
{
    keys: Arc<DashMap<K, ()>>,
}

impl<K> BusyKeys<K>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    /// Create an empty lock set.
    pub fn new() -> Self {
        Self {
            keys: Arc::new(DashMap::new()),
        }
    }

    /// Mark `key` busy, or fail with `ErrorKind::Busy` if it already is.
    pub fn try_acquire(&self, key: K) -> AppResult<BusyGuard<K>> {
        match self.keys.entry(key.clone()) {
            Entry::Occupied(_) => Err(AppError::busy(format!(
                "A change for {key} is already in progress"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(BusyGuard {
                    keys: Arc::clone(&self.keys),
                    key,
                })
            }
        }
    }

    /// Whether a mutation for `key` is in flight.
    pub fn is_busy(&self, key: &K) -> bool {
        self.keys.contains_key(key)
    }

    /// Number of busy keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is busy.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K> Default for BusyKeys<K>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Holds one key busy until dropped.
#[derive(Debug)]
pub struct BusyGuard<K>
where
    K: Eq + Hash + Clone,
{
    keys: Arc<DashMap<K, ()>>,
    key: K,
}

impl<K> BusyGuard<K>
where
    K: Eq + Hash + Clone,
{
    /// The key this guard holds.
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K> Drop for BusyGuard<K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderfeed_core::error::ErrorKind;
    use orderfeed_core::types::ProductId;

    #[test]
    fn test_same_key_is_exclusive() {
        let busy = BusyKeys::new();
        let guard = busy.try_acquire(ProductId(42)).expect("first acquire");

        let err = busy.try_acquire(ProductId(42)).expect_err("second acquire");
        assert_eq!(err.kind, ErrorKind::Busy);
        assert!(busy.is_busy(&ProductId(42)));

        drop(guard);
        assert!(!busy.is_busy(&ProductId(42)));
        assert!(busy.try_acquire(ProductId(42)).is_ok());
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let busy = BusyKeys::new();
        let _a = busy.try_acquire(ProductId(1)).expect("a");
        let _b = busy.try_acquire(ProductId(2)).expect("b");
        assert_eq!(busy.len(), 2);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let busy = BusyKeys::new();
        {
            let guard = busy.try_acquire(ProductId(7)).expect("acquire");
            assert_eq!(*guard.key(), ProductId(7));
        }
        assert!(busy.is_empty());
    }
}
