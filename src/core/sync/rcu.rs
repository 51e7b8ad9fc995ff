/*!
 * Read-Copy-Update (RCU) Cell
 * Zero-contention reads for the live policy and content snapshots
 */

use arc_swap::{ArcSwap, Guard};
use std::sync::Arc;

/// RCU-protected value with zero-contention reads
///
/// # Performance
///
/// - **Reads**: atomic pointer load, never blocked by a writer
/// - **Writes**: build a new value off to the side, then swap the pointer
///
/// A reader that took a snapshot keeps evaluating against it after a swap;
/// the old value is dropped once the last snapshot goes away.
pub struct RcuCell<T> {
    inner: ArcSwap<T>,
}

impl<T> RcuCell<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            inner: ArcSwap::from_pointee(value),
        }
    }

    /// Load current snapshot (zero-contention)
    #[inline(always)]
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replace value entirely
    #[inline]
    pub fn store(&self, new_value: Arc<T>) {
        self.inner.store(new_value);
    }

    /// Install `new_value` only if the cell still holds `expected`
    ///
    /// On failure the cell is unchanged and the value found there is returned.
    pub fn compare_and_store(&self, expected: &Arc<T>, new_value: Arc<T>) -> Result<(), Arc<T>> {
        let previous = self.inner.compare_and_swap(expected, new_value);
        if Arc::ptr_eq(&previous, expected) {
            Ok(())
        } else {
            Err(Guard::into_inner(previous))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::thread;

    #[test]
    fn test_snapshot_survives_store() {
        let cell = RcuCell::new(String::from("old"));
        let snapshot = cell.load();

        cell.store(Arc::new(String::from("new")));
        assert_eq!(snapshot.as_str(), "old");
        assert_eq!(cell.load().as_str(), "new");
    }

    #[test]
    fn test_compare_and_store_from_stale_snapshot() {
        let cell = RcuCell::new(1);
        let stale = cell.load();
        assert!(cell.compare_and_store(&stale, Arc::new(2)).is_ok());

        let current = cell.compare_and_store(&stale, Arc::new(3)).unwrap_err();
        assert_eq!(*current, 2);
        assert_eq!(*cell.load(), 2);
    }

    #[test]
    fn test_concurrent_reads() {
        let cell = RcuCell::new(HashMap::from([("key1", 0), ("key2", 0)]));

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..5_000 {
                        let map = cell.load();
                        // Both keys always come from the same snapshot
                        assert_eq!(map["key2"], map["key1"] * 2);
                    }
                });
            }

            scope.spawn(|| {
                for i in 1..100 {
                    cell.store(Arc::new(HashMap::from([("key1", i), ("key2", i * 2)])));
                }
            });
        });
    }
}
