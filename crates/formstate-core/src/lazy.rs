//! Compute-once bindings cached per instance.
//!
//! Forms and field views expose dozens of derived stores. None of them is
//! built until first requested, and every later request returns the same
//! store, so subscribers always share one instance.

use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

/// A value computed on first access and reused afterwards.
pub struct Memo<T> {
    cell: OnceCell<T>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }
}

impl<T: Clone> Memo<T> {
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> T {
        self.cell.get_or_init(init).clone()
    }

    pub fn get(&self) -> Option<T> {
        self.cell.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("initialized", &self.cell.get().is_some())
            .finish()
    }
}

/// A keyed family of [`Memo`]s.
///
/// `init` runs without any borrow held, so it may itself use the map for
/// other keys. If it ends up inserting the same key, the first insertion wins.
pub struct MemoMap<K, V> {
    entries: RefCell<BTreeMap<K, V>>,
}

impl<K, V> Default for MemoMap<K, V> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
        }
    }
}

impl<K: Ord + Clone, V: Clone> MemoMap<K, V> {
    pub fn get_or_insert_with(&self, key: &K, init: impl FnOnce() -> V) -> V {
        if let Some(value) = self.entries.borrow().get(key) {
            return value.clone();
        }
        let value = init();
        self.entries
            .borrow_mut()
            .entry(key.clone())
            .or_insert(value)
            .clone()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forget every entry; the next request for a key builds it again.
    pub fn clear(&self) {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        drop(entries);
    }
}

impl<K: fmt::Debug, V> fmt::Debug for MemoMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.borrow().keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_memo_runs_init_once() {
        let calls = Cell::new(0);
        let memo = Memo::default();
        for _ in 0..3 {
            let value = memo.get_or_init(|| {
                calls.set(calls.get() + 1);
                7
            });
            assert_eq!(value, 7);
        }
        assert_eq!(calls.get(), 1);
        assert!(memo.is_initialized());
    }

    #[test]
    fn test_memo_map_allows_nested_init() {
        let map: MemoMap<u8, String> = MemoMap::default();
        let outer = map.get_or_insert_with(&1, || {
            let inner = map.get_or_insert_with(&2, || "two".to_string());
            format!("one+{inner}")
        });
        assert_eq!(outer, "one+two");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_or_insert_with(&1, || unreachable!()), "one+two");
    }

    #[test]
    fn test_memo_map_clear_rebuilds() {
        let map: MemoMap<u8, u32> = MemoMap::default();
        map.get_or_insert_with(&1, || 10);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.get_or_insert_with(&1, || 11), 11);
    }
}
