//! Copy-on-write sets held in stores.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::value::ValueStore;

/// Set of field names shared behind an `Rc`.
pub type FieldSet<K> = Rc<BTreeSet<K>>;

/// Add `item` to (`on`) or remove it from the set in `store`.
///
/// The store keeps its current `Rc` when membership already matches, so no
/// subscriber is notified. Returns whether the set changed.
pub fn toggle<K>(store: &ValueStore<FieldSet<K>>, item: &K, on: bool) -> bool
where
    K: Ord + Clone + 'static,
{
    let changed = store.with(|set| set.contains(item) != on);
    if !changed {
        return false;
    }
    store.update(|set| {
        let mut next = BTreeSet::clone(set);
        if on {
            next.insert(item.clone());
        } else {
            next.remove(item);
        }
        Rc::new(next)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Observable, Readable};

    #[test]
    fn test_toggle_is_idempotent() {
        let store: ValueStore<FieldSet<String>> = ValueStore::default();
        assert!(toggle(&store, &"a".to_string(), true));
        let version = store.version();
        assert!(!toggle(&store, &"a".to_string(), true));
        assert_eq!(store.version(), version);
        assert!(store.get().contains("a"));

        assert!(toggle(&store, &"a".to_string(), false));
        assert!(!toggle(&store, &"b".to_string(), false));
        assert!(store.get().is_empty());
    }
}
