//! Advisory lock registry.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use formstate_store::{Readonly, ValueStore};

/// What a lock holds: the whole form or one field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey<F> {
    Form,
    Field(F),
}

/// Active handle ids per key. Keys with no handles are absent.
pub type LockMap<F> = Rc<BTreeMap<LockKey<F>, Rc<BTreeSet<u64>>>>;

/// Releases its lock when dropped or on [`release`](Self::release).
#[must_use = "dropping a LockHandle releases the lock immediately"]
pub struct LockHandle {
    release: Option<Box<dyn FnOnce()>>,
}

impl LockHandle {
    /// Release now. Later calls, and the eventual drop, do nothing.
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_held(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("held", &self.is_held())
            .finish()
    }
}

pub(crate) struct Locks<F: Ord> {
    store: ValueStore<LockMap<F>>,
    next_id: Cell<u64>,
}

impl<F> Locks<F>
where
    F: Ord + Clone + fmt::Debug + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            store: ValueStore::default(),
            next_id: Cell::new(0),
        }
    }

    pub(crate) fn acquire(&self, key: LockKey<F>) -> LockHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.store.update(|locks| {
            let mut next = BTreeMap::clone(locks);
            let mut ids = next.get(&key).map(|ids| BTreeSet::clone(ids)).unwrap_or_default();
            ids.insert(id);
            next.insert(key.clone(), Rc::new(ids));
            Rc::new(next)
        });
        tracing::trace!(?key, id, "lock acquired");

        let store = self.store.clone();
        LockHandle {
            release: Some(Box::new(move || release(&store, &key, id))),
        }
    }

    pub(crate) fn is_held(&self, key: &LockKey<F>) -> bool {
        self.store.with(|locks| locks.contains_key(key))
    }

    pub(crate) fn is_field_locked(&self, field: &F) -> bool {
        self.store.with(|locks| {
            locks.contains_key(&LockKey::Form) || locks.contains_key(&LockKey::Field(field.clone()))
        })
    }

    pub(crate) fn clear(&self) {
        self.store.set(Rc::default());
    }

    pub(crate) fn readonly(&self) -> Readonly<LockMap<F>> {
        self.store.readonly()
    }
}

/// Drop `id` from `key`'s live set; a handle that is not live is ignored.
fn release<F>(store: &ValueStore<LockMap<F>>, key: &LockKey<F>, id: u64)
where
    F: Ord + Clone + fmt::Debug + 'static,
{
    let live = store.with(|locks| locks.get(key).is_some_and(|ids| ids.contains(&id)));
    if !live {
        tracing::trace!(?key, id, "stale lock release ignored");
        return;
    }
    store.update(|locks| {
        let mut next = BTreeMap::clone(locks);
        let remaining: BTreeSet<u64> = next
            .get(key)
            .map(|ids| ids.iter().copied().filter(|other| *other != id).collect())
            .unwrap_or_default();
        if remaining.is_empty() {
            next.remove(key);
        } else {
            next.insert(key.clone(), Rc::new(remaining));
        }
        Rc::new(next)
    });
    tracing::trace!(?key, id, "lock released");
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstate_store::Readable;

    #[test]
    fn test_key_removed_when_last_handle_released() {
        let locks = Locks::<String>::new();
        let mut first = locks.acquire(LockKey::Form);
        let second = locks.acquire(LockKey::Form);
        first.release();
        assert!(locks.is_held(&LockKey::Form));
        drop(second);
        assert!(!locks.is_held(&LockKey::Form));
        assert!(locks.readonly().get().is_empty());
    }

    #[test]
    fn test_release_is_idempotent() {
        let locks = Locks::<String>::new();
        let mut handle = locks.acquire(LockKey::Field("a".into()));
        let _other = locks.acquire(LockKey::Field("a".into()));
        handle.release();
        handle.release();
        drop(handle);
        assert!(locks.is_field_locked(&"a".to_string()));
    }

    #[test]
    fn test_form_lock_covers_every_field() {
        let locks = Locks::<String>::new();
        let _form = locks.acquire(LockKey::Form);
        assert!(locks.is_field_locked(&"anything".to_string()));
    }

    #[test]
    fn test_release_after_clear_is_ignored() {
        let locks = Locks::<String>::new();
        let handle = locks.acquire(LockKey::Form);
        locks.clear();
        let _fresh = locks.acquire(LockKey::Form);
        drop(handle);
        assert!(locks.is_held(&LockKey::Form));
    }
}
