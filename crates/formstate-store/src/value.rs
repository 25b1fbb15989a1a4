//! Writable value container.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::listeners::{Listeners, Subscription};
use crate::same::Same;
use crate::traits::{Observable, Readable, Writable};

struct Inner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    listeners: Listeners,
}

/// Holds a value and notifies subscribers when it changes.
///
/// `set` and `update` are no-ops when the new value is [`Same`] as the
/// current one.
pub struct ValueStore<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for ValueStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Same + 'static> ValueStore<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                version: Cell::new(0),
                listeners: Listeners::default(),
            }),
        }
    }

    /// Replace the value; returns whether subscribers were notified.
    pub fn set(&self, value: T) -> bool {
        if self.inner.value.borrow().same(&value) {
            return false;
        }
        *self.inner.value.borrow_mut() = value;
        self.inner.version.set(self.inner.version.get() + 1);
        tracing::trace!(
            version = self.inner.version.get(),
            listeners = self.inner.listeners.len(),
            "store changed"
        );
        self.inner.listeners.notify();
        true
    }

    /// Replace the value with `updater(current)`.
    pub fn update(&self, updater: impl FnOnce(&T) -> T) -> bool {
        let current = self.inner.value.borrow().clone();
        self.set(updater(&current))
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Read-only handle to the same store.
    pub fn readonly(&self) -> Readonly<T> {
        Readonly {
            store: self.clone(),
        }
    }

    /// Whether both handles point to the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl<T: Clone + Same + Default + 'static> Default for ValueStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Same + 'static> Observable for ValueStore<T> {
    fn version(&self) -> u64 {
        self.inner.version.get()
    }

    fn watch(&self, listener: Rc<dyn Fn()>) -> Subscription {
        let id = self.inner.listeners.add(listener);
        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.remove(id);
            }
        })
    }
}

impl<T: Clone + Same + 'static> Readable for ValueStore<T> {
    type Value = T;

    fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: Clone + Same + 'static> Writable for ValueStore<T> {
    fn set(&self, value: T) {
        ValueStore::set(self, value);
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStore")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

/// Read-only view of a [`ValueStore`].
pub struct Readonly<T> {
    store: ValueStore<T>,
}

impl<T> Clone for Readonly<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T: Clone + Same + 'static> Observable for Readonly<T> {
    fn version(&self) -> u64 {
        self.store.version()
    }

    fn watch(&self, listener: Rc<dyn Fn()>) -> Subscription {
        self.store.watch(listener)
    }
}

impl<T: Clone + Same + 'static> Readable for Readonly<T> {
    type Value = T;

    fn get(&self) -> T {
        self.store.get()
    }
}

impl<T: fmt::Debug> fmt::Debug for Readonly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Readonly").field(&self.store).finish()
    }
}
