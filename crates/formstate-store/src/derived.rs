//! Lazily computed stores.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::listeners::{Listeners, Subscription};
use crate::same::Same;
use crate::traits::{Observable, Readable};

struct Inner<T> {
    sources: Vec<Rc<dyn Observable>>,
    compute: Box<dyn Fn() -> T>,
    cache: RefCell<Option<T>>,
    seen: RefCell<Vec<u64>>,
    version: Cell<u64>,
    /// Version last delivered to subscribers.
    notified: Cell<u64>,
    listeners: Listeners,
    upstream: RefCell<Vec<Subscription>>,
}

impl<T: Clone + Same + 'static> Inner<T> {
    /// Recompute when any source moved past the versions seen last time.
    ///
    /// Sources refresh themselves when asked for their version, so a read
    /// always sees a consistent picture even when two sources share an
    /// upstream store.
    fn refresh(&self) {
        let current: Vec<u64> = self.sources.iter().map(|source| source.version()).collect();
        let stale = self.cache.borrow().is_none() || *self.seen.borrow() != current;
        if !stale {
            return;
        }

        let value = (self.compute)();
        *self.seen.borrow_mut() = current;
        let changed = match self.cache.borrow().as_ref() {
            Some(previous) => !previous.same(&value),
            None => true,
        };
        if changed {
            *self.cache.borrow_mut() = Some(value);
            self.version.set(self.version.get() + 1);
        }
    }

    /// Reads refresh the cache too, so compare against what subscribers
    /// were last told rather than the version before this refresh.
    fn connect(self: &Rc<Self>) {
        self.refresh();
        self.notified.set(self.version.get());
        let mut subscriptions = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let weak: Weak<Self> = Rc::downgrade(self);
            subscriptions.push(source.watch(Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.refresh();
                    let current = inner.version.get();
                    if current != inner.notified.get() {
                        inner.notified.set(current);
                        inner.listeners.notify();
                    }
                }
            })));
        }
        *self.upstream.borrow_mut() = subscriptions;
    }

    fn disconnect(&self) {
        let subscriptions = std::mem::take(&mut *self.upstream.borrow_mut());
        drop(subscriptions);
    }
}

/// A store computed from other stores.
///
/// The value is cached and recomputed only when a source changed. Upstream
/// subscriptions exist only while this store has subscribers itself; reads
/// without subscribers pull fresh values on demand.
pub struct Derived<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Same + 'static> Derived<T> {
    /// Derive from arbitrary sources; `compute` reads them itself.
    pub fn new(sources: Vec<Rc<dyn Observable>>, compute: impl Fn() -> T + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                sources,
                compute: Box::new(compute),
                cache: RefCell::new(None),
                seen: RefCell::new(Vec::new()),
                version: Cell::new(0),
                notified: Cell::new(0),
                listeners: Listeners::default(),
                upstream: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Whether upstream subscriptions are currently held.
    pub fn is_connected(&self) -> bool {
        !self.inner.upstream.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + Same + 'static> Observable for Derived<T> {
    fn version(&self) -> u64 {
        self.inner.refresh();
        self.inner.version.get()
    }

    fn watch(&self, listener: Rc<dyn Fn()>) -> Subscription {
        let first = self.inner.listeners.is_empty();
        let id = self.inner.listeners.add(listener);
        if first {
            self.inner.connect();
        }
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.remove(id);
                if inner.listeners.is_empty() {
                    inner.disconnect();
                }
            }
        })
    }
}

impl<T: Clone + Same + 'static> Readable for Derived<T> {
    type Value = T;

    fn get(&self) -> T {
        self.inner.refresh();
        if let Some(value) = self.inner.cache.borrow().as_ref() {
            return value.clone();
        }
        (self.inner.compute)()
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("cache", &self.inner.cache.borrow())
            .field("sources", &self.inner.sources.len())
            .field("subscribers", &self.inner.listeners.len())
            .finish()
    }
}

/// Derive a store from one source.
pub fn derived<S, R>(source: &S, map: impl Fn(&S::Value) -> R + 'static) -> Derived<R>
where
    S: Readable,
    R: Clone + Same + 'static,
{
    let reader = source.clone();
    let sources: Vec<Rc<dyn Observable>> = vec![Rc::new(source.clone())];
    Derived::new(sources, move || map(&reader.get()))
}

/// Derive a store from two sources.
pub fn derived2<A, B, R>(
    a: &A,
    b: &B,
    map: impl Fn(&A::Value, &B::Value) -> R + 'static,
) -> Derived<R>
where
    A: Readable,
    B: Readable,
    R: Clone + Same + 'static,
{
    let (read_a, read_b) = (a.clone(), b.clone());
    let sources: Vec<Rc<dyn Observable>> = vec![Rc::new(a.clone()), Rc::new(b.clone())];
    Derived::new(sources, move || map(&read_a.get(), &read_b.get()))
}
