//! Store traits.

use std::rc::Rc;

use crate::listeners::Subscription;

/// Untyped change source, used to wire derivations together.
pub trait Observable {
    /// Counter that increases every time the observable value changes.
    fn version(&self) -> u64;

    /// Call `listener` after every change until the subscription is dropped.
    fn watch(&self, listener: Rc<dyn Fn()>) -> Subscription;
}

/// A store whose current value can be read and subscribed to.
pub trait Readable: Observable + Clone + 'static {
    type Value: Clone + 'static;

    /// Current value.
    fn get(&self) -> Self::Value;

    /// Call `f` with the current value now and with every new value after.
    fn subscribe(&self, f: impl Fn(Self::Value) + 'static) -> Subscription {
        f(self.get());
        let this = self.clone();
        self.watch(Rc::new(move || f(this.get())))
    }
}

/// A store that accepts new values.
pub trait Writable: Readable {
    fn set(&self, value: Self::Value);

    fn update(&self, updater: impl FnOnce(&Self::Value) -> Self::Value) {
        let current = self.get();
        self.set(updater(&current));
    }
}
