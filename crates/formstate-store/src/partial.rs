//! Derived views that write back to their source.

use std::fmt;
use std::rc::Rc;

use crate::derived::Derived;
use crate::listeners::Subscription;
use crate::same::Same;
use crate::traits::{Observable, Readable, Writable};

/// A [`Derived`] view paired with a setter into the store it was derived
/// from, e.g. one field of a record store.
pub struct PartialStore<T> {
    view: Derived<T>,
    setter: Rc<dyn Fn(T)>,
}

impl<T> Clone for PartialStore<T> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            setter: Rc::clone(&self.setter),
        }
    }
}

impl<T: Clone + Same + 'static> PartialStore<T> {
    pub fn new(view: Derived<T>, setter: impl Fn(T) + 'static) -> Self {
        Self {
            view,
            setter: Rc::new(setter),
        }
    }

    /// The read side alone.
    pub fn view(&self) -> &Derived<T> {
        &self.view
    }
}

impl<T: Clone + Same + 'static> Observable for PartialStore<T> {
    fn version(&self) -> u64 {
        self.view.version()
    }

    fn watch(&self, listener: Rc<dyn Fn()>) -> Subscription {
        self.view.watch(listener)
    }
}

impl<T: Clone + Same + 'static> Readable for PartialStore<T> {
    type Value = T;

    fn get(&self) -> T {
        self.view.get()
    }
}

impl<T: Clone + Same + 'static> Writable for PartialStore<T> {
    fn set(&self, value: T) {
        (self.setter)(value);
    }
}

impl<T: fmt::Debug> fmt::Debug for PartialStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PartialStore").field(&self.view).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::derived;
    use crate::value::ValueStore;

    #[test]
    fn test_writes_go_through_setter() {
        let pair = ValueStore::new((1_u32, String::from("x")));
        let writer = pair.clone();
        let first = PartialStore::new(derived(&pair, |p: &(u32, String)| p.0), move |n| {
            writer.update(|p| (n, p.1.clone()));
        });

        first.set(9);
        assert_eq!(first.get(), 9);
        assert_eq!(pair.get().1, "x");

        first.update(|n| n + 1);
        assert_eq!(pair.get().0, 10);
    }
}
