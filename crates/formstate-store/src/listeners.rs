//! Listener bookkeeping shared by every store type.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

pub(crate) type Listener = Rc<dyn Fn()>;

struct Entry {
    id: u64,
    active: Cell<bool>,
    listener: Listener,
}

/// Ordered listener list with re-entrancy-safe notification.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: Cell<u64>,
    entries: RefCell<Vec<Rc<Entry>>>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Listener) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push(Rc::new(Entry {
            id,
            active: Cell::new(true),
            listener,
        }));
        id
    }

    pub(crate) fn remove(&self, id: u64) {
        let mut entries = self.entries.borrow_mut();
        if let Some(index) = entries.iter().position(|entry| entry.id == id) {
            entries.remove(index).active.set(false);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Call every listener registered at the time of the call.
    ///
    /// Listeners removed by an earlier listener in the same round are skipped.
    pub(crate) fn notify(&self) {
        let snapshot: Vec<Rc<Entry>> = self.entries.borrow().clone();
        for entry in snapshot {
            if entry.active.get() {
                (entry.listener)();
            }
        }
    }
}

/// Handle to an active subscription; unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving notifications now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_skips_listener_removed_mid_round() {
        let listeners = Rc::new(Listeners::default());
        let calls = Rc::new(Cell::new(0));

        let second_id = Rc::new(Cell::new(0));
        let first = {
            let listeners = Rc::clone(&listeners);
            let second_id = Rc::clone(&second_id);
            Rc::new(move || listeners.remove(second_id.get())) as Listener
        };
        let second = {
            let calls = Rc::clone(&calls);
            Rc::new(move || calls.set(calls.get() + 1)) as Listener
        };

        listeners.add(first);
        second_id.set(listeners.add(second));
        listeners.notify();

        assert_eq!(calls.get(), 0);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_subscription_cancels_once() {
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        let subscription = Subscription::new(move || sink.set(sink.get() + 1));
        subscription.unsubscribe();
        assert_eq!(count.get(), 1);
    }
}
