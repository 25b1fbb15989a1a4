//! Cooperative cancellation for async tests.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    cancelled: Cell<bool>,
    notify: Notify,
}

/// Set once a newer run covers the same field, or the suite is reset.
///
/// Tests may poll [`is_cancelled`](Self::is_cancelled) or race their work
/// against [`cancelled`](Self::cancelled). A superseded test's result is
/// discarded either way.
#[derive(Clone, Default)]
pub struct CancelSignal {
    inner: Rc<Inner>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Resolve once the signal fires.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn cancel(&self) {
        if !self.inner.cancelled.replace(true) {
            self.inner.notify.notify_waiters();
        }
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
