//! Submit button state.

use std::cell::RefCell;
use std::fmt;

use serde::Serialize;
use tokio::task::JoinHandle;

use formstate_model::Access;
use formstate_store::{Readonly, Same, ValueStore};

use crate::form::Form;

/// Where a [`Submitter`] is in its cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitState {
    #[default]
    Idle,
    Pending,
    /// The last submission finished; `error` holds its failure, if any.
    Done { error: Option<String> },
}

impl SubmitState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl Same for SubmitState {
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

/// Drives [`Form::submit`] from a trigger and exposes the outcome.
///
/// The status moves `Idle → Pending → Done` and back to `Idle` once
/// `submit.reset_after_ms` has passed. Triggers are ignored unless the
/// status is `Idle`, and, depending on config, while the form is locked or
/// omitted. Dropping the submitter cancels a pending return to `Idle`.
///
/// Must be used inside a tokio `LocalSet`.
pub struct Submitter<A: Access> {
    form: Form<A>,
    status: ValueStore<SubmitState>,
    reset: RefCell<Option<JoinHandle<()>>>,
}

impl<A> Submitter<A>
where
    A: Access,
    A::Values: Same,
{
    pub fn new(form: &Form<A>) -> Self {
        Self {
            form: form.clone(),
            status: ValueStore::default(),
            reset: RefCell::new(None),
        }
    }

    pub fn get_status(&self) -> SubmitState {
        self.status.with(Clone::clone)
    }

    pub fn status(&self) -> Readonly<SubmitState> {
        self.status.readonly()
    }

    /// Submit with the form's configured action.
    ///
    /// Returns `false` when the trigger was ignored.
    pub async fn trigger(&self) -> bool {
        if let Some(reason) = self.skip_reason() {
            tracing::debug!(reason, "submit trigger ignored");
            return false;
        }
        self.status.set(SubmitState::Pending);

        let error = self.form.submit().await.err().map(|error| error.to_string());
        self.status.set(SubmitState::Done { error });

        let reset_after = self.form.config().submit.reset_after();
        let status = self.status.clone();
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(reset_after).await;
            status.set(SubmitState::Idle);
        });
        if let Some(previous) = self.reset.borrow_mut().replace(handle) {
            previous.abort();
        }
        true
    }

    fn skip_reason(&self) -> Option<&'static str> {
        let config = self.form.config().submit;
        if !self.status.with(SubmitState::is_idle) {
            Some("busy")
        } else if config.skip_when_locked && self.form.is_locked() {
            Some("locked")
        } else if config.skip_when_omitted && self.form.is_omitted() {
            Some("omitted")
        } else {
            None
        }
    }
}

impl<A: Access> Drop for Submitter<A> {
    fn drop(&mut self) {
        if let Some(handle) = self.reset.get_mut().take() {
            handle.abort();
        }
    }
}

impl<A: Access> fmt::Debug for Submitter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
