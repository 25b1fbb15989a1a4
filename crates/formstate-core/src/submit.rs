//! Form submission.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use formstate_model::Access;
use formstate_store::{Same, ValueStore};
use formstate_validate::{Scope, Summary};

use crate::error::{FormError, Result};
use crate::form::Form;
use crate::locks::LockKey;

/// What a submit action receives: the form and the summary of the full
/// validation run that preceded it.
pub struct Submission<A: Access> {
    pub form: Form<A>,
    pub summary: Rc<Summary<A::Field>>,
}

impl<A: Access> Submission<A> {
    /// Whether the pre-submit validation run found the form valid.
    pub fn is_valid(&self) -> bool {
        self.summary.valid
    }
}

impl<A: Access> Clone for Submission<A> {
    fn clone(&self) -> Self {
        Self {
            form: self.form.clone(),
            summary: Rc::clone(&self.summary),
        }
    }
}

impl<A: Access> fmt::Debug for Submission<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

/// Holds `submitting` true until dropped.
///
/// A reset during the submission hands the flag to the reset form, so the
/// guard only clears it while the generation it started in is current.
struct SubmittingGuard<'a> {
    flag: &'a ValueStore<bool>,
    generation: &'a Cell<u64>,
    started: u64,
}

impl<'a> SubmittingGuard<'a> {
    fn new(flag: &'a ValueStore<bool>, generation: &'a Cell<u64>) -> Self {
        flag.set(true);
        Self {
            flag,
            generation,
            started: generation.get(),
        }
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        if self.generation.get() == self.started {
            self.flag.set(false);
        } else {
            tracing::trace!(
                started = self.started,
                "submission from before reset finished"
            );
        }
    }
}

impl<A> Form<A>
where
    A: Access,
    A::Values: Same,
{
    /// Submit with the action configured in the form options.
    ///
    /// Returns `Ok(None)` when a submission is already in flight.
    pub async fn submit(&self) -> Result<Option<()>> {
        let action = self
            .inner
            .action
            .borrow()
            .clone()
            .ok_or(FormError::MissingAction)?;
        self.submit_with(move |submission| action(submission)).await
    }

    /// Submit with `action`.
    ///
    /// While the submission runs the whole form is locked and `submitting` is
    /// true; `submitted` latches true. A full validation run is awaited before
    /// `action` is called. Lock and `submitting` are released however the
    /// action ends. A call made while another submission is in flight does
    /// nothing and returns `Ok(None)`.
    pub async fn submit_with<F, Fut, R>(&self, action: F) -> Result<Option<R>>
    where
        F: FnOnce(Submission<A>) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
    {
        if self.inner.submitting.with(|submitting| *submitting) {
            tracing::debug!("submission rejected: already submitting");
            return Ok(None);
        }

        let _submitting = SubmittingGuard::new(&self.inner.submitting, &self.inner.generation);
        let _lock = self.inner.locks.acquire(LockKey::Form);
        self.inner.submitted.set(true);
        tracing::debug!("submission started");

        let summary = self.test(Scope::All).settled().await;
        tracing::debug!(
            valid = summary.valid,
            errors = summary.error_count,
            "submission validated"
        );

        let submission = Submission {
            form: self.clone(),
            summary,
        };
        match action(submission).await {
            Ok(output) => {
                tracing::debug!("submission finished");
                Ok(Some(output))
            }
            Err(error) => {
                tracing::debug!(error = %error, "submission action failed");
                Err(FormError::Action(error))
            }
        }
    }

    /// Start a submission with the configured action without awaiting it.
    ///
    /// Failures are logged. Must be called inside a tokio `LocalSet`.
    pub fn on_submit(&self) {
        let form = self.clone();
        tokio::task::spawn_local(async move {
            if let Err(error) = form.submit().await {
                tracing::error!(error = %error, "submission failed");
            }
        });
    }
}
