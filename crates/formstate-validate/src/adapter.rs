//! Test declaration inside a suite body.

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;

use formstate_model::Access;

use crate::enforce::Enforce;
use crate::scope::Scope;
use crate::signal::CancelSignal;
use crate::summary::{Outcome, Severity};

/// Recorded instead of the payload when a test panics with a non-string value.
pub const PANIC_MESSAGE: &str = "test panicked";

pub(crate) type TestFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;

/// What a test body receives.
pub struct TestInput<T> {
    /// The field's value in the snapshot being validated.
    pub value: T,
    /// Fires when a newer run supersedes this test.
    pub signal: CancelSignal,
}

impl<T> TestInput<T> {
    /// Start a rule chain on the value that fails with `message`.
    pub fn enforce(&self, message: impl Into<String>) -> Enforce<'_, T> {
        Enforce::new(&self.value, message)
    }
}

pub(crate) struct FieldDraft {
    pub(crate) outcomes: Vec<Outcome>,
    pub(crate) omitted: bool,
    pub(crate) signal: CancelSignal,
}

pub(crate) struct PendingTest<F> {
    pub(crate) field: F,
    pub(crate) slot: usize,
    pub(crate) severity: Severity,
    pub(crate) future: TestFuture,
}

/// Everything one pass over the suite body produced.
pub(crate) struct RunDraft<F> {
    pub(crate) scope: Scope<F>,
    pub(crate) declared: Vec<F>,
    pub(crate) fields: BTreeMap<F, FieldDraft>,
    pub(crate) pending: Vec<PendingTest<F>>,
}

impl<F: Ord + Clone> RunDraft<F> {
    pub(crate) fn new(scope: Scope<F>) -> Self {
        Self {
            scope,
            declared: Vec::new(),
            fields: BTreeMap::new(),
            pending: Vec::new(),
        }
    }

    fn declare(&mut self, field: &F) -> Option<&mut FieldDraft> {
        if !self.declared.contains(field) {
            self.declared.push(field.clone());
        }
        if !self.scope.includes(field) {
            return None;
        }
        Some(self.fields.entry(field.clone()).or_insert_with(|| FieldDraft {
            outcomes: Vec::new(),
            omitted: false,
            signal: CancelSignal::default(),
        }))
    }

    /// Signal for the next test of `field`, or `None` when it must be skipped.
    fn begin(&mut self, field: &F) -> Option<CancelSignal> {
        self.declare(field)
            .filter(|draft| !draft.omitted)
            .map(|draft| draft.signal.clone())
    }

    fn record(&mut self, field: &F, outcome: Outcome) -> usize {
        let Some(draft) = self.fields.get_mut(field) else {
            return 0;
        };
        draft.outcomes.push(outcome);
        draft.outcomes.len() - 1
    }

    fn omit(&mut self, field: &F) {
        if let Some(draft) = self.declare(field) {
            draft.omitted = true;
            draft.outcomes.clear();
            self.pending.retain(|test| &test.field != field);
        }
    }
}

/// Handed to the suite body on every run to declare tests.
///
/// Declarations for fields outside the run's scope are noted (so the field
/// shows up in the summary) but their bodies are not executed.
pub struct Tests<'r, A: Access> {
    values: &'r A::Values,
    access: &'r A,
    draft: &'r mut RunDraft<A::Field>,
}

impl<'r, A: Access> Tests<'r, A> {
    pub(crate) fn new(
        values: &'r A::Values,
        access: &'r A,
        draft: &'r mut RunDraft<A::Field>,
    ) -> Self {
        Self {
            values,
            access,
            draft,
        }
    }

    /// The values snapshot under validation.
    pub fn values(&self) -> &A::Values {
        self.values
    }

    /// Current value of one field in the snapshot.
    pub fn value(&self, field: &A::Field) -> A::Value {
        self.access.get(self.values, field)
    }

    /// Whether tests for `field` execute in this run.
    pub fn in_scope(&self, field: &A::Field) -> bool {
        self.draft.scope.includes(field)
    }

    /// Declare a synchronous test; an `Err` or a panic fails the field.
    pub fn test(
        &mut self,
        field: impl Into<A::Field>,
        body: impl FnOnce(TestInput<A::Value>) -> anyhow::Result<()>,
    ) {
        self.run_sync(field.into(), Severity::Error, body);
    }

    /// Like [`test`](Self::test), but a failure only warns.
    pub fn warn(
        &mut self,
        field: impl Into<A::Field>,
        body: impl FnOnce(TestInput<A::Value>) -> anyhow::Result<()>,
    ) {
        self.run_sync(field.into(), Severity::Warning, body);
    }

    /// Declare an asynchronous test.
    ///
    /// The field stays pending until the future resolves. Futures are driven
    /// with `tokio::task::spawn_local`; outside a `LocalSet` the test fails
    /// with [`NO_LOCAL_SET_MESSAGE`](crate::NO_LOCAL_SET_MESSAGE).
    pub fn test_async<Fut>(
        &mut self,
        field: impl Into<A::Field>,
        body: impl FnOnce(TestInput<A::Value>) -> Fut,
    ) where
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.run_async(field.into(), Severity::Error, body);
    }

    /// Like [`test_async`](Self::test_async), but a failure only warns.
    pub fn warn_async<Fut>(
        &mut self,
        field: impl Into<A::Field>,
        body: impl FnOnce(TestInput<A::Value>) -> Fut,
    ) where
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.run_async(field.into(), Severity::Warning, body);
    }

    /// Skip `field` on purpose in this run: it reports valid with no tests.
    pub fn omit(&mut self, field: impl Into<A::Field>) {
        self.draft.omit(&field.into());
    }

    fn input(&mut self, field: &A::Field) -> Option<TestInput<A::Value>> {
        let signal = self.draft.begin(field)?;
        Some(TestInput {
            value: self.access.get(self.values, field),
            signal,
        })
    }

    fn run_sync(
        &mut self,
        field: A::Field,
        severity: Severity,
        body: impl FnOnce(TestInput<A::Value>) -> anyhow::Result<()>,
    ) {
        let Some(input) = self.input(&field) else {
            return;
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| body(input)));
        let outcome = outcome_of(&field, severity, result);
        self.draft.record(&field, outcome);
    }

    fn run_async<Fut>(
        &mut self,
        field: A::Field,
        severity: Severity,
        body: impl FnOnce(TestInput<A::Value>) -> Fut,
    ) where
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        let Some(input) = self.input(&field) else {
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| body(input))) {
            Ok(future) => {
                let slot = self.draft.record(&field, Outcome::Pending);
                tracing::trace!(field = %field, "async test pending");
                self.draft.pending.push(PendingTest {
                    field,
                    slot,
                    severity,
                    future: Box::pin(future),
                });
            }
            Err(payload) => {
                let outcome = outcome_of(&field, severity, Err(payload));
                self.draft.record(&field, outcome);
            }
        }
    }
}

/// Turn a caught test result into an outcome, logging it.
pub(crate) fn outcome_of<F: std::fmt::Display>(
    field: &F,
    severity: Severity,
    result: Result<anyhow::Result<()>, Box<dyn Any + Send>>,
) -> Outcome {
    match result {
        Ok(Ok(())) => {
            tracing::trace!(field = %field, "test passed");
            Outcome::Passed
        }
        Ok(Err(error)) => {
            tracing::trace!(field = %field, severity = severity.label(), %error, "test failed");
            Outcome::Failed(severity, error.to_string())
        }
        Err(payload) => {
            let message = panic_message(&*payload);
            tracing::warn!(field = %field, panic = %message, "test panicked");
            Outcome::Failed(severity, message)
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    PANIC_MESSAGE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), PANIC_MESSAGE);
    }

    #[test]
    fn test_omit_drops_recorded_outcomes() {
        let mut draft = RunDraft::<String>::new(Scope::All);
        let field = "a".to_string();
        assert!(draft.begin(&field).is_some());
        draft.record(&field, Outcome::Passed);
        draft.omit(&field);
        assert!(draft.begin(&field).is_none());
        let entry = &draft.fields[&field];
        assert!(entry.omitted);
        assert!(entry.outcomes.is_empty());
    }

    #[test]
    fn test_out_of_scope_is_declared_but_skipped() {
        let mut draft = RunDraft::new(Scope::field("b".to_string()));
        assert!(draft.begin(&"a".to_string()).is_none());
        assert_eq!(draft.declared, vec!["a".to_string()]);
        assert!(draft.fields.is_empty());
    }
}
