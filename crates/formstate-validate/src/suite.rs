//! Suite runner: scoped runs merged into one canonical summary.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::rc::{Rc, Weak};

use formstate_model::Access;
use formstate_store::Same;
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;

use crate::adapter::{PendingTest, RunDraft, Tests, outcome_of, panic_message};
use crate::scope::Scope;
use crate::signal::CancelSignal;
use crate::summary::{FieldSummary, Outcome, Severity, Summary};

/// Failure recorded for async tests run outside a `LocalSet`.
pub const NO_LOCAL_SET_MESSAGE: &str = "async test needs a tokio LocalSet";

type Body<A> = Box<dyn Fn(&mut Tests<'_, A>)>;
type DoneCallback<F> = Box<dyn FnOnce(Rc<Summary<F>>)>;

/// Latest result for one field, tagged with the run that produced it.
struct FieldRecord {
    run: u64,
    outcomes: Vec<Outcome>,
    omitted: bool,
    signal: CancelSignal,
    summary: Rc<FieldSummary>,
}

impl FieldRecord {
    fn placeholder() -> Self {
        Self {
            run: 0,
            outcomes: Vec::new(),
            omitted: false,
            signal: CancelSignal::default(),
            summary: Rc::new(FieldSummary::untested()),
        }
    }

    fn retally(&mut self) {
        let summary = FieldSummary::tally(&self.outcomes, self.omitted);
        if *self.summary != summary {
            self.summary = Rc::new(summary);
        }
    }
}

struct SuiteState<F: Ord> {
    generation: u64,
    runs: u64,
    order: Vec<F>,
    records: BTreeMap<F, FieldRecord>,
    summary: Rc<Summary<F>>,
}

impl<F: Ord + Clone> SuiteState<F> {
    fn rebuild(&mut self) {
        let next = Summary::new(self.order.iter().filter_map(|field| {
            self.records
                .get(field)
                .map(|record| (field.clone(), Rc::clone(&record.summary)))
        }));
        if !next.shares_fields(&self.summary) {
            self.summary = Rc::new(next);
        }
    }

    /// Fold one run's drafts into the records.
    ///
    /// In-scope fields take the new result (or disappear when the body no
    /// longer declares them); out-of-scope fields keep whatever an earlier run
    /// recorded.
    fn merge(&mut self, run: u64, draft: RunDraft<F>) {
        let RunDraft {
            scope,
            declared,
            mut fields,
            ..
        } = draft;

        let stale: Vec<F> = self
            .records
            .keys()
            .filter(|field| scope.includes(field) && !fields.contains_key(*field))
            .cloned()
            .collect();
        for field in stale {
            if let Some(record) = self.records.remove(&field) {
                record.signal.cancel();
            }
        }

        for field in &declared {
            match fields.remove(field) {
                Some(draft) => {
                    let mut record = FieldRecord {
                        run,
                        outcomes: draft.outcomes,
                        omitted: draft.omitted,
                        signal: draft.signal,
                        summary: Rc::new(FieldSummary::untested()),
                    };
                    if let Some(previous) = self.records.remove(field) {
                        previous.signal.cancel();
                        record.summary = previous.summary;
                    }
                    record.retally();
                    self.records.insert(field.clone(), record);
                }
                None => {
                    self.records
                        .entry(field.clone())
                        .or_insert_with(FieldRecord::placeholder);
                }
            }
        }

        let kept: Vec<F> = self
            .records
            .keys()
            .filter(|field| !declared.contains(field))
            .cloned()
            .collect();
        let mut order = declared;
        order.extend(kept);
        self.order = order;
        self.rebuild();
    }
}

struct SuiteInner<A: Access> {
    access: A,
    body: Body<A>,
    state: RefCell<SuiteState<A::Field>>,
}

impl<A: Access> SuiteInner<A> {
    /// Install the result of one async test if its run is still current for
    /// that field.
    fn settle_test(&self, run: u64, generation: u64, test: &Settled<A::Field>) {
        let mut state = self.state.borrow_mut();
        if state.generation != generation {
            return;
        }
        let Some(record) = state.records.get_mut(&test.field) else {
            return;
        };
        if record.run != run {
            tracing::trace!(field = %test.field, run, current = record.run, "superseded test result dropped");
            return;
        }
        if let Some(slot) = record.outcomes.get_mut(test.slot) {
            *slot = test.outcome.clone();
        }
        record.retally();
        state.rebuild();
    }
}

struct Settled<F> {
    field: F,
    slot: usize,
    outcome: Outcome,
}

/// A validation suite bound to a field accessor.
///
/// The body declares tests through [`Tests`] on every run. The suite keeps
/// the latest result per field, so a run scoped to one field leaves the
/// others untouched.
///
/// ```
/// use formstate_model::{RecordAccess, record};
/// use formstate_validate::{Scope, Suite, selectors};
///
/// let suite = Suite::new(RecordAccess::<String>::new(), |t| {
///     t.test("name", |input| {
///         input.enforce("name required").is_not_blank()?;
///         Ok(())
///     });
/// });
///
/// let run = suite.run(&record([("name", String::new())]), Scope::All);
/// assert!(run.is_settled());
/// assert!(selectors::invalid(Some(&*run.summary())));
/// ```
pub struct Suite<A: Access> {
    inner: Rc<SuiteInner<A>>,
}

impl<A: Access> Clone for Suite<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: Access> Suite<A> {
    pub fn new(access: A, body: impl Fn(&mut Tests<'_, A>) + 'static) -> Self {
        Self {
            inner: Rc::new(SuiteInner {
                access,
                body: Box::new(body),
                state: RefCell::new(SuiteState {
                    generation: 0,
                    runs: 0,
                    order: Vec::new(),
                    records: BTreeMap::new(),
                    summary: Rc::new(Summary::default()),
                }),
            }),
        }
    }

    /// The accessor tests read field values through.
    pub fn access(&self) -> &A {
        &self.inner.access
    }

    /// Current merged summary.
    pub fn get(&self) -> Rc<Summary<A::Field>> {
        Rc::clone(&self.inner.state.borrow().summary)
    }

    /// Run the body against `values`, executing only the tests in `scope`.
    ///
    /// Synchronous tests finish before this returns. Async tests are spawned
    /// on the current `LocalSet`; the returned handle reports when they
    /// settle.
    ///
    /// Async tests need a `tokio::task::LocalSet`. Outside one they fail with
    /// [`NO_LOCAL_SET_MESSAGE`] and the run settles right away.
    pub fn run(
        &self,
        values: &A::Values,
        scope: impl Into<Scope<A::Field>>,
    ) -> SuiteRun<A::Field> {
        let scope = scope.into();
        let label = scope.to_string();
        let (run, generation) = {
            let mut state = self.inner.state.borrow_mut();
            state.runs += 1;
            (state.runs, state.generation)
        };

        let mut draft = RunDraft::new(scope);
        (self.inner.body)(&mut Tests::new(values, &self.inner.access, &mut draft));
        let pending = std::mem::take(&mut draft.pending);

        let summary = {
            let mut state = self.inner.state.borrow_mut();
            state.merge(run, draft);
            Rc::clone(&state.summary)
        };
        tracing::debug!(
            run,
            scope = %label,
            tests = summary.test_count,
            errors = summary.error_count,
            warnings = summary.warn_count,
            pending = pending.len(),
            "validation run started"
        );

        let handle = SuiteRun::new(run, Rc::clone(&summary));
        if pending.is_empty() {
            handle.state.settle(run, summary);
        } else {
            self.spawn(run, generation, pending, Rc::clone(&handle.state));
        }
        handle
    }

    /// Drop every recorded result and cancel in-flight tests.
    ///
    /// Runs still pending at this point never settle: their results are
    /// discarded and their `done` callbacks are dropped.
    pub fn reset(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.generation += 1;
        for record in state.records.values() {
            record.signal.cancel();
        }
        state.records.clear();
        state.order.clear();
        state.summary = Rc::new(Summary::default());
        tracing::debug!(generation = state.generation, "suite reset");
    }

    fn spawn(
        &self,
        run: u64,
        generation: u64,
        pending: Vec<PendingTest<A::Field>>,
        handle: Rc<RunState<A::Field>>,
    ) {
        let detached: Vec<(A::Field, usize, Severity)> = pending
            .iter()
            .map(|test| (test.field.clone(), test.slot, test.severity))
            .collect();
        let fallback = Rc::clone(&handle);
        let weak: Weak<SuiteInner<A>> = Rc::downgrade(&self.inner);
        let task = async move {
            let mut tests: FuturesUnordered<_> = pending
                .into_iter()
                .map(|test| async move {
                    let result = AssertUnwindSafe(test.future).catch_unwind().await;
                    Settled {
                        outcome: outcome_of(&test.field, test.severity, result),
                        field: test.field,
                        slot: test.slot,
                    }
                })
                .collect();

            while let Some(settled) = tests.next().await {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.settle_test(run, generation, &settled);
            }

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let summary = {
                let state = inner.state.borrow();
                (state.generation == generation).then(|| Rc::clone(&state.summary))
            };
            match summary {
                Some(summary) => handle.settle(run, summary),
                None => {
                    tracing::debug!(run, "validation run abandoned by reset");
                    handle.abandon();
                }
            }
        };

        let spawned =
            std::panic::catch_unwind(AssertUnwindSafe(|| tokio::task::spawn_local(task)));
        if let Err(payload) = spawned {
            tracing::warn!(
                run,
                tests = detached.len(),
                panic = %panic_message(&*payload),
                "async tests need a tokio LocalSet"
            );
            for (field, slot, severity) in detached {
                let outcome = Outcome::Failed(severity, NO_LOCAL_SET_MESSAGE.to_string());
                self.inner.settle_test(
                    run,
                    generation,
                    &Settled {
                        field,
                        slot,
                        outcome,
                    },
                );
            }
            let summary = Rc::clone(&self.inner.state.borrow().summary);
            fallback.settle(run, summary);
        }
    }
}

impl<A: Access> Same for Suite<A> {
    fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<A: Access> fmt::Debug for Suite<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Suite")
            .field("runs", &state.runs)
            .field("fields", &state.order)
            .finish()
    }
}

struct RunState<F: Ord> {
    settled: RefCell<Option<Rc<Summary<F>>>>,
    callbacks: RefCell<Vec<DoneCallback<F>>>,
}

impl<F: Ord> RunState<F> {
    fn settle(&self, run: u64, summary: Rc<Summary<F>>) {
        *self.settled.borrow_mut() = Some(Rc::clone(&summary));
        let callbacks = std::mem::take(&mut *self.callbacks.borrow_mut());
        tracing::debug!(
            run,
            errors = summary.error_count,
            valid = summary.valid,
            callbacks = callbacks.len(),
            "validation run settled"
        );
        for callback in callbacks {
            callback(Rc::clone(&summary));
        }
    }

    fn abandon(&self) {
        let callbacks = std::mem::take(&mut *self.callbacks.borrow_mut());
        drop(callbacks);
    }
}

/// Handle to one run.
pub struct SuiteRun<F: Ord> {
    id: u64,
    summary: Rc<Summary<F>>,
    state: Rc<RunState<F>>,
}

impl<F: Ord> Clone for SuiteRun<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            summary: Rc::clone(&self.summary),
            state: Rc::clone(&self.state),
        }
    }
}

impl<F: Ord + 'static> SuiteRun<F> {
    fn new(id: u64, summary: Rc<Summary<F>>) -> Self {
        Self {
            id,
            summary,
            state: Rc::new(RunState {
                settled: RefCell::new(None),
                callbacks: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Merged summary as of the end of the synchronous part of the run.
    pub fn summary(&self) -> Rc<Summary<F>> {
        Rc::clone(&self.summary)
    }

    pub fn is_settled(&self) -> bool {
        self.state.settled.borrow().is_some()
    }

    /// Call `callback` once every test of this run has settled, with the
    /// merged summary at that moment. Fires immediately if already settled.
    pub fn done(&self, callback: impl FnOnce(Rc<Summary<F>>) + 'static) {
        let settled = self.state.settled.borrow().clone();
        match settled {
            Some(summary) => callback(summary),
            None => self.state.callbacks.borrow_mut().push(Box::new(callback)),
        }
    }

    /// Wait for the run to settle.
    ///
    /// A run abandoned by a suite reset resolves with its synchronous summary.
    pub async fn settled(&self) -> Rc<Summary<F>> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.done(move |summary| {
            let _ = tx.send(summary);
        });
        rx.await.unwrap_or_else(|_| self.summary())
    }
}

impl<F: Ord + fmt::Debug> fmt::Debug for SuiteRun<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteRun")
            .field("id", &self.id)
            .field("settled", &self.state.settled.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstate_model::{Record, RecordAccess, record};

    fn required(fields: &'static [&'static str]) -> Suite<RecordAccess<String>> {
        Suite::new(RecordAccess::new(), move |t| {
            for field in fields {
                t.test(*field, move |input| {
                    input.enforce(format!("{field} required")).is_not_blank()?;
                    Ok(())
                });
            }
        })
    }

    fn empty(fields: &[&str]) -> Record {
        record(fields.iter().map(|f| (*f, String::new())))
    }

    #[test]
    fn test_scoped_run_keeps_other_fields() {
        let suite = required(&["a", "b"]);
        let values = empty(&["a", "b"]);

        let first = suite.run(&values, "a").summary();
        let a = Rc::clone(first.field(&"a".into()).unwrap());
        assert_eq!(a.error_count, 1);
        assert_eq!(first.field(&"b".into()).unwrap().test_count, 0);

        let second = suite.run(&values, "b").summary();
        assert!(Rc::ptr_eq(second.field(&"a".into()).unwrap(), &a));
        assert_eq!(second.field(&"b".into()).unwrap().error_count, 1);
        assert_eq!(second.error_count, 2);
    }

    #[test]
    fn test_unchanged_rerun_reuses_summary() {
        let suite = required(&["a"]);
        let values = empty(&["a"]);
        let first = suite.run(&values, Scope::All).summary();
        let second = suite.run(&values, Scope::All).summary();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_sync_run_fires_done_immediately() {
        let suite = required(&["a"]);
        let run = suite.run(&empty(&["a"]), Scope::All);
        let fired = Rc::new(std::cell::Cell::new(0));
        let sink = Rc::clone(&fired);
        run.done(move |_| sink.set(sink.get() + 1));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_reset_clears_results() {
        let suite = required(&["a"]);
        suite.run(&empty(&["a"]), Scope::All);
        suite.reset();
        assert_eq!(suite.get().test_count, 0);
        assert!(suite.get().tests.is_empty());
    }

    #[test]
    fn test_undeclared_field_in_scope_is_dropped() {
        let suite = Suite::new(RecordAccess::<String>::new(), |t| {
            if t.value(&"toggle".to_string()).is_some() {
                t.test("extra", |_| Ok(()));
            }
        });
        let on = record([("toggle", "1".to_string())]);
        assert!(suite.run(&on, Scope::All).summary().field(&"extra".into()).is_some());
        let off = empty(&[]);
        assert!(suite.run(&off, "extra").summary().field(&"extra".into()).is_none());
    }
}
