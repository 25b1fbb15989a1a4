//! The form state controller.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use formstate_model::Access;
use formstate_store::{Derived, FieldSet, Readable, Readonly, Same, ValueStore, derived, toggle};
use formstate_validate::{Failure, FieldSummary, Scope, Selector, Suite, SuiteRun, Summary};

use crate::config::FormConfig;
use crate::field::{Field, FieldViews};
use crate::input::{InputElement, InputLocator};
use crate::lazy::{Memo, MemoMap};
use crate::locks::{LockHandle, LockKey, LockMap, Locks};
use crate::logging::redact_value;
use crate::options::{Action, FormOptions};

pub(crate) struct FormInner<A: Access> {
    pub(crate) suite: ValueStore<Suite<A>>,
    pub(crate) config: RefCell<FormConfig>,
    pub(crate) input: RefCell<InputLocator<A::Field>>,
    pub(crate) action: RefCell<Option<Action<A>>>,
    /// Bumped on reset; completions of older runs are ignored.
    pub(crate) generation: Cell<u64>,
    pub(crate) values: ValueStore<A::Values>,
    pub(crate) summary: ValueStore<Rc<Summary<A::Field>>>,
    pub(crate) locks: Locks<A::Field>,
    pub(crate) submitting: ValueStore<bool>,
    pub(crate) submitted: ValueStore<bool>,
    pub(crate) touched: ValueStore<FieldSet<A::Field>>,
    pub(crate) visited: ValueStore<FieldSet<A::Field>>,
    views: FormViews<A::Field>,
    pub(crate) fields: MemoMap<A::Field, Rc<FieldViews<A>>>,
}

/// Derived stores of the form, built on first access.
struct FormViews<F: Ord> {
    selectors: MemoMap<Selector, Derived<bool>>,
    locked: Memo<Derived<bool>>,
    locked_fields: Memo<Derived<Vec<F>>>,
    touched: Memo<Derived<bool>>,
    visited: Memo<Derived<bool>>,
    error: Memo<Derived<Option<Failure<F>>>>,
    errors: Memo<Derived<Vec<Failure<F>>>>,
    warning: Memo<Derived<Option<Failure<F>>>>,
    warnings: Memo<Derived<Vec<Failure<F>>>>,
}

impl<F: Ord> Default for FormViews<F> {
    fn default() -> Self {
        Self {
            selectors: MemoMap::default(),
            locked: Memo::default(),
            locked_fields: Memo::default(),
            touched: Memo::default(),
            visited: Memo::default(),
            error: Memo::default(),
            errors: Memo::default(),
            warning: Memo::default(),
            warnings: Memo::default(),
        }
    }
}

/// Reactive state of one form: values, validation summary, locks,
/// submission status and touched/visited tracking.
///
/// `Form` is a cheap handle; clones share the same state. Every query has a
/// plain accessor (`is_valid`, `get_field_value`, ...) and a subscribable
/// store counterpart (`valid`, `field(..).value()`, ...). Stores are created
/// on first access and then reused for the lifetime of the form.
///
/// ```
/// use formstate_core::{Form, FormOptions};
/// use formstate_model::RecordAccess;
/// use formstate_validate::Suite;
///
/// let suite = Suite::new(RecordAccess::<String>::new(), |t| {
///     t.test("name", |input| {
///         input.enforce("name is required").is_not_blank()?;
///         Ok(())
///     });
/// });
/// let form = Form::new(FormOptions::new(suite));
///
/// form.test_field("name");
/// assert!(form.is_invalid());
/// assert_eq!(form.get_field_error("name"), "name is required");
///
/// form.set_field_value("name", Some("Ann".to_string()));
/// form.test_field("name");
/// assert!(form.is_valid());
/// ```
pub struct Form<A: Access> {
    pub(crate) inner: Rc<FormInner<A>>,
}

impl<A: Access> Clone for Form<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: Access> fmt::Debug for Form<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("suite", &self.inner.suite)
            .field("generation", &self.inner.generation.get())
            .field("summary", &self.inner.summary)
            .field("submitting", &self.inner.submitting)
            .field("fields", &self.inner.fields)
            .finish_non_exhaustive()
    }
}

/// `is_*` accessor, store and per-field accessor for each selector.
macro_rules! selector_accessors {
    ($($variant:ident => $is:ident, $store:ident, $is_field:ident;)*) => {
        $(
            #[doc = concat!("Whether the form is ", stringify!($store), ".")]
            pub fn $is(&self) -> bool {
                self.select(Selector::$variant)
            }

            #[doc = concat!("Subscribable [`", stringify!($is), "`](Self::", stringify!($is), ").")]
            pub fn $store(&self) -> Derived<bool> {
                self.selected(Selector::$variant)
            }

            #[doc = concat!("Whether `field` is ", stringify!($store), ".")]
            pub fn $is_field(&self, field: impl Into<A::Field>) -> bool {
                self.select_field(field, Selector::$variant)
            }
        )*
    };
}

impl<A> Form<A>
where
    A: Access,
    A::Values: Same,
{
    pub fn new(options: FormOptions<A>) -> Self {
        let FormOptions {
            suite,
            values,
            input,
            action,
            touched,
            visited,
            config,
        } = options;
        let summary = suite.get();
        let inner = FormInner {
            suite: ValueStore::new(suite),
            config: RefCell::new(config),
            input: RefCell::new(input),
            action: RefCell::new(action),
            generation: Cell::new(0),
            values: ValueStore::new(values),
            summary: ValueStore::new(summary),
            locks: Locks::new(),
            submitting: ValueStore::new(false),
            submitted: ValueStore::new(false),
            touched: ValueStore::new(Rc::new(touched.into_iter().collect())),
            visited: ValueStore::new(Rc::new(visited.into_iter().collect())),
            views: FormViews::default(),
            fields: MemoMap::default(),
        };
        Self {
            inner: Rc::new(inner),
        }
    }

    /// Reinitialize every piece of state from `options`.
    ///
    /// The previous suite is reset, so runs still in flight never reach
    /// this form. The field view cache is dropped; stores handed out earlier
    /// keep working and follow the new state.
    pub fn reset(&self, options: FormOptions<A>) {
        let FormOptions {
            suite,
            values,
            input,
            action,
            touched,
            visited,
            config,
        } = options;
        let inner = &self.inner;
        let generation = inner.generation.get() + 1;
        inner.generation.set(generation);
        inner.suite.with(Suite::reset);

        *inner.config.borrow_mut() = config;
        *inner.input.borrow_mut() = input;
        *inner.action.borrow_mut() = action;

        let summary = suite.get();
        inner.suite.set(suite);
        inner.summary.set(summary);
        inner.values.set(values);
        inner.locks.clear();
        inner.submitting.set(false);
        inner.submitted.set(false);
        inner.touched.set(Rc::new(touched.into_iter().collect()));
        inner.visited.set(Rc::new(visited.into_iter().collect()));
        inner.fields.clear();
        tracing::debug!(generation, "form reset");
    }

    pub(crate) fn from_weak(inner: &Weak<FormInner<A>>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn downgrade(&self) -> Weak<FormInner<A>> {
        Rc::downgrade(&self.inner)
    }

    /// Whether both handles share the same state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn suite(&self) -> Suite<A> {
        self.inner.suite.get()
    }

    pub fn config(&self) -> FormConfig {
        self.inner.config.borrow().clone()
    }

    fn reveals_values(&self) -> bool {
        self.inner.config.borrow().logging.log_values
    }

    /// The field view for `name`. Repeated calls share one set of stores.
    pub fn field(&self, name: impl Into<A::Field>) -> Field<A> {
        let name = name.into();
        let views = self
            .inner
            .fields
            .get_or_insert_with(&name, || Rc::new(FieldViews::new(name.clone())));
        Field::new(self.clone(), views)
    }

    // values

    pub fn get_values(&self) -> A::Values {
        self.inner.values.get()
    }

    pub fn values(&self) -> Readonly<A::Values> {
        self.inner.values.readonly()
    }

    pub fn set_values(&self, values: A::Values) {
        self.inner.values.set(values);
    }

    pub fn update_values(&self, updater: impl FnOnce(&A::Values) -> A::Values) {
        self.inner.values.update(updater);
    }

    pub fn get_field_value(&self, field: impl Into<A::Field>) -> A::Value {
        let field = field.into();
        let suite = self.suite();
        self.inner
            .values
            .with(|values| suite.access().get(values, &field))
    }

    pub fn set_field_value(&self, field: impl Into<A::Field>, value: impl Into<A::Value>) {
        let field = field.into();
        let value = value.into();
        tracing::trace!(
            field = %field,
            value = %redact_value(&value, self.reveals_values()),
            "set field value"
        );
        let suite = self.suite();
        self.inner
            .values
            .update(|values| suite.access().set(values, &field, value));
    }

    pub fn update_field_value(
        &self,
        field: impl Into<A::Field>,
        updater: impl Fn(A::Value) -> A::Value,
    ) {
        let field = field.into();
        tracing::trace!(field = %field, "update field value");
        let suite = self.suite();
        self.inner
            .values
            .update(|values| suite.access().update(values, &field, &updater));
    }

    pub fn remove_field_value(&self, field: impl Into<A::Field>) {
        let field = field.into();
        tracing::trace!(field = %field, "remove field value");
        let suite = self.suite();
        self.inner
            .values
            .update(|values| suite.access().remove(values, &field));
    }

    // validation

    /// Run the suite over the current values, restricted to `scope`.
    ///
    /// The run's summary is installed right away; if tests are still
    /// pending, the settled summary replaces it when they finish.
    pub fn test(&self, scope: impl Into<Scope<A::Field>>) -> SuiteRun<A::Field> {
        let suite = self.suite();
        let values = self.inner.values.get();
        let run = suite.run(&values, scope);
        self.inner.summary.set(run.summary());

        // Fires right away for runs that settled inside `run`.
        let form = self.downgrade();
        let generation = self.inner.generation.get();
        run.done(move |summary| {
            let Some(form) = Form::from_weak(&form) else {
                return;
            };
            if form.inner.generation.get() != generation {
                tracing::trace!(generation, "settled run from before reset ignored");
                return;
            }
            form.inner.summary.set(summary);
        });
        run
    }

    pub fn test_field(&self, field: impl Into<A::Field>) -> SuiteRun<A::Field> {
        self.test(Scope::field(field))
    }

    pub fn get_summary(&self) -> Rc<Summary<A::Field>> {
        self.inner.summary.get()
    }

    pub fn summary(&self) -> Readonly<Rc<Summary<A::Field>>> {
        self.inner.summary.readonly()
    }

    pub fn get_field_summary(&self, field: impl Into<A::Field>) -> Option<Rc<FieldSummary>> {
        let field = field.into();
        self.inner
            .summary
            .with(|summary| summary.field(&field).cloned())
    }

    /// Evaluate `selector` against the current summary.
    pub fn select(&self, selector: Selector) -> bool {
        self.inner
            .summary
            .with(|summary| selector.apply(Some(&**summary)))
    }

    /// Subscribable [`select`](Self::select).
    pub fn selected(&self, selector: Selector) -> Derived<bool> {
        self.inner.views.selectors.get_or_insert_with(&selector, || {
            derived(
                &self.inner.summary,
                move |summary: &Rc<Summary<A::Field>>| selector.apply(Some(&**summary)),
            )
        })
    }

    /// Evaluate `selector` against `field`'s summary.
    pub fn select_field(&self, field: impl Into<A::Field>, selector: Selector) -> bool {
        selector.apply(self.get_field_summary(field).as_deref())
    }

    selector_accessors! {
        Valid => is_valid, valid, is_field_valid;
        Invalid => is_invalid, invalid, is_field_invalid;
        Tested => is_tested, tested, is_field_tested;
        Untested => is_untested, untested, is_field_untested;
        Pending => is_pending, pending, is_field_pending;
        Warned => is_warned, warned, is_field_warned;
        Uncertain => is_uncertain, uncertain, is_field_uncertain;
        Omitted => is_omitted, omitted, is_field_omitted;
    }

    // messages

    pub fn get_error(&self) -> Option<Failure<A::Field>> {
        self.inner.summary.with(|summary| summary.error())
    }

    pub fn get_errors(&self) -> Vec<Failure<A::Field>> {
        self.inner.summary.with(|summary| summary.errors())
    }

    pub fn get_warning(&self) -> Option<Failure<A::Field>> {
        self.inner.summary.with(|summary| summary.warning())
    }

    pub fn get_warnings(&self) -> Vec<Failure<A::Field>> {
        self.inner.summary.with(|summary| summary.warnings())
    }

    pub fn error(&self) -> Derived<Option<Failure<A::Field>>> {
        self.inner.views.error.get_or_init(|| {
            derived(&self.inner.summary, |summary: &Rc<Summary<A::Field>>| {
                summary.error()
            })
        })
    }

    pub fn errors(&self) -> Derived<Vec<Failure<A::Field>>> {
        self.inner.views.errors.get_or_init(|| {
            derived(&self.inner.summary, |summary: &Rc<Summary<A::Field>>| {
                summary.errors()
            })
        })
    }

    pub fn warning(&self) -> Derived<Option<Failure<A::Field>>> {
        self.inner.views.warning.get_or_init(|| {
            derived(&self.inner.summary, |summary: &Rc<Summary<A::Field>>| {
                summary.warning()
            })
        })
    }

    pub fn warnings(&self) -> Derived<Vec<Failure<A::Field>>> {
        self.inner.views.warnings.get_or_init(|| {
            derived(&self.inner.summary, |summary: &Rc<Summary<A::Field>>| {
                summary.warnings()
            })
        })
    }

    /// First error message of `field`, or an empty string.
    pub fn get_field_error(&self, field: impl Into<A::Field>) -> String {
        let field = field.into();
        self.inner
            .summary
            .with(|summary| summary.field_errors(&field).first().cloned())
            .unwrap_or_default()
    }

    pub fn get_field_errors(&self, field: impl Into<A::Field>) -> Vec<String> {
        let field = field.into();
        self.inner
            .summary
            .with(|summary| summary.field_errors(&field).to_vec())
    }

    /// First warning message of `field`, or an empty string.
    pub fn get_field_warning(&self, field: impl Into<A::Field>) -> String {
        let field = field.into();
        self.inner
            .summary
            .with(|summary| summary.field_warnings(&field).first().cloned())
            .unwrap_or_default()
    }

    pub fn get_field_warnings(&self, field: impl Into<A::Field>) -> Vec<String> {
        let field = field.into();
        self.inner
            .summary
            .with(|summary| summary.field_warnings(&field).to_vec())
    }

    // locks

    /// Lock the whole form. Every field counts as locked until the handle
    /// is released or dropped.
    pub fn lock(&self) -> LockHandle {
        self.inner.locks.acquire(LockKey::Form)
    }

    pub fn lock_field(&self, field: impl Into<A::Field>) -> LockHandle {
        self.inner.locks.acquire(LockKey::Field(field.into()))
    }

    pub fn is_locked(&self) -> bool {
        self.inner.locks.is_held(&LockKey::Form)
    }

    pub fn locked(&self) -> Derived<bool> {
        self.inner.views.locked.get_or_init(|| {
            derived(
                &self.inner.locks.readonly(),
                |locks: &LockMap<A::Field>| locks.contains_key(&LockKey::Form),
            )
        })
    }

    /// Whether `field` is locked on its own or through a form lock.
    pub fn is_field_locked(&self, field: impl Into<A::Field>) -> bool {
        self.inner.locks.is_field_locked(&field.into())
    }

    /// Fields holding a field lock of their own, in order.
    pub fn locked_fields(&self) -> Derived<Vec<A::Field>> {
        self.inner.views.locked_fields.get_or_init(|| {
            derived(
                &self.inner.locks.readonly(),
                |locks: &LockMap<A::Field>| {
                    locks
                        .keys()
                        .filter_map(|key| match key {
                            LockKey::Form => None,
                            LockKey::Field(field) => Some(field.clone()),
                        })
                        .collect()
                },
            )
        })
    }

    // submission status

    pub fn is_submitting(&self) -> bool {
        self.inner.submitting.get()
    }

    pub fn submitting(&self) -> Readonly<bool> {
        self.inner.submitting.readonly()
    }

    /// Whether a submission was started since creation or the last reset.
    pub fn is_submitted(&self) -> bool {
        self.inner.submitted.get()
    }

    pub fn submitted(&self) -> Readonly<bool> {
        self.inner.submitted.readonly()
    }

    // touched / visited

    pub fn is_touched(&self) -> bool {
        self.inner.touched.with(|fields| !fields.is_empty())
    }

    pub fn touched(&self) -> Derived<bool> {
        self.inner.views.touched.get_or_init(|| {
            derived(&self.inner.touched, |fields: &FieldSet<A::Field>| {
                !fields.is_empty()
            })
        })
    }

    pub fn set_field_touched(&self, field: impl Into<A::Field>, touched: bool) {
        toggle(&self.inner.touched, &field.into(), touched);
    }

    pub fn is_field_touched(&self, field: impl Into<A::Field>) -> bool {
        let field = field.into();
        self.inner.touched.with(|fields| fields.contains(&field))
    }

    /// The touched set itself; writable.
    pub fn touched_fields(&self) -> ValueStore<FieldSet<A::Field>> {
        self.inner.touched.clone()
    }

    pub fn set_touched_fields<I, T>(&self, fields: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<A::Field>,
    {
        let fields: BTreeSet<A::Field> = fields.into_iter().map(Into::into).collect();
        self.inner.touched.set(Rc::new(fields));
    }

    pub fn is_visited(&self) -> bool {
        self.inner.visited.with(|fields| !fields.is_empty())
    }

    pub fn visited(&self) -> Derived<bool> {
        self.inner.views.visited.get_or_init(|| {
            derived(&self.inner.visited, |fields: &FieldSet<A::Field>| {
                !fields.is_empty()
            })
        })
    }

    pub fn set_field_visited(&self, field: impl Into<A::Field>, visited: bool) {
        toggle(&self.inner.visited, &field.into(), visited);
    }

    pub fn is_field_visited(&self, field: impl Into<A::Field>) -> bool {
        let field = field.into();
        self.inner.visited.with(|fields| fields.contains(&field))
    }

    /// The visited set itself; writable.
    pub fn visited_fields(&self) -> ValueStore<FieldSet<A::Field>> {
        self.inner.visited.clone()
    }

    pub fn set_visited_fields<I, T>(&self, fields: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<A::Field>,
    {
        let fields: BTreeSet<A::Field> = fields.into_iter().map(Into::into).collect();
        self.inner.visited.set(Rc::new(fields));
    }

    // events

    fn ignores_event(&self, field: &A::Field, event: &'static str) -> bool {
        let locked = self.inner.locks.is_field_locked(field);
        if locked {
            tracing::debug!(field = %field, event, "field locked, event ignored");
        }
        locked
    }

    /// The field's input received `value`.
    ///
    /// Marks the field touched. Re-validates it if it was tested and the
    /// value changed, or if it was never tested but already visited.
    pub fn on_field_input(
        &self,
        field: impl Into<A::Field>,
        value: impl Into<A::Value>,
    ) -> Option<SuiteRun<A::Field>> {
        let field = field.into();
        if self.ignores_event(&field, "input") {
            return None;
        }
        let changed = self.apply_event_value(&field, value.into());
        self.set_field_touched(field.clone(), true);

        let retest = if self.is_field_tested(field.clone()) {
            changed
        } else {
            self.is_field_visited(field.clone())
        };
        retest.then(|| self.test_field(field))
    }

    /// The field's input committed `value`.
    ///
    /// Marks the field touched and visited. Re-validates it unless it was
    /// tested and the value is unchanged.
    pub fn on_field_change(
        &self,
        field: impl Into<A::Field>,
        value: impl Into<A::Value>,
    ) -> Option<SuiteRun<A::Field>> {
        let field = field.into();
        if self.ignores_event(&field, "change") {
            return None;
        }
        let changed = self.apply_event_value(&field, value.into());
        self.set_field_touched(field.clone(), true);
        self.set_field_visited(field.clone(), true);

        let retest = !self.is_field_tested(field.clone()) || changed;
        retest.then(|| self.test_field(field))
    }

    /// The field's input lost focus.
    ///
    /// Marks the field visited. Validates it if it was touched but never
    /// tested.
    pub fn on_field_blur(&self, field: impl Into<A::Field>) -> Option<SuiteRun<A::Field>> {
        let field = field.into();
        if self.ignores_event(&field, "blur") {
            return None;
        }
        self.set_field_visited(field.clone(), true);

        let retest = !self.is_field_tested(field.clone()) && self.is_field_touched(field.clone());
        retest.then(|| self.test_field(field))
    }

    /// Write `value` and report whether the values record changed identity.
    fn apply_event_value(&self, field: &A::Field, value: A::Value) -> bool {
        let before = self.inner.values.get();
        self.set_field_value(field.clone(), value);
        !self.inner.values.with(|after| after.same(&before))
    }

    // field inputs

    pub fn find_field_input(&self, field: impl Into<A::Field>) -> Option<Rc<dyn InputElement>> {
        let field = field.into();
        let input = self.inner.input.borrow().clone();
        input.find(&field)
    }

    /// Focus the field's input. Returns whether an input was found.
    pub fn focus_field_input(&self, field: impl Into<A::Field>) -> bool {
        let Some(element) = self.find_field_input(field) else {
            return false;
        };
        element.focus();
        true
    }

    /// Blur the field's input. Returns whether an input was found.
    pub fn blur_field_input(&self, field: impl Into<A::Field>) -> bool {
        let Some(element) = self.find_field_input(field) else {
            return false;
        };
        element.blur();
        true
    }
}
