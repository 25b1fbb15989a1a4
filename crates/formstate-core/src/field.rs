//! Per-field view of a form.

use std::fmt;
use std::rc::Rc;

use formstate_model::Access;
use formstate_store::{Derived, FieldSet, PartialStore, Same, derived, derived2};
use formstate_validate::{FieldSummary, Selector, Suite, SuiteRun, Summary};

use crate::form::Form;
use crate::input::InputElement;
use crate::lazy::{Memo, MemoMap};
use crate::locks::{LockHandle, LockKey, LockMap};

/// Stores of one field, cached on the form and shared by every [`Field`]
/// handle for that name. Holds no reference back to the form.
pub(crate) struct FieldViews<A: Access> {
    name: A::Field,
    value: Memo<PartialStore<A::Value>>,
    summary: Memo<Derived<Option<Rc<FieldSummary>>>>,
    selectors: MemoMap<Selector, Derived<bool>>,
    locked: Memo<Derived<bool>>,
    touched: Memo<PartialStore<bool>>,
    visited: Memo<PartialStore<bool>>,
    error: Memo<Derived<String>>,
    errors: Memo<Derived<Vec<String>>>,
    warning: Memo<Derived<String>>,
    warnings: Memo<Derived<Vec<String>>>,
    message: Memo<Derived<String>>,
    messages: Memo<Derived<Vec<String>>>,
}

impl<A: Access> FieldViews<A> {
    pub(crate) fn new(name: A::Field) -> Self {
        Self {
            name,
            value: Memo::default(),
            summary: Memo::default(),
            selectors: MemoMap::default(),
            locked: Memo::default(),
            touched: Memo::default(),
            visited: Memo::default(),
            error: Memo::default(),
            errors: Memo::default(),
            warning: Memo::default(),
            warnings: Memo::default(),
            message: Memo::default(),
            messages: Memo::default(),
        }
    }
}

impl<A: Access> fmt::Debug for FieldViews<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldViews")
            .field("name", &self.name)
            .field("selectors", &self.selectors.len())
            .finish_non_exhaustive()
    }
}

/// A form bound to one field name.
///
/// Obtained from [`Form::field`]. All state lives in the form; handles for
/// the same name share their stores.
pub struct Field<A: Access> {
    form: Form<A>,
    views: Rc<FieldViews<A>>,
}

impl<A: Access> Clone for Field<A> {
    fn clone(&self) -> Self {
        Self {
            form: self.form.clone(),
            views: Rc::clone(&self.views),
        }
    }
}

impl<A: Access> fmt::Debug for Field<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.views.name)
            .finish_non_exhaustive()
    }
}

/// Selector accessor and store pairs for a field.
macro_rules! field_selectors {
    ($($variant:ident => $is:ident, $store:ident;)*) => {
        $(
            #[doc = concat!("Whether the field is ", stringify!($store), ".")]
            pub fn $is(&self) -> bool {
                self.select(Selector::$variant)
            }

            #[doc = concat!("Subscribable [`", stringify!($is), "`](Self::", stringify!($is), ").")]
            pub fn $store(&self) -> Derived<bool> {
                self.selected(Selector::$variant)
            }
        )*
    };
}

impl<A> Field<A>
where
    A: Access,
    A::Values: Same,
{
    pub(crate) fn new(form: Form<A>, views: Rc<FieldViews<A>>) -> Self {
        Self { form, views }
    }

    pub fn name(&self) -> &A::Field {
        &self.views.name
    }

    pub fn form(&self) -> &Form<A> {
        &self.form
    }

    /// Whether both handles share the same cached stores.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.views, &other.views)
    }

    // value

    pub fn get_value(&self) -> A::Value {
        self.form.get_field_value(self.name().clone())
    }

    /// The field's value as a writable store.
    pub fn value(&self) -> PartialStore<A::Value>
    where
        A::Value: Same,
    {
        self.views.value.get_or_init(|| {
            let name = self.name().clone();
            let view = derived2(
                &self.form.inner.values,
                &self.form.inner.suite,
                move |values: &A::Values, suite: &Suite<A>| suite.access().get(values, &name),
            );
            let form = self.form.downgrade();
            let name = self.name().clone();
            PartialStore::new(view, move |value| {
                if let Some(form) = Form::from_weak(&form) {
                    form.set_field_value(name.clone(), value);
                }
            })
        })
    }

    pub fn set_value(&self, value: impl Into<A::Value>) {
        self.form.set_field_value(self.name().clone(), value);
    }

    pub fn update_value(&self, updater: impl Fn(A::Value) -> A::Value) {
        self.form.update_field_value(self.name().clone(), updater);
    }

    pub fn remove_value(&self) {
        self.form.remove_field_value(self.name().clone());
    }

    // validation

    pub fn test(&self) -> SuiteRun<A::Field> {
        self.form.test_field(self.name().clone())
    }

    pub fn get_summary(&self) -> Option<Rc<FieldSummary>> {
        self.form.get_field_summary(self.name().clone())
    }

    pub fn summary(&self) -> Derived<Option<Rc<FieldSummary>>> {
        self.views.summary.get_or_init(|| {
            let name = self.name().clone();
            derived(
                &self.form.inner.summary,
                move |summary: &Rc<Summary<A::Field>>| summary.field(&name).cloned(),
            )
        })
    }

    pub fn select(&self, selector: Selector) -> bool {
        self.form.select_field(self.name().clone(), selector)
    }

    pub fn selected(&self, selector: Selector) -> Derived<bool> {
        self.views.selectors.get_or_insert_with(&selector, || {
            derived(
                &self.summary(),
                move |summary: &Option<Rc<FieldSummary>>| selector.apply(summary.as_deref()),
            )
        })
    }

    field_selectors! {
        Valid => is_valid, valid;
        Invalid => is_invalid, invalid;
        Tested => is_tested, tested;
        Untested => is_untested, untested;
        Pending => is_pending, pending;
        Warned => is_warned, warned;
        Uncertain => is_uncertain, uncertain;
        Omitted => is_omitted, omitted;
    }

    // messages

    pub fn get_error(&self) -> String {
        self.form.get_field_error(self.name().clone())
    }

    pub fn get_errors(&self) -> Vec<String> {
        self.form.get_field_errors(self.name().clone())
    }

    pub fn get_warning(&self) -> String {
        self.form.get_field_warning(self.name().clone())
    }

    pub fn get_warnings(&self) -> Vec<String> {
        self.form.get_field_warnings(self.name().clone())
    }

    /// First error, else first warning, else an empty string.
    pub fn get_message(&self) -> String {
        first_message(self.get_summary().as_deref())
    }

    /// Errors followed by warnings.
    pub fn get_messages(&self) -> Vec<String> {
        all_messages(self.get_summary().as_deref())
    }

    pub fn error(&self) -> Derived<String> {
        self.views.error.get_or_init(|| {
            derived(&self.summary(), |summary: &Option<Rc<FieldSummary>>| {
                summary
                    .as_deref()
                    .and_then(FieldSummary::error)
                    .map(str::to_owned)
                    .unwrap_or_default()
            })
        })
    }

    pub fn errors(&self) -> Derived<Vec<String>> {
        self.views.errors.get_or_init(|| {
            derived(&self.summary(), |summary: &Option<Rc<FieldSummary>>| {
                summary
                    .as_ref()
                    .map(|summary| summary.errors.clone())
                    .unwrap_or_default()
            })
        })
    }

    pub fn warning(&self) -> Derived<String> {
        self.views.warning.get_or_init(|| {
            derived(&self.summary(), |summary: &Option<Rc<FieldSummary>>| {
                summary
                    .as_deref()
                    .and_then(FieldSummary::warning)
                    .map(str::to_owned)
                    .unwrap_or_default()
            })
        })
    }

    pub fn warnings(&self) -> Derived<Vec<String>> {
        self.views.warnings.get_or_init(|| {
            derived(&self.summary(), |summary: &Option<Rc<FieldSummary>>| {
                summary
                    .as_ref()
                    .map(|summary| summary.warnings.clone())
                    .unwrap_or_default()
            })
        })
    }

    pub fn message(&self) -> Derived<String> {
        self.views.message.get_or_init(|| {
            derived(&self.summary(), |summary: &Option<Rc<FieldSummary>>| {
                first_message(summary.as_deref())
            })
        })
    }

    pub fn messages(&self) -> Derived<Vec<String>> {
        self.views.messages.get_or_init(|| {
            derived(&self.summary(), |summary: &Option<Rc<FieldSummary>>| {
                all_messages(summary.as_deref())
            })
        })
    }

    // locks

    pub fn lock(&self) -> LockHandle {
        self.form.lock_field(self.name().clone())
    }

    pub fn is_locked(&self) -> bool {
        self.form.is_field_locked(self.name().clone())
    }

    /// Locked on its own or through a form lock.
    pub fn locked(&self) -> Derived<bool> {
        self.views.locked.get_or_init(|| {
            let key = LockKey::Field(self.name().clone());
            derived(
                &self.form.inner.locks.readonly(),
                move |locks: &LockMap<A::Field>| {
                    locks.contains_key(&LockKey::Form) || locks.contains_key(&key)
                },
            )
        })
    }

    // touched / visited

    pub fn is_touched(&self) -> bool {
        self.form.is_field_touched(self.name().clone())
    }

    pub fn set_touched(&self, touched: bool) {
        self.form.set_field_touched(self.name().clone(), touched);
    }

    pub fn touched(&self) -> PartialStore<bool> {
        self.views.touched.get_or_init(|| {
            let name = self.name().clone();
            let view = derived(
                &self.form.inner.touched,
                move |fields: &FieldSet<A::Field>| fields.contains(&name),
            );
            let form = self.form.downgrade();
            let name = self.name().clone();
            PartialStore::new(view, move |touched| {
                if let Some(form) = Form::from_weak(&form) {
                    form.set_field_touched(name.clone(), touched);
                }
            })
        })
    }

    pub fn is_visited(&self) -> bool {
        self.form.is_field_visited(self.name().clone())
    }

    pub fn set_visited(&self, visited: bool) {
        self.form.set_field_visited(self.name().clone(), visited);
    }

    pub fn visited(&self) -> PartialStore<bool> {
        self.views.visited.get_or_init(|| {
            let name = self.name().clone();
            let view = derived(
                &self.form.inner.visited,
                move |fields: &FieldSet<A::Field>| fields.contains(&name),
            );
            let form = self.form.downgrade();
            let name = self.name().clone();
            PartialStore::new(view, move |visited| {
                if let Some(form) = Form::from_weak(&form) {
                    form.set_field_visited(name.clone(), visited);
                }
            })
        })
    }

    // events

    pub fn on_input(&self, value: impl Into<A::Value>) -> Option<SuiteRun<A::Field>> {
        self.form.on_field_input(self.name().clone(), value)
    }

    pub fn on_change(&self, value: impl Into<A::Value>) -> Option<SuiteRun<A::Field>> {
        self.form.on_field_change(self.name().clone(), value)
    }

    pub fn on_blur(&self) -> Option<SuiteRun<A::Field>> {
        self.form.on_field_blur(self.name().clone())
    }

    // input

    pub fn find_input(&self) -> Option<Rc<dyn InputElement>> {
        self.form.find_field_input(self.name().clone())
    }

    pub fn focus_input(&self) -> bool {
        self.form.focus_field_input(self.name().clone())
    }

    pub fn blur_input(&self) -> bool {
        self.form.blur_field_input(self.name().clone())
    }
}

fn first_message(summary: Option<&FieldSummary>) -> String {
    summary
        .and_then(|summary| summary.error().or_else(|| summary.warning()))
        .map(str::to_owned)
        .unwrap_or_default()
}

fn all_messages(summary: Option<&FieldSummary>) -> Vec<String> {
    summary
        .map(|summary| {
            summary
                .errors
                .iter()
                .chain(&summary.warnings)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}
