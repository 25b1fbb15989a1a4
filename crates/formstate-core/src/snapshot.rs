//! Plain serializable copies of form and field state.

use serde::Serialize;

use formstate_model::Access;
use formstate_store::{Readable, Same};
use formstate_validate::{Failure, Selector};

use crate::field::Field;
use crate::form::Form;

/// Every query of a form, read at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSnapshot<F> {
    pub valid: bool,
    pub invalid: bool,
    pub tested: bool,
    pub untested: bool,
    pub pending: bool,
    pub warned: bool,
    pub uncertain: bool,
    pub omitted: bool,
    pub locked: bool,
    pub submitting: bool,
    pub submitted: bool,
    pub touched: bool,
    pub visited: bool,
    pub error: Option<Failure<F>>,
    pub errors: Vec<Failure<F>>,
    pub warning: Option<Failure<F>>,
    pub warnings: Vec<Failure<F>>,
    pub touched_fields: Vec<F>,
    pub visited_fields: Vec<F>,
    pub locked_fields: Vec<F>,
}

/// Every query of one field, read at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSnapshot<F, V> {
    pub name: F,
    pub value: V,
    pub valid: bool,
    pub invalid: bool,
    pub tested: bool,
    pub untested: bool,
    pub pending: bool,
    pub warned: bool,
    pub uncertain: bool,
    pub omitted: bool,
    pub locked: bool,
    pub touched: bool,
    pub visited: bool,
    pub error: String,
    pub errors: Vec<String>,
    pub warning: String,
    pub warnings: Vec<String>,
    pub message: String,
    pub messages: Vec<String>,
}

impl<A> Form<A>
where
    A: Access,
    A::Values: Same,
{
    pub fn snapshot(&self) -> FormSnapshot<A::Field> {
        FormSnapshot {
            valid: self.select(Selector::Valid),
            invalid: self.select(Selector::Invalid),
            tested: self.select(Selector::Tested),
            untested: self.select(Selector::Untested),
            pending: self.select(Selector::Pending),
            warned: self.select(Selector::Warned),
            uncertain: self.select(Selector::Uncertain),
            omitted: self.select(Selector::Omitted),
            locked: self.is_locked(),
            submitting: self.is_submitting(),
            submitted: self.is_submitted(),
            touched: self.is_touched(),
            visited: self.is_visited(),
            error: self.get_error(),
            errors: self.get_errors(),
            warning: self.get_warning(),
            warnings: self.get_warnings(),
            touched_fields: self.touched_fields().get().iter().cloned().collect(),
            visited_fields: self.visited_fields().get().iter().cloned().collect(),
            locked_fields: self.locked_fields().get(),
        }
    }
}

impl<A> Field<A>
where
    A: Access,
    A::Values: Same,
{
    pub fn snapshot(&self) -> FieldSnapshot<A::Field, A::Value> {
        FieldSnapshot {
            name: self.name().clone(),
            value: self.get_value(),
            valid: self.select(Selector::Valid),
            invalid: self.select(Selector::Invalid),
            tested: self.select(Selector::Tested),
            untested: self.select(Selector::Untested),
            pending: self.select(Selector::Pending),
            warned: self.select(Selector::Warned),
            uncertain: self.select(Selector::Uncertain),
            omitted: self.select(Selector::Omitted),
            locked: self.is_locked(),
            touched: self.is_touched(),
            visited: self.is_visited(),
            error: self.get_error(),
            errors: self.get_errors(),
            warning: self.get_warning(),
            warnings: self.get_warnings(),
            message: self.get_message(),
            messages: self.get_messages(),
        }
    }
}
