//! The field accessor contract.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Bounds every field-name type must satisfy.
///
/// Field names key maps and sets (summaries, locks, touched/visited sets),
/// show up in log events, and get substituted into input selectors.
pub trait FieldKey: Clone + Ord + Hash + Debug + Display + 'static {}

impl<T> FieldKey for T where T: Clone + Ord + Hash + Debug + Display + 'static {}

/// Pure get/set/remove/update operations over a values record, addressed
/// by field name.
///
/// `set` and `remove` must return a value *identical* to the input when the
/// operation has no effect (same `Rc`, for `Rc`-backed records). `update`
/// defaults to `set(get(..))` and inherits that property.
pub trait Access: 'static {
    /// The whole values record.
    type Values: Clone + 'static;
    /// Name type addressing one field of the record.
    type Field: FieldKey;
    /// Value type of a single field.
    type Value: Clone + PartialEq + Debug + 'static;

    /// Read the current value of `field`.
    fn get(&self, values: &Self::Values, field: &Self::Field) -> Self::Value;

    /// Return `values` with `field` replaced by `value`.
    fn set(&self, values: &Self::Values, field: &Self::Field, value: Self::Value) -> Self::Values;

    /// Return `values` without `field`.
    fn remove(&self, values: &Self::Values, field: &Self::Field) -> Self::Values;

    /// Return `values` with `field` replaced by `updater(current)`.
    fn update(
        &self,
        values: &Self::Values,
        field: &Self::Field,
        updater: &dyn Fn(Self::Value) -> Self::Value,
    ) -> Self::Values {
        self.set(values, field, updater(self.get(values, field)))
    }
}
