//! Default accessor for plain keyed records.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::access::Access;

/// A plain keyed record: field name to value, shared behind an `Rc`.
///
/// Mutations through [`RecordAccess`] are copy-on-write, so every distinct
/// state of the form is a distinct `Rc` and unchanged states keep theirs.
pub type Record<T = String> = Rc<BTreeMap<String, T>>;

/// Build a [`Record`] from `(name, value)` pairs.
pub fn record<K, T, I>(entries: I) -> Record<T>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, T)>,
{
    Rc::new(
        entries
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect(),
    )
}

/// Direct property access on a [`Record`].
///
/// Absent fields read as `None`; setting `None` removes the field.
pub struct RecordAccess<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T> RecordAccess<T> {
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<T> Default for RecordAccess<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RecordAccess<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RecordAccess<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecordAccess")
    }
}

impl<T> Access for RecordAccess<T>
where
    T: Clone + PartialEq + fmt::Debug + 'static,
{
    type Values = Record<T>;
    type Field = String;
    type Value = Option<T>;

    fn get(&self, values: &Record<T>, field: &String) -> Option<T> {
        values.get(field).cloned()
    }

    fn set(&self, values: &Record<T>, field: &String, value: Option<T>) -> Record<T> {
        let Some(value) = value else {
            return self.remove(values, field);
        };
        if values.get(field) == Some(&value) {
            return Rc::clone(values);
        }
        let mut next = BTreeMap::clone(values);
        next.insert(field.clone(), value);
        Rc::new(next)
    }

    fn remove(&self, values: &Record<T>, field: &String) -> Record<T> {
        if !values.contains_key(field) {
            return Rc::clone(values);
        }
        let mut next = BTreeMap::clone(values);
        next.remove(field);
        Rc::new(next)
    }
}
