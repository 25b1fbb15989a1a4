//! Field-name → lens table for typed records.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::access::{Access, FieldKey};

type Getter<R, T> = Rc<dyn Fn(&R) -> T>;
type Setter<R, T> = Rc<dyn Fn(&mut R, T)>;
type Remover<R> = Rc<dyn Fn(&mut R)>;

/// Get/set/remove functions for one field of `R`.
pub struct Lens<R, T> {
    get: Getter<R, T>,
    set: Setter<R, T>,
    remove: Option<Remover<R>>,
}

impl<R, T> Clone for Lens<R, T> {
    fn clone(&self) -> Self {
        Self {
            get: Rc::clone(&self.get),
            set: Rc::clone(&self.set),
            remove: self.remove.clone(),
        }
    }
}

impl<R, T> Lens<R, T> {
    pub fn new(get: impl Fn(&R) -> T + 'static, set: impl Fn(&mut R, T) + 'static) -> Self {
        Self {
            get: Rc::new(get),
            set: Rc::new(set),
            remove: None,
        }
    }

    /// Use `remove` instead of resetting the field to its default value.
    #[must_use]
    pub fn with_remove(mut self, remove: impl Fn(&mut R) + 'static) -> Self {
        self.remove = Some(Rc::new(remove));
        self
    }
}

/// Accessor for `Rc<R>` records built from an explicit lens per field.
///
/// Every field shares one value type `T` (typically `String` or an enum of
/// input kinds). Lookups of a field missing from the table read as
/// `T::default()` and leave the record untouched on writes.
///
/// ```
/// use formstate_model::{Access, AccessTable};
/// use std::rc::Rc;
///
/// #[derive(Clone, Default)]
/// struct Signup { email: String }
///
/// let access = AccessTable::<Signup, String>::new()
///     .field("email", |s: &Signup| s.email.clone(), |s, v| s.email = v);
///
/// let values = Rc::new(Signup::default());
/// let next = access.set(&values, &"email".to_string(), "a@b.c".to_string());
/// assert_eq!(access.get(&next, &"email".to_string()), "a@b.c");
/// ```
pub struct AccessTable<R, T, F = String> {
    lenses: BTreeMap<F, Lens<R, T>>,
}

impl<R, T, F: Ord> AccessTable<R, T, F> {
    pub fn new() -> Self {
        Self {
            lenses: BTreeMap::new(),
        }
    }

    /// Register a field with a getter and a setter.
    #[must_use]
    pub fn field(
        self,
        name: impl Into<F>,
        get: impl Fn(&R) -> T + 'static,
        set: impl Fn(&mut R, T) + 'static,
    ) -> Self {
        self.lens(name, Lens::new(get, set))
    }

    /// Register a field with a prepared [`Lens`].
    #[must_use]
    pub fn lens(mut self, name: impl Into<F>, lens: Lens<R, T>) -> Self {
        self.lenses.insert(name.into(), lens);
        self
    }

    /// Registered field names, in order.
    pub fn fields(&self) -> impl Iterator<Item = &F> {
        self.lenses.keys()
    }
}

impl<R, T, F: Ord> Default for AccessTable<R, T, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, T, F: Ord + Clone> Clone for AccessTable<R, T, F> {
    fn clone(&self) -> Self {
        Self {
            lenses: self.lenses.clone(),
        }
    }
}

impl<R, T, F: fmt::Debug> fmt::Debug for AccessTable<R, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTable")
            .field("fields", &self.lenses.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<R, T, F> AccessTable<R, T, F>
where
    F: FieldKey,
{
    fn lens_for(&self, field: &F) -> Option<&Lens<R, T>> {
        let lens = self.lenses.get(field);
        if lens.is_none() {
            tracing::warn!(field = %field, "field is not registered in the access table");
        }
        lens
    }
}

impl<R, T, F> Access for AccessTable<R, T, F>
where
    R: Clone + 'static,
    T: Clone + PartialEq + Default + fmt::Debug + 'static,
    F: FieldKey,
{
    type Values = Rc<R>;
    type Field = F;
    type Value = T;

    fn get(&self, values: &Rc<R>, field: &F) -> T {
        self.lens_for(field)
            .map(|lens| (lens.get)(values))
            .unwrap_or_default()
    }

    fn set(&self, values: &Rc<R>, field: &F, value: T) -> Rc<R> {
        let Some(lens) = self.lens_for(field) else {
            return Rc::clone(values);
        };
        if (lens.get)(values) == value {
            return Rc::clone(values);
        }
        let mut next = R::clone(values);
        (lens.set)(&mut next, value);
        Rc::new(next)
    }

    fn remove(&self, values: &Rc<R>, field: &F) -> Rc<R> {
        let Some(lens) = self.lens_for(field) else {
            return Rc::clone(values);
        };
        let Some(remove) = &lens.remove else {
            return self.set(values, field, T::default());
        };
        let before = (lens.get)(values);
        let mut next = R::clone(values);
        remove(&mut next);
        if (lens.get)(&next) == before {
            return Rc::clone(values);
        }
        Rc::new(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Profile {
        name: String,
        nickname: Option<String>,
    }

    fn table() -> AccessTable<Profile, String> {
        AccessTable::new()
            .field("name", |p: &Profile| p.name.clone(), |p, v| p.name = v)
            .lens(
                "nickname",
                Lens::new(
                    |p: &Profile| p.nickname.clone().unwrap_or_default(),
                    |p, v| p.nickname = Some(v),
                )
                .with_remove(|p| p.nickname = None),
            )
    }

    #[test]
    fn test_set_same_value_keeps_identity() {
        let values = Rc::new(Profile {
            name: "Ann".into(),
            nickname: None,
        });
        let next = table().set(&values, &"name".into(), "Ann".into());
        assert!(Rc::ptr_eq(&values, &next));
    }

    #[test]
    fn test_set_new_value_copies() {
        let values = Rc::new(Profile::default());
        let next = table().set(&values, &"name".into(), "Bo".into());
        assert!(!Rc::ptr_eq(&values, &next));
        assert_eq!(next.name, "Bo");
        assert_eq!(values.name, "");
    }

    #[test]
    fn test_remove_uses_custom_remover() {
        let values = Rc::new(Profile {
            name: String::new(),
            nickname: Some("A".into()),
        });
        let next = table().remove(&values, &"nickname".into());
        assert_eq!(next.nickname, None);

        let again = table().remove(&next, &"nickname".into());
        assert!(Rc::ptr_eq(&next, &again));
    }

    #[test]
    fn test_remove_without_remover_resets_to_default() {
        let values = Rc::new(Profile {
            name: "Ann".into(),
            nickname: None,
        });
        let next = table().remove(&values, &"name".into());
        assert_eq!(next.name, "");
    }

    #[test]
    fn test_unknown_field_is_inert() {
        let values = Rc::new(Profile::default());
        assert_eq!(table().get(&values, &"age".into()), "");
        let next = table().set(&values, &"age".into(), "3".into());
        assert!(Rc::ptr_eq(&values, &next));
    }

    #[test]
    fn test_fields_are_listed_in_order() {
        let names: Vec<_> = table().fields().cloned().collect();
        assert_eq!(names, vec!["name".to_string(), "nickname".to_string()]);
    }
}
