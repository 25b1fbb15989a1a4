//! Field scopes for validation runs.

use std::collections::BTreeSet;
use std::fmt;

/// The fields a validation run is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope<F> {
    /// Every declared field.
    #[default]
    All,
    /// Only the listed fields; results for the others are kept.
    Only(BTreeSet<F>),
}

impl<F: Ord> Scope<F> {
    pub fn field(field: impl Into<F>) -> Self {
        Self::Only(BTreeSet::from([field.into()]))
    }

    pub fn fields<I, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<F>,
    {
        Self::Only(fields.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, field: &F) -> bool {
        match self {
            Self::All => true,
            Self::Only(fields) => fields.contains(field),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<F: Ord> From<Option<F>> for Scope<F> {
    fn from(field: Option<F>) -> Self {
        field.map_or(Self::All, |field| Self::Only(BTreeSet::from([field])))
    }
}

impl<F: Ord> From<Vec<F>> for Scope<F> {
    fn from(fields: Vec<F>) -> Self {
        Self::Only(fields.into_iter().collect())
    }
}

impl From<&str> for Scope<String> {
    fn from(field: &str) -> Self {
        Self::field(field)
    }
}

impl From<String> for Scope<String> {
    fn from(field: String) -> Self {
        Self::field(field)
    }
}

impl<F: fmt::Display> fmt::Display for Scope<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Only(fields) => {
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{field}")?;
                }
                Ok(())
            }
        }
    }
}
