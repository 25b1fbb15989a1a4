//! Message-bound assertions for test bodies.

use regex::Regex;

/// A failed assertion; its display text is the message given to `enforce`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AssertionFailed {
    pub message: String,
}

/// Emptiness check used by [`Enforce::is_blank`].
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

impl<T: Blank> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.as_ref().is_none_or(Blank::is_blank)
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Text view used by the length and pattern rules. Absent text reads as "".
pub trait AsText {
    fn as_text(&self) -> &str;
}

impl AsText for str {
    fn as_text(&self) -> &str {
        self
    }
}

impl AsText for String {
    fn as_text(&self) -> &str {
        self
    }
}

impl AsText for Option<String> {
    fn as_text(&self) -> &str {
        self.as_deref().unwrap_or("")
    }
}

/// Rules applied to one value, each failing with the same message.
///
/// Rules chain through `?`:
///
/// ```
/// use formstate_validate::Enforce;
///
/// let name = String::from("Ann");
/// let result = Enforce::new(&name, "name is too short")
///     .is_not_blank()
///     .and_then(|e| e.longer_than(3));
/// assert_eq!(result.err().map(|e| e.to_string()).as_deref(), Some("name is too short"));
/// ```
pub struct Enforce<'a, T: ?Sized> {
    value: &'a T,
    message: String,
}

impl<'a, T: ?Sized> Enforce<'a, T> {
    pub fn new(value: &'a T, message: impl Into<String>) -> Self {
        Self {
            value,
            message: message.into(),
        }
    }

    pub fn value(&self) -> &T {
        self.value
    }

    /// Pass when `predicate` holds.
    pub fn that(self, predicate: impl FnOnce(&T) -> bool) -> Result<Self, AssertionFailed> {
        let ok = predicate(self.value);
        self.check(ok)
    }

    fn check(self, ok: bool) -> Result<Self, AssertionFailed> {
        if ok {
            Ok(self)
        } else {
            Err(AssertionFailed {
                message: self.message,
            })
        }
    }
}

impl<T: PartialEq + ?Sized> Enforce<'_, T> {
    pub fn equals(self, expected: &T) -> Result<Self, AssertionFailed> {
        let ok = self.value == expected;
        self.check(ok)
    }

    pub fn not_equals(self, other: &T) -> Result<Self, AssertionFailed> {
        let ok = self.value != other;
        self.check(ok)
    }
}

impl<T: PartialOrd + ?Sized> Enforce<'_, T> {
    pub fn greater_than(self, bound: &T) -> Result<Self, AssertionFailed> {
        let ok = self.value > bound;
        self.check(ok)
    }

    pub fn less_than(self, bound: &T) -> Result<Self, AssertionFailed> {
        let ok = self.value < bound;
        self.check(ok)
    }
}

impl<T: Blank + ?Sized> Enforce<'_, T> {
    pub fn is_blank(self) -> Result<Self, AssertionFailed> {
        let ok = self.value.is_blank();
        self.check(ok)
    }

    pub fn is_not_blank(self) -> Result<Self, AssertionFailed> {
        let ok = !self.value.is_blank();
        self.check(ok)
    }
}

impl<T: AsText + ?Sized> Enforce<'_, T> {
    /// More than `len` characters.
    pub fn longer_than(self, len: usize) -> Result<Self, AssertionFailed> {
        let ok = self.value.as_text().chars().count() > len;
        self.check(ok)
    }

    /// Fewer than `len` characters.
    pub fn shorter_than(self, len: usize) -> Result<Self, AssertionFailed> {
        let ok = self.value.as_text().chars().count() < len;
        self.check(ok)
    }

    pub fn matches(self, pattern: &Regex) -> Result<Self, AssertionFailed> {
        let ok = pattern.is_match(self.value.as_text());
        self.check(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_rules() {
        let missing: Option<String> = None;
        assert!(Enforce::new(&missing, "required").is_not_blank().is_err());
        let spaces = Some("  ".to_string());
        assert!(Enforce::new(&spaces, "required").is_blank().is_ok());
    }

    #[test]
    fn test_chain_stops_at_first_failure() {
        let email = Some("ann".to_string());
        let at = Regex::new("@").unwrap();
        let err = Enforce::new(&email, "invalid email")
            .is_not_blank()
            .and_then(|e| e.matches(&at))
            .and_then(|e| e.longer_than(100))
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "invalid email");
    }

    #[test]
    fn test_ordering_rules() {
        assert!(Enforce::new(&5, "too small").greater_than(&3).is_ok());
        assert!(Enforce::new(&5, "too big").less_than(&3).is_err());
        assert!(Enforce::new("abc", "len").shorter_than(4).is_ok());
    }

    #[test]
    fn test_custom_predicate() {
        let age = 17_u32;
        let err = Enforce::new(&age, "must be an adult")
            .that(|age| *age >= 18)
            .err();
        assert_eq!(
            err,
            Some(AssertionFailed {
                message: "must be an adult".into()
            })
        );
    }
}
