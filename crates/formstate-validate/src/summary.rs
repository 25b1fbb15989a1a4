//! Validation summaries.

use std::collections::BTreeMap;
use std::rc::Rc;

use formstate_store::Same;
use serde::{Deserialize, Serialize};

/// Failure severity of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Makes the field invalid
    Error,
    /// Reported, but the field stays valid
    Warning,
}

impl Severity {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

/// Outcome of a single declared test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(Severity, String),
    Pending,
}

/// Aggregate counters shared by field and form summaries.
pub trait Counts {
    fn error_count(&self) -> usize;
    fn warn_count(&self) -> usize;
    fn test_count(&self) -> usize;
    fn pending_count(&self) -> usize;
    fn is_valid(&self) -> bool;
}

/// Result of the latest run that covered one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub error_count: usize,
    pub warn_count: usize,
    pub test_count: usize,
    pub pending_count: usize,
    pub valid: bool,
    /// Error messages in declaration order.
    pub errors: Vec<String>,
    /// Warning messages in declaration order.
    pub warnings: Vec<String>,
}

impl FieldSummary {
    /// A declared field that no run has covered yet.
    pub fn untested() -> Self {
        Self::default()
    }

    /// A field skipped on purpose: valid with zero tests.
    pub fn omitted() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// Count the outcomes of one field's tests.
    ///
    /// A field is valid once every test settled without an error, or when it
    /// was omitted. Pending tests keep it out of both `valid` and `invalid`.
    pub fn tally<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>, omitted: bool) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.test_count += 1;
            match outcome {
                Outcome::Passed => {}
                Outcome::Pending => summary.pending_count += 1,
                Outcome::Failed(Severity::Error, message) => {
                    summary.error_count += 1;
                    summary.errors.push(message.clone());
                }
                Outcome::Failed(Severity::Warning, message) => {
                    summary.warn_count += 1;
                    summary.warnings.push(message.clone());
                }
            }
        }
        summary.valid = summary.error_count == 0
            && summary.pending_count == 0
            && (summary.test_count > 0 || omitted);
        summary
    }

    /// First error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    /// First warning message, if any.
    pub fn warning(&self) -> Option<&str> {
        self.warnings.first().map(String::as_str)
    }
}

impl Counts for FieldSummary {
    fn error_count(&self) -> usize {
        self.error_count
    }
    fn warn_count(&self) -> usize {
        self.warn_count
    }
    fn test_count(&self) -> usize {
        self.test_count
    }
    fn pending_count(&self) -> usize {
        self.pending_count
    }
    fn is_valid(&self) -> bool {
        self.valid
    }
}

/// One failing test, as reported by the form-level message accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure<F> {
    pub field: F,
    pub message: String,
    pub severity: Severity,
}

impl<F: PartialEq> Same for Failure<F> {
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

/// Merged validation state of a whole form.
///
/// Field summaries are shared `Rc`s: a field untouched by a run keeps the
/// exact same `Rc` in the next summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary<F: Ord> {
    pub error_count: usize,
    pub warn_count: usize,
    pub test_count: usize,
    pub pending_count: usize,
    pub valid: bool,
    pub tests: BTreeMap<F, Rc<FieldSummary>>,
    #[serde(skip)]
    order: Vec<F>,
}

impl<F: Ord> Default for Summary<F> {
    fn default() -> Self {
        Self {
            error_count: 0,
            warn_count: 0,
            test_count: 0,
            pending_count: 0,
            valid: false,
            tests: BTreeMap::new(),
            order: Vec::new(),
        }
    }
}

impl<F: Ord + Clone> Summary<F> {
    /// Build a summary from field summaries in declaration order.
    ///
    /// A later entry for the same field replaces an earlier one.
    pub fn new(fields: impl IntoIterator<Item = (F, Rc<FieldSummary>)>) -> Self {
        let mut summary = Self::default();
        for (field, tests) in fields {
            if summary.tests.insert(field.clone(), tests).is_none() {
                summary.order.push(field);
            }
        }
        for tests in summary.tests.values() {
            summary.error_count += tests.error_count;
            summary.warn_count += tests.warn_count;
            summary.test_count += tests.test_count;
            summary.pending_count += tests.pending_count;
        }
        summary.valid = !summary.tests.is_empty() && summary.tests.values().all(|t| t.valid);
        summary
    }

    /// Summary of one field, if any run declared it.
    pub fn field(&self, field: &F) -> Option<&Rc<FieldSummary>> {
        self.tests.get(field)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &F> {
        self.order.iter()
    }

    /// Error failures across all fields, in declaration order.
    pub fn errors(&self) -> Vec<Failure<F>> {
        self.failures(Severity::Error)
    }

    /// Warning failures across all fields, in declaration order.
    pub fn warnings(&self) -> Vec<Failure<F>> {
        self.failures(Severity::Warning)
    }

    pub fn error(&self) -> Option<Failure<F>> {
        self.first_failure(Severity::Error)
    }

    pub fn warning(&self) -> Option<Failure<F>> {
        self.first_failure(Severity::Warning)
    }

    /// Error messages of one field; empty when the field is unknown.
    pub fn field_errors(&self, field: &F) -> &[String] {
        self.tests
            .get(field)
            .map(|t| t.errors.as_slice())
            .unwrap_or_default()
    }

    /// Warning messages of one field; empty when the field is unknown.
    pub fn field_warnings(&self, field: &F) -> &[String] {
        self.tests
            .get(field)
            .map(|t| t.warnings.as_slice())
            .unwrap_or_default()
    }

    /// Same fields in the same order, each with the identical `Rc`.
    pub(crate) fn shares_fields(&self, other: &Self) -> bool {
        self.order == other.order
            && self.order.iter().all(|field| {
                match (self.tests.get(field), other.tests.get(field)) {
                    (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                    _ => false,
                }
            })
    }

    fn failures(&self, severity: Severity) -> Vec<Failure<F>> {
        self.order
            .iter()
            .filter_map(|field| self.tests.get(field).map(|tests| (field, tests)))
            .flat_map(|(field, tests)| {
                let messages = match severity {
                    Severity::Error => &tests.errors,
                    Severity::Warning => &tests.warnings,
                };
                messages.iter().map(move |message| Failure {
                    field: field.clone(),
                    message: message.clone(),
                    severity,
                })
            })
            .collect()
    }

    fn first_failure(&self, severity: Severity) -> Option<Failure<F>> {
        self.order.iter().find_map(|field| {
            let tests = self.tests.get(field)?;
            let message = match severity {
                Severity::Error => tests.errors.first(),
                Severity::Warning => tests.warnings.first(),
            }?;
            Some(Failure {
                field: field.clone(),
                message: message.clone(),
                severity,
            })
        })
    }
}

impl<F: Ord> Counts for Summary<F> {
    fn error_count(&self) -> usize {
        self.error_count
    }
    fn warn_count(&self) -> usize {
        self.warn_count
    }
    fn test_count(&self) -> usize {
        self.test_count
    }
    fn pending_count(&self) -> usize {
        self.pending_count
    }
    fn is_valid(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(severity: Severity, message: &str) -> Outcome {
        Outcome::Failed(severity, message.to_string())
    }

    #[test]
    fn test_tally_counts_each_outcome() {
        let outcomes = [
            Outcome::Passed,
            failed(Severity::Error, "required"),
            failed(Severity::Warning, "short"),
            Outcome::Pending,
        ];
        let summary = FieldSummary::tally(&outcomes, false);
        assert_eq!(summary.test_count, 4);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.warn_count, 1);
        assert_eq!(summary.pending_count, 1);
        assert!(!summary.valid);
        assert_eq!(summary.error(), Some("required"));
        assert_eq!(summary.warning(), Some("short"));
    }

    #[test]
    fn test_warnings_alone_stay_valid() {
        let summary = FieldSummary::tally(&[failed(Severity::Warning, "weak")], false);
        assert!(summary.valid);
    }

    #[test]
    fn test_pending_is_not_valid() {
        assert!(!FieldSummary::tally(&[Outcome::Pending], false).valid);
    }

    #[test]
    fn test_omitted_is_valid_without_tests() {
        assert!(FieldSummary::tally(&[], true).valid);
        assert!(!FieldSummary::tally(&[], false).valid);
        assert_eq!(FieldSummary::tally(&[], true), FieldSummary::omitted());
    }

    #[test]
    fn test_summary_aggregates_in_declaration_order() {
        let summary = Summary::new([
            (
                "b".to_string(),
                Rc::new(FieldSummary::tally(&[failed(Severity::Error, "b bad")], false)),
            ),
            (
                "a".to_string(),
                Rc::new(FieldSummary::tally(&[failed(Severity::Error, "a bad")], false)),
            ),
        ]);
        assert_eq!(summary.error_count, 2);
        assert!(!summary.valid);
        let fields: Vec<_> = summary.errors().into_iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(summary.error().map(|f| f.message), Some("b bad".to_string()));
        assert_eq!(summary.field_errors(&"zzz".to_string()), &[] as &[String]);
    }

    #[test]
    fn test_empty_summary_is_not_valid() {
        assert!(!Summary::<String>::default().valid);
    }
}
