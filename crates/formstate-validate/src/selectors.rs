//! Boolean predicates over summaries.
//!
//! Every selector accepts `None` for a field no run has declared yet; such a
//! field reads as untested and uncertain.

use serde::Serialize;

use crate::summary::Counts;

pub fn valid<S: Counts>(summary: Option<&S>) -> bool {
    summary.is_some_and(Counts::is_valid)
}

pub fn invalid<S: Counts>(summary: Option<&S>) -> bool {
    summary.is_some_and(|s| s.error_count() > 0)
}

pub fn tested<S: Counts>(summary: Option<&S>) -> bool {
    summary.is_some_and(|s| s.test_count() > 0)
}

pub fn untested<S: Counts>(summary: Option<&S>) -> bool {
    !tested(summary)
}

pub fn pending<S: Counts>(summary: Option<&S>) -> bool {
    summary.is_some_and(|s| s.pending_count() > 0)
}

pub fn warned<S: Counts>(summary: Option<&S>) -> bool {
    summary.is_some_and(|s| s.warn_count() > 0)
}

/// Neither definitively valid nor invalid.
pub fn uncertain<S: Counts>(summary: Option<&S>) -> bool {
    !valid(summary) && !invalid(summary)
}

/// Valid only because nothing was tested.
pub fn omitted<S: Counts>(summary: Option<&S>) -> bool {
    valid(summary) && untested(summary)
}

/// The selectors as values, for building views generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    Valid,
    Invalid,
    Tested,
    Untested,
    Pending,
    Warned,
    Uncertain,
    Omitted,
}

impl Selector {
    pub const ALL: [Selector; 8] = [
        Self::Valid,
        Self::Invalid,
        Self::Tested,
        Self::Untested,
        Self::Pending,
        Self::Warned,
        Self::Uncertain,
        Self::Omitted,
    ];

    pub fn apply<S: Counts>(self, summary: Option<&S>) -> bool {
        match self {
            Self::Valid => valid(summary),
            Self::Invalid => invalid(summary),
            Self::Tested => tested(summary),
            Self::Untested => untested(summary),
            Self::Pending => pending(summary),
            Self::Warned => warned(summary),
            Self::Uncertain => uncertain(summary),
            Self::Omitted => omitted(summary),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Tested => "tested",
            Self::Untested => "untested",
            Self::Pending => "pending",
            Self::Warned => "warned",
            Self::Uncertain => "uncertain",
            Self::Omitted => "omitted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{FieldSummary, Outcome, Severity};
    use proptest::prelude::*;

    fn outcome() -> impl Strategy<Value = Outcome> {
        prop_oneof![
            Just(Outcome::Passed),
            Just(Outcome::Pending),
            Just(Outcome::Failed(Severity::Error, "e".into())),
            Just(Outcome::Failed(Severity::Warning, "w".into())),
        ]
    }

    #[test]
    fn test_absent_summary() {
        let none: Option<&FieldSummary> = None;
        assert!(!valid(none));
        assert!(!invalid(none));
        assert!(untested(none));
        assert!(uncertain(none));
        assert!(!omitted(none));
    }

    #[test]
    fn test_omitted_summary() {
        let summary = FieldSummary::omitted();
        assert!(omitted(Some(&summary)));
        assert!(!uncertain(Some(&summary)));
    }

    #[test]
    fn test_apply_matches_functions() {
        let summary = FieldSummary::tally(&[Outcome::Failed(Severity::Error, "x".into())], false);
        let hits: Vec<_> = Selector::ALL
            .into_iter()
            .filter(|selector| selector.apply(Some(&summary)))
            .map(Selector::name)
            .collect();
        assert_eq!(hits, vec!["invalid", "tested"]);
    }

    proptest! {
        #[test]
        fn prop_selector_invariants(
            outcomes in proptest::collection::vec(outcome(), 0..6),
            omit in any::<bool>(),
        ) {
            let summary = FieldSummary::tally(&outcomes, omit && outcomes.is_empty());
            let s = Some(&summary);
            prop_assert!(!valid(s) || summary.error_count == 0);
            prop_assert_eq!(untested(s), summary.test_count == 0);
            prop_assert_eq!(omitted(s), valid(s) && summary.test_count == 0);
            prop_assert_eq!(uncertain(s), !valid(s) && !invalid(s));
            if summary.pending_count == 0 && summary.test_count > 0 {
                prop_assert_eq!(valid(s), summary.error_count == 0);
            }
        }
    }
}
