//! Validation suites for form state.
//!
//! A [`Suite`] wraps a body that declares tests per field through [`Tests`].
//! Each run executes the body against a snapshot of the form's values,
//! optionally restricted to a [`Scope`], and folds the outcome into one
//! canonical [`Summary`]:
//!
//! - fields in scope take this run's result, tagged with the run id
//! - fields outside the scope keep the result of whichever run last covered
//!   them
//! - async tests settle later; a result whose field was re-run in the
//!   meantime is dropped
//!
//! Test bodies return `anyhow::Result<()>`. An `Err`, a failed
//! [`Enforce`] rule, or a panic fails the test with a message; nothing a test
//! does can abort the run.
//!
//! The [`selectors`] module turns a summary (or a field's summary) into the
//! boolean flags the form exposes.

mod adapter;
mod enforce;
mod scope;
pub mod selectors;
mod signal;
mod suite;
mod summary;

pub use adapter::{PANIC_MESSAGE, TestInput, Tests};
pub use enforce::{AsText, AssertionFailed, Blank, Enforce};
pub use scope::Scope;
pub use selectors::Selector;
pub use signal::CancelSignal;
pub use suite::{NO_LOCAL_SET_MESSAGE, Suite, SuiteRun};
pub use summary::{Counts, Failure, FieldSummary, Outcome, Severity, Summary};
