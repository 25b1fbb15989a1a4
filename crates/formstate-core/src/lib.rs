//! Reactive form state.
//!
//! A [`Form`] owns a values record, runs a validation [`Suite`] over it and
//! exposes everything a UI binds to as plain accessors and subscribable
//! stores:
//!
//! - validation selectors (`valid`, `pending`, `warned`, ...) for the form
//!   and for each field
//! - error and warning messages
//! - touched, visited and locked state
//! - submission status, with [`Submitter`] for a submit button
//!
//! [`Form::field`] hands out a [`Field`] view that scopes all of this to one
//! field name. Field-change handlers (`on_field_input`, `on_field_change`,
//! `on_field_blur`) re-validate a field only once the user has interacted
//! with it, and keep already-validated fields live.
//!
//! Everything is single-threaded (`Rc`). Suites with async tests, and
//! [`Submitter`], need a tokio `LocalSet`.
//!
//! # Example
//!
//! ```
//! use formstate_core::{Form, FormOptions};
//! use formstate_model::RecordAccess;
//! use formstate_store::Readable;
//! use formstate_validate::Suite;
//!
//! let suite = Suite::new(RecordAccess::<String>::new(), |t| {
//!     t.test("email", |input| {
//!         input.enforce("email is required").is_not_blank()?;
//!         Ok(())
//!     });
//! });
//! let form = Form::new(FormOptions::new(suite));
//! let email = form.field("email");
//! let valid = email.valid();
//!
//! // Untouched: typing alone does not validate.
//! email.on_input(Some(String::new()));
//! assert!(email.is_untested());
//!
//! // Leaving the field does.
//! email.on_blur();
//! assert!(!valid.get());
//! assert_eq!(email.get_message(), "email is required");
//!
//! // Once tested, every change re-validates.
//! email.on_input(Some("ann@example.com".to_string()));
//! assert!(valid.get());
//! ```

mod config;
mod error;
mod field;
mod form;
mod input;
mod lazy;
mod locks;
pub mod logging;
mod options;
mod snapshot;
mod submit;
mod submitter;

pub use config::{FormConfig, LoggingConfig, SubmitConfig};
pub use error::{FormError, Result};
pub use field::Field;
pub use form::Form;
pub use input::{ElementTree, InputElement, InputLocator};
pub use lazy::{Memo, MemoMap};
pub use locks::{LockHandle, LockKey, LockMap};
pub use options::{Action, FormOptions};
pub use snapshot::{FieldSnapshot, FormSnapshot};
pub use submit::Submission;
pub use submitter::{SubmitState, Submitter};

pub use formstate_validate::{Scope, Selector, Suite, SuiteRun};
