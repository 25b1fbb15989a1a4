//! Field access over structured form values.
//!
//! A form's values are an opaque record `V`. Everything that needs to look
//! inside that record goes through an [`Access`] implementation, which
//! addresses one field at a time by name:
//!
//! - [`RecordAccess`]: the default accessor for plain keyed records ([`Record`])
//! - [`AccessTable`]: an explicit field-name → lens table for typed records
//!
//! Both honor the structural-sharing rule the reactive layer depends on: an
//! operation that changes nothing hands back the *same* `Rc`, so downstream
//! stores can detect "no change" with a pointer comparison.
//!
//! # Example
//!
//! ```
//! use formstate_model::{Access, RecordAccess, record};
//! use std::rc::Rc;
//!
//! let values = record([("name", "Ann".to_string())]);
//! let access = RecordAccess::<String>::new();
//!
//! let same = access.set(&values, &"name".to_string(), Some("Ann".to_string()));
//! assert!(Rc::ptr_eq(&values, &same));
//! ```

mod access;
mod record;
mod table;

pub use access::{Access, FieldKey};
pub use record::{Record, RecordAccess, record};
pub use table::{AccessTable, Lens};
