//! Observable value stores for single-threaded UI state.
//!
//! - [`ValueStore`]: a writable container that notifies only when the new
//!   value is not [`Same`] as the old one
//! - [`Derived`]: a lazily computed view over one or more sources
//! - [`PartialStore`]: a derived view that writes back through a setter
//! - [`Readonly`]: a read-only handle to a [`ValueStore`]
//!
//! Every store is a cheap `Clone` handle to shared state. Notifications are
//! synchronous and run in subscription order.
//!
//! # Laziness
//!
//! A [`Derived`] store does not subscribe to its sources until it has a
//! subscriber of its own. Synchronous reads compare the sources' change
//! counters against the ones seen at the last computation and recompute only
//! when a source actually changed, so hundreds of unobserved views cost
//! nothing until they are read.
//!
//! # Example
//!
//! ```
//! use formstate_store::{Readable, ValueStore, derived};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let count = ValueStore::new(1_u32);
//! let doubled = derived(&count, |n: &u32| n * 2);
//!
//! let seen = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&seen);
//! let _subscription = doubled.subscribe(move |n| sink.set(n));
//!
//! count.set(4);
//! assert_eq!(seen.get(), 8);
//! count.set(4); // same value, no notification
//! ```

mod derived;
mod listeners;
mod partial;
mod same;
mod set;
mod traits;
mod value;

pub use derived::{Derived, derived, derived2};
pub use listeners::Subscription;
pub use partial::PartialStore;
pub use same::Same;
pub use set::{FieldSet, toggle};
pub use traits::{Observable, Readable, Writable};
pub use value::{Readonly, ValueStore};
