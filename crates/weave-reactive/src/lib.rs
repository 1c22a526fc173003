#![forbid(unsafe_code)]

//! Reactive primitives and round-trip binders for Weave.
//!
//! - [`Observable`]: a shared, version-tracked value with change notification.
//! - [`Notifier`] / [`Subscription`]: weak subscriber lists with RAII guards.
//! - [`Binder`]: get/set access to a value independent of where it is stored.
//! - [`ListBinder`]: per-index child binders and whole-collection edits.
//! - [`ObjectRef`]: a nullable shared object compared by identity.
//!
//! # Architecture
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Binders never cache:
//! each `get` reads the target and each `set` writes it, so a binder derived
//! from another binder (an item of a list, a field of a struct) always sees
//! external mutations of the underlying value.

pub mod binder;
pub mod child;
pub mod error;
pub mod list;
pub mod object;
pub mod observable;

pub use binder::{BindTarget, Binder, BindingScope};
pub use error::BindError;
pub use list::{ListBinder, ListValue};
pub use object::ObjectRef;
pub use observable::{Notifier, Observable, Subscription};
