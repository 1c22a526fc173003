#![forbid(unsafe_code)]

//! Round-trip binders over arbitrary storage locations.
//!
//! A [`Binder<T>`] is a capability to read and write one value without knowing
//! where the value lives. The location is described by a [`BindTarget`]; the
//! binder adds write-side change notification and read-only enforcement.
//!
//! # Usage
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use weave_reactive::Binder;
//!
//! let speed = Rc::new(RefCell::new(1.5_f32));
//! let binder = Binder::from_cell(Rc::clone(&speed));
//!
//! binder.set(3.0).unwrap();
//! assert_eq!(*speed.borrow(), 3.0);
//!
//! *speed.borrow_mut() = 4.0;
//! assert_eq!(binder.get(), 4.0);
//! ```
//!
//! # Invariants
//!
//! 1. `get()` / `set()` always round-trip to the target; nothing is cached.
//! 2. A null target (`read()` returned `None`) reads as `T::default()`
//!    through [`Binder::get`] and as `None` through [`Binder::try_get`].
//! 3. Writes to a read-only binder fail with [`BindError::ReadOnly`] and leave
//!    the target untouched.
//! 4. `on_value_changed` fires only for writes made through this binder (or a
//!    clone of it), after the target accepted the value.
//!
//! # Failure Modes
//!
//! - Closure panic in a read or write: propagates to the caller.
//! - Target dropped while binder alive: impossible, the binder owns an `Rc`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::BindError;
use crate::observable::{Notifier, Observable, Subscription};

// ---------------------------------------------------------------------------
// BindTarget<T>
// ---------------------------------------------------------------------------

/// A storage location a [`Binder`] reads from and writes to.
pub trait BindTarget<T> {
    /// Current value, or `None` when the location is null.
    fn read(&self) -> Option<T>;

    /// Store `value` at the location.
    fn write(&self, value: T) -> Result<(), BindError>;

    fn is_read_only(&self) -> bool {
        false
    }
}

type ReadFn<T> = Box<dyn Fn() -> Option<T>>;
type WriteFn<T> = Box<dyn Fn(T) -> Result<(), BindError>>;

struct FnTarget<T> {
    read: ReadFn<T>,
    write: Option<WriteFn<T>>,
}

impl<T> BindTarget<T> for FnTarget<T> {
    fn read(&self) -> Option<T> {
        (self.read)()
    }

    fn write(&self, value: T) -> Result<(), BindError> {
        match &self.write {
            Some(write) => write(value),
            None => Err(BindError::ReadOnly),
        }
    }

    fn is_read_only(&self) -> bool {
        self.write.is_none()
    }
}

// ---------------------------------------------------------------------------
// Binder<T>
// ---------------------------------------------------------------------------

/// Type-erased get/set access to a value of type `T`.
///
/// Clones share the target and the change notifier.
pub struct Binder<T: 'static> {
    target: Rc<dyn BindTarget<T>>,
    changed: Rc<Notifier<T>>,
}

impl<T: 'static> Clone for Binder<T> {
    fn clone(&self) -> Self {
        Self {
            target: Rc::clone(&self.target),
            changed: Rc::clone(&self.changed),
        }
    }
}

impl<T: Clone + 'static> Binder<T> {
    /// Wrap an existing target.
    pub fn from_target(target: Rc<dyn BindTarget<T>>) -> Self {
        Self {
            target,
            changed: Rc::new(Notifier::new()),
        }
    }

    /// Binder over a getter/setter pair.
    pub fn new(read: impl Fn() -> T + 'static, write: impl Fn(T) + 'static) -> Self {
        Self::from_target(Rc::new(FnTarget {
            read: Box::new(move || Some(read())),
            write: Some(Box::new(move |value| {
                write(value);
                Ok(())
            })),
        }))
    }

    /// Binder over a location that may be null and may refuse writes.
    pub fn nullable(
        read: impl Fn() -> Option<T> + 'static,
        write: impl Fn(T) -> Result<(), BindError> + 'static,
    ) -> Self {
        Self::from_target(Rc::new(FnTarget {
            read: Box::new(read),
            write: Some(Box::new(write)),
        }))
    }

    /// Read-only binder over a getter.
    pub fn read_only(read: impl Fn() -> T + 'static) -> Self {
        Self::from_target(Rc::new(FnTarget {
            read: Box::new(move || Some(read())),
            write: None,
        }))
    }

    /// Read-only binder that always yields `value`.
    pub fn constant(value: T) -> Self {
        Self::read_only(move || value.clone())
    }

    /// Binder over an [`Observable`]; writes go through `Observable::set`.
    pub fn from_observable(source: &Observable<T>) -> Self
    where
        T: PartialEq,
    {
        let read_src = source.clone();
        let write_src = source.clone();
        Self::new(move || read_src.get(), move |value| write_src.set(value))
    }

    /// Binder over a shared cell.
    pub fn from_cell(cell: Rc<RefCell<T>>) -> Self {
        let write_cell = Rc::clone(&cell);
        Self::new(
            move || cell.borrow().clone(),
            move |value| *write_cell.borrow_mut() = value,
        )
    }

    /// Current value, `None` when the target is null.
    #[must_use]
    pub fn try_get(&self) -> Option<T> {
        self.target.read()
    }

    /// Current value; a null target reads as `T::default()`.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Default,
    {
        self.try_get().unwrap_or_default()
    }

    /// Write `value` to the target and notify `on_value_changed` listeners.
    pub fn set(&self, value: T) -> Result<(), BindError> {
        if self.target.is_read_only() {
            tracing::warn!(
                value_type = std::any::type_name::<T>(),
                "write rejected by read-only binder"
            );
            return Err(BindError::ReadOnly);
        }
        self.target.write(value.clone())?;
        self.changed.notify(&value);
        Ok(())
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.target.is_read_only()
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.target.read().is_none()
    }

    /// Subscribe to successful writes made through this binder.
    pub fn on_value_changed(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.changed.subscribe(callback)
    }

    /// Read-only binder that transforms this binder's value on every read.
    pub fn map<U: Clone + 'static>(&self, f: impl Fn(T) -> U + 'static) -> Binder<U> {
        let source = self.clone();
        Binder::from_target(Rc::new(FnTarget {
            read: Box::new(move || source.try_get().map(&f)),
            write: None,
        }))
    }

    /// Whether both binders share the same target.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.changed, &other.changed)
    }
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for Binder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("value", &self.try_get())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// BindingScope — lifecycle management
// ---------------------------------------------------------------------------

/// Collects subscriptions for a logical owner (e.g., an element).
///
/// Dropping or clearing the scope releases every held subscription.
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Keep `sub` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release all subscriptions immediately (the scope stays reusable).
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_reflects_external_mutation() {
        let cell = Rc::new(RefCell::new(10));
        let binder = Binder::from_cell(Rc::clone(&cell));
        *cell.borrow_mut() = 11;
        assert_eq!(binder.get(), 11);
    }

    #[test]
    fn set_writes_through_and_notifies() {
        let obs = Observable::new(String::from("a"));
        let binder = Binder::from_observable(&obs);
        let seen = Rc::new(RefCell::new(String::new()));
        let s = Rc::clone(&seen);
        let _sub = binder.on_value_changed(move |v| *s.borrow_mut() = v.clone());

        binder.set("b".to_string()).unwrap();
        assert_eq!(obs.get(), "b");
        assert_eq!(*seen.borrow(), "b");
    }

    #[test]
    fn read_only_rejects_write() {
        let binder = Binder::constant(5);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = binder.on_value_changed(move |_| h.set(h.get() + 1));

        assert!(binder.is_read_only());
        assert_eq!(binder.set(6), Err(BindError::ReadOnly));
        assert_eq!(binder.get(), 5);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn null_target_reads_default() {
        let slot: Rc<RefCell<Option<i32>>> = Rc::new(RefCell::new(None));
        let read_slot = Rc::clone(&slot);
        let write_slot = Rc::clone(&slot);
        let binder = Binder::nullable(
            move || *read_slot.borrow(),
            move |v| {
                *write_slot.borrow_mut() = Some(v);
                Ok(())
            },
        );

        assert!(binder.is_null());
        assert_eq!(binder.get(), 0);
        assert_eq!(binder.try_get(), None);

        binder.set(4).unwrap();
        assert!(!binder.is_null());
        assert_eq!(binder.get(), 4);
    }

    #[test]
    fn clones_share_notifier() {
        let binder = Binder::from_cell(Rc::new(RefCell::new(0)));
        let other = binder.clone();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = binder.on_value_changed(move |_| h.set(h.get() + 1));

        other.set(1).unwrap();
        assert_eq!(hits.get(), 1);
        assert!(binder.ptr_eq(&other));
    }

    #[test]
    fn map_is_read_only_and_live() {
        let cell = Rc::new(RefCell::new(2));
        let binder = Binder::from_cell(Rc::clone(&cell));
        let label = binder.map(|v| format!("x{v}"));
        assert!(label.is_read_only());
        assert_eq!(label.get(), "x2");
        binder.set(3).unwrap();
        assert_eq!(label.get(), "x3");
    }

    #[test]
    fn scope_releases_on_clear() {
        let binder = Binder::from_cell(Rc::new(RefCell::new(0)));
        let hits = Rc::new(Cell::new(0));
        let mut scope = BindingScope::new();
        let h = Rc::clone(&hits);
        scope.hold(binder.on_value_changed(move |_| h.set(h.get() + 1)));
        assert_eq!(scope.len(), 1);

        binder.set(1).unwrap();
        scope.clear();
        binder.set(2).unwrap();
        assert_eq!(hits.get(), 1);
        assert!(scope.is_empty());
    }
}
