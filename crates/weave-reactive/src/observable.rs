#![forbid(unsafe_code)]

//! Version-tracked shared values and weak subscriber lists.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A [`Notifier`] never holds its internal borrow while running callbacks,
//!    so a callback may subscribe, unsubscribe, or notify again.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 4. `Observable::set` with a value equal to the current value is a no-op
//!    (no version bump, no notification).

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// RAII guard for a registered callback.
///
/// The guard owns the only strong reference to the callback; the notifier
/// keeps a weak one. Dropping the guard disconnects the callback.
#[must_use = "dropping a Subscription immediately disconnects its callback"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl Subscription {
    fn hold(callback: Box<dyn Any>) -> Self {
        Self {
            _callback: callback,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Notifier<A>
// ---------------------------------------------------------------------------

/// Ordered list of weakly-held callbacks receiving `&A`.
pub struct Notifier<A: 'static> {
    subscribers: RefCell<Vec<Weak<dyn Fn(&A)>>>,
}

impl<A: 'static> Notifier<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Register `callback`. It stays connected while the returned guard lives.
    pub fn subscribe(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        let strong: Rc<dyn Fn(&A)> = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription::hold(Box::new(strong))
    }

    /// Invoke every live callback with `arg`.
    pub fn notify(&self, arg: &A) {
        let live: Vec<Rc<dyn Fn(&A)>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in live {
            callback(arg);
        }
    }

    /// Disconnect every subscriber. Outstanding guards become inert.
    pub fn clear(&self) {
        self.subscribers.borrow_mut().clear();
    }

    /// Number of subscribers whose guard is still alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: 'static> Default for Notifier<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> fmt::Debug for Notifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Observable<T>
// ---------------------------------------------------------------------------

struct ObservableInner<T: 'static> {
    value: RefCell<T>,
    version: Cell<u64>,
    notifier: Notifier<T>,
}

/// A shared value with a version counter and change notification.
///
/// Clones share the same storage.
pub struct Observable<T: 'static> {
    inner: Rc<ObservableInner<T>>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                notifier: Notifier::new(),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value, notifying subscribers when it changed.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.inner.version.set(self.inner.version.get() + 1);
        let snapshot = self.get();
        self.inner.notifier.notify(&snapshot);
    }

    /// Mutate a copy of the value in place, then [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(&mut value);
        self.set(value);
    }

    /// Number of effective mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.notifier.subscribe(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.notifier.len()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}
