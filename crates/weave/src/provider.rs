#![forbid(unsafe_code)]

//! Binder resolution by name.
//!
//! Composition code often names the value it wants (`"player.speed"`) rather
//! than building a binder by hand. A [`BinderProvider`] turns such a path into
//! a binder plus a default label; an unknown path or a type mismatch yields
//! `None`, which the `ui` functions pass through as "no element".

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use weave_reactive::{BindError, Binder};

/// Resolves a path to a binder and its default label.
pub trait BinderProvider {
    fn resolve<T: Clone + 'static>(&self, path: &str) -> Option<(Binder<T>, String)>;
}

/// Default label for `path`: its last `.`-separated segment.
#[must_use]
pub fn label_for_path(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// String-keyed store of shared, dynamically typed properties.
///
/// Clones share the same store.
#[derive(Clone, Default)]
pub struct PropertyBag {
    entries: Rc<RefCell<AHashMap<String, Rc<dyn Any>>>>,
}

impl PropertyBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `path`, replacing any previous entry, and return
    /// the shared cell holding it.
    pub fn insert<T: 'static>(&self, path: impl Into<String>, value: T) -> Rc<RefCell<T>> {
        let cell = Rc::new(RefCell::new(value));
        let erased: Rc<dyn Any> = Rc::clone(&cell) as Rc<dyn Any>;
        self.entries.borrow_mut().insert(path.into(), erased);
        cell
    }

    fn cell<T: 'static>(&self, path: &str) -> Option<Rc<RefCell<T>>> {
        let entry = self.entries.borrow().get(path).cloned()?;
        entry.downcast::<RefCell<T>>().ok()
    }

    #[must_use]
    pub fn get<T: Clone + 'static>(&self, path: &str) -> Option<T> {
        self.cell::<T>(path).map(|cell| cell.borrow().clone())
    }

    /// Overwrite an existing property of the same type.
    pub fn set<T: 'static>(&self, path: &str, value: T) -> Result<(), BindError> {
        let cell = self.cell::<T>(path).ok_or(BindError::TypeMismatch {
            expected: type_name::<T>(),
        })?;
        *cell.borrow_mut() = value;
        Ok(())
    }

    pub fn remove(&self, path: &str) -> bool {
        self.entries.borrow_mut().remove(path).is_some()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.borrow().contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl BinderProvider for PropertyBag {
    fn resolve<T: Clone + 'static>(&self, path: &str) -> Option<(Binder<T>, String)> {
        let Some(cell) = self.cell::<T>(path) else {
            tracing::debug!(path, value_type = type_name::<T>(), "unresolved binder path");
            return None;
        };
        Some((Binder::from_cell(cell), label_for_path(path).to_owned()))
    }
}

impl fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        f.debug_struct("PropertyBag").field("keys", &keys).finish()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __last_segment {
    ($last:ident) => {
        ::core::stringify!($last)
    };
    ($first:ident . $($rest:ident).+) => {
        $crate::__last_segment!($($rest).+)
    };
}

/// Binder over a field path of an `Rc<RefCell<S>>`, with the last path
/// segment as its label.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use weave::bind_field;
///
/// #[derive(Clone, Default)]
/// struct Stats { hp: i32 }
/// #[derive(Clone, Default)]
/// struct Player { stats: Stats }
///
/// let player = Rc::new(RefCell::new(Player::default()));
/// let (hp, label) = bind_field!(player, stats.hp);
/// hp.set(12).unwrap();
/// assert_eq!(player.borrow().stats.hp, 12);
/// assert_eq!(label, "hp");
/// ```
#[macro_export]
macro_rules! bind_field {
    ($cell:expr, $($field:ident).+) => {{
        let binder = $crate::reactive::Binder::from_cell(::std::rc::Rc::clone(&$cell));
        (
            binder.field(
                |value| value.$($field).+.clone(),
                |value, next| value.$($field).+ = next,
            ),
            $crate::__last_segment!($($field).+),
        )
    }};
}
