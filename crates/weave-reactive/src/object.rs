#![forbid(unsafe_code)]

//! Shared object references compared by identity.
//!
//! [`ObjectRef`] is the bound value type for "custom" objects whose UI is
//! produced by a factory chosen from the object's runtime type. Equality is
//! pointer identity, so a binder over an `ObjectRef` reports a change exactly
//! when a different object (or null) is stored, not when the object's own
//! fields change.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

/// Nullable `Rc<dyn Any>` with identity equality.
#[derive(Clone, Default)]
pub struct ObjectRef(Option<Rc<dyn Any>>);

impl ObjectRef {
    #[must_use]
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Rc::new(value)))
    }

    #[must_use]
    pub fn from_rc<T: Any>(value: Rc<T>) -> Self {
        Self(Some(value))
    }

    #[must_use]
    pub fn from_any(value: Rc<dyn Any>) -> Self {
        Self(Some(value))
    }

    #[must_use]
    pub fn null() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Runtime type of the referenced object.
    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        self.0.as_ref().map(|obj| (**obj).type_id())
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.type_id() == Some(TypeId::of::<T>())
    }

    /// Typed handle to the object, sharing ownership.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        self.0.as_ref().and_then(|obj| Rc::clone(obj).downcast::<T>().ok())
    }

    #[must_use]
    pub fn as_any(&self) -> Option<&Rc<dyn Any>> {
        self.0.as_ref()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for ObjectRef {}

impl<T: Any> From<Rc<T>> for ObjectRef {
    fn from(value: Rc<T>) -> Self {
        Self::from_rc(value)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(obj) => write!(f, "ObjectRef({:p})", Rc::as_ptr(obj)),
            None => f.write_str("ObjectRef(null)"),
        }
    }
}
