#![forbid(unsafe_code)]

//! Child binders derived from a parent binder.
//!
//! A child binder holds no storage of its own. Reading projects the parent's
//! current value; writing produces a replacement parent value and writes it
//! back through the parent:
//!
//! ```text
//! get()  = read(parent.get())
//! set(v) = parent.set(write(parent.get(), v))
//! ```
//!
//! Replacing the whole parent value keeps binders over copy-semantics
//! containers (`Vec<T>`, arrays, plain structs) correct.

use std::rc::Rc;

use crate::binder::{BindTarget, Binder};
use crate::error::BindError;

struct ChildTarget<P: 'static, C> {
    parent: Binder<P>,
    read: Box<dyn Fn(&P) -> Option<C>>,
    write: Box<dyn Fn(P, C) -> Result<P, BindError>>,
}

impl<P: Clone + 'static, C> BindTarget<C> for ChildTarget<P, C> {
    fn read(&self) -> Option<C> {
        self.parent.try_get().and_then(|parent| (self.read)(&parent))
    }

    fn write(&self, value: C) -> Result<(), BindError> {
        let parent = self.parent.try_get().ok_or(BindError::Null)?;
        let replaced = (self.write)(parent, value)?;
        self.parent.set(replaced)
    }

    fn is_read_only(&self) -> bool {
        self.parent.is_read_only()
    }
}

impl<P: Clone + 'static> Binder<P> {
    /// Derive a binder for a part of this binder's value.
    ///
    /// `read` returns `None` when the part does not exist (e.g. a stale
    /// index), which makes the child read as null instead of faulting.
    pub fn child<C: Clone + 'static>(
        &self,
        read: impl Fn(&P) -> Option<C> + 'static,
        write: impl Fn(P, C) -> Result<P, BindError> + 'static,
    ) -> Binder<C> {
        Binder::from_target(Rc::new(ChildTarget {
            parent: self.clone(),
            read: Box::new(read),
            write: Box::new(write),
        }))
    }

    /// Derive a binder for a struct field through a getter/setter pair.
    pub fn field<C: Clone + 'static>(
        &self,
        get: impl Fn(&P) -> C + 'static,
        set: impl Fn(&mut P, C) + 'static,
    ) -> Binder<C> {
        self.child(
            move |parent| Some(get(parent)),
            move |mut parent, value| {
                set(&mut parent, value);
                Ok(parent)
            },
        )
    }
}
