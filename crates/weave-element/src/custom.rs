#![forbid(unsafe_code)]

//! Element factories chosen by the runtime type of a bound object.
//!
//! Rust has no implicit base types, so ancestry is explicit: a type declares
//! its parent with [`CreationRegistry::declare_parent`] together with an
//! upcast function. Resolution walks that chain from the object's own type
//! and stops at the first registered factory.
//!
//! # Resolution cache
//!
//! Results are memoized per queried type, including "no factory" results.
//! Registering, unregistering or declaring a parent for type `K` evicts every
//! cached entry whose ancestor chain passes through `K`, so a later
//! registration on a base type is seen by previously resolved derived types.
//!
//! # Invariants
//!
//! 1. The ancestry table is acyclic; declarations that would close a cycle
//!    are rejected.
//! 2. A factory is always called with an object of the type it was
//!    registered for (the object is upcast along the chain first).
//! 3. [`CreationFuncScope`] restores the previous *direct* registration when
//!    dropped, including on early return and unwind.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use ahash::AHashMap;
use weave_reactive::ObjectRef;

use crate::element::Element;
use crate::error::ElementError;

type CreateFn = Rc<dyn Fn(Option<Element>, &ObjectRef) -> Option<Element>>;
type UpcastFn = Rc<dyn Fn(&ObjectRef) -> Option<ObjectRef>>;

/// A registered factory: `(label, object) -> element`.
#[derive(Clone)]
pub struct CreationFunc {
    target: TypeId,
    type_name: &'static str,
    func: CreateFn,
}

impl CreationFunc {
    /// Factory for objects of type `T`.
    pub fn new<T: Any>(f: impl Fn(Option<Element>, Rc<T>) -> Option<Element> + 'static) -> Self {
        Self {
            target: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            func: Rc::new(move |label, object| {
                let typed = object.downcast::<T>()?;
                f(label, typed)
            }),
        }
    }

    /// Factory keyed by an arbitrary type id; the object is passed untyped.
    pub fn erased(
        target: TypeId,
        type_name: &'static str,
        f: impl Fn(Option<Element>, &ObjectRef) -> Option<Element> + 'static,
    ) -> Self {
        Self {
            target,
            type_name,
            func: Rc::new(f),
        }
    }

    #[must_use]
    pub fn target(&self) -> TypeId {
        self.target
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn call(&self, label: Option<Element>, object: &ObjectRef) -> Option<Element> {
        (self.func)(label, object)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for CreationFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationFunc")
            .field("type_name", &self.type_name)
            .finish()
    }
}

struct Ancestry {
    parent: TypeId,
    upcast: UpcastFn,
}

/// Type-keyed factory table with explicit ancestry.
#[derive(Default)]
pub struct CreationRegistry {
    registered: AHashMap<TypeId, CreationFunc>,
    parents: AHashMap<TypeId, Ancestry>,
    resolved: RefCell<AHashMap<TypeId, Option<CreationFunc>>>,
}

impl CreationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `T`, returning the one it replaced.
    pub fn register<T: Any>(
        &mut self,
        f: impl Fn(Option<Element>, Rc<T>) -> Option<Element> + 'static,
    ) -> Option<CreationFunc> {
        self.register_erased(TypeId::of::<T>(), CreationFunc::new::<T>(f))
    }

    pub fn register_erased(&mut self, key: TypeId, func: CreationFunc) -> Option<CreationFunc> {
        tracing::debug!(type_name = func.type_name(), "creation func registered");
        let previous = self.registered.insert(key, func);
        self.invalidate(key);
        previous
    }

    /// Remove the direct registration for `key`. Returns whether one existed.
    pub fn unregister(&mut self, key: TypeId) -> bool {
        let removed = self.registered.remove(&key);
        if let Some(func) = &removed {
            tracing::debug!(type_name = func.type_name(), "creation func unregistered");
            self.invalidate(key);
        }
        removed.is_some()
    }

    /// Direct registration for `key`, ignoring ancestry.
    #[must_use]
    pub fn registered(&self, key: TypeId) -> Option<CreationFunc> {
        self.registered.get(&key).cloned()
    }

    /// Put back a snapshot taken with [`registered`](Self::registered).
    pub fn restore(&mut self, key: TypeId, snapshot: Option<CreationFunc>) {
        match snapshot {
            Some(func) => {
                self.register_erased(key, func);
            }
            None => {
                self.unregister(key);
            }
        }
    }

    /// Declare `B` as the parent type of `D`.
    pub fn declare_parent<D: Any, B: Any>(
        &mut self,
        upcast: impl Fn(&D) -> Rc<B> + 'static,
    ) -> Result<(), ElementError> {
        let derived = TypeId::of::<D>();
        let base = TypeId::of::<B>();
        if self.chain(base).contains(&derived) {
            return Err(ElementError::AncestryCycle {
                type_name: type_name::<D>(),
            });
        }
        let upcast: UpcastFn = Rc::new(move |object: &ObjectRef| {
            object
                .downcast::<D>()
                .map(|d| ObjectRef::from_rc(upcast(&d)))
        });
        self.parents.insert(
            derived,
            Ancestry {
                parent: base,
                upcast,
            },
        );
        tracing::debug!(
            derived = type_name::<D>(),
            base = type_name::<B>(),
            "type parent declared"
        );
        self.invalidate(derived);
        Ok(())
    }

    /// `key` followed by its declared ancestors.
    fn chain(&self, key: TypeId) -> Vec<TypeId> {
        let mut chain = vec![key];
        let mut current = key;
        while let Some(ancestry) = self.parents.get(&current) {
            if chain.contains(&ancestry.parent) {
                break;
            }
            chain.push(ancestry.parent);
            current = ancestry.parent;
        }
        chain
    }

    /// Nearest factory along the ancestor chain of `key`, memoized.
    #[must_use]
    pub fn resolve(&self, key: TypeId) -> Option<CreationFunc> {
        if let Some(cached) = self.resolved.borrow().get(&key) {
            return cached.clone();
        }
        let found = self
            .chain(key)
            .into_iter()
            .find_map(|ty| self.registered.get(&ty).cloned());
        self.resolved.borrow_mut().insert(key, found.clone());
        found
    }

    /// Evict cached resolutions whose chain passes through `changed`.
    fn invalidate(&self, changed: TypeId) {
        let stale: Vec<TypeId> = self
            .resolved
            .borrow()
            .keys()
            .copied()
            .filter(|key| self.chain(*key).contains(&changed))
            .collect();
        let mut resolved = self.resolved.borrow_mut();
        for key in stale {
            resolved.remove(&key);
        }
    }

    /// Factory for `object` plus the object upcast to the factory's type.
    #[must_use]
    pub fn prepare(&self, object: &ObjectRef) -> Option<(CreationFunc, ObjectRef)> {
        let key = object.type_id()?;
        let func = self.resolve(key)?;
        let mut current = object.clone();
        for ty in self.chain(key) {
            if ty == func.target() {
                return Some((func, current));
            }
            let ancestry = self.parents.get(&ty)?;
            current = (ancestry.upcast)(&current)?;
        }
        None
    }

    /// Build the element for `object` with its resolved factory.
    pub fn create(&self, label: Option<Element>, object: &ObjectRef) -> Option<Element> {
        let (func, object) = self.prepare(object)?;
        func.call(label, &object)
    }

    /// Number of memoized resolutions (hits and misses).
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.resolved.borrow().len()
    }
}

impl fmt::Debug for CreationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationRegistry")
            .field("registered", &self.registered.len())
            .field("parents", &self.parents.len())
            .field("cached", &self.cached_len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Thread-local default registry
// ---------------------------------------------------------------------------

thread_local! {
    static REGISTRY: RefCell<CreationRegistry> = RefCell::new(CreationRegistry::new());
}

/// Run `f` with the thread's default registry.
///
/// Factories must not be invoked from inside `f`; use
/// [`create_custom_element`], which calls them outside the borrow.
pub fn with_registry<R>(f: impl FnOnce(&mut CreationRegistry) -> R) -> R {
    REGISTRY.with(|registry| f(&mut registry.borrow_mut()))
}

pub fn register_creation_func<T: Any>(
    f: impl Fn(Option<Element>, Rc<T>) -> Option<Element> + 'static,
) -> Option<CreationFunc> {
    with_registry(|r| r.register::<T>(f))
}

pub fn unregister_creation_func<T: Any>() -> bool {
    with_registry(|r| r.unregister(TypeId::of::<T>()))
}

#[must_use]
pub fn resolve_creation_func<T: Any>() -> Option<CreationFunc> {
    with_registry(|r| r.resolve(TypeId::of::<T>()))
}

pub fn declare_parent<D: Any, B: Any>(
    upcast: impl Fn(&D) -> Rc<B> + 'static,
) -> Result<(), ElementError> {
    with_registry(|r| r.declare_parent::<D, B>(upcast))
}

/// Element for `object` from the default registry; `None` for a null object
/// or a type without a factory.
pub fn create_custom_element(label: Option<Element>, object: &ObjectRef) -> Option<Element> {
    let (func, object) = with_registry(|r| r.prepare(object))?;
    func.call(label, &object)
}

/// Register `f` for `T` until the returned guard is dropped.
pub fn creation_func_scope<T: Any>(
    f: impl Fn(Option<Element>, Rc<T>) -> Option<Element> + 'static,
) -> CreationFuncScope<T> {
    let previous = with_registry(|r| {
        let previous = r.registered(TypeId::of::<T>());
        r.register::<T>(f);
        previous
    });
    CreationFuncScope {
        previous,
        _marker: PhantomData,
    }
}

/// Restores the registration for `T` that was in place before the scope.
#[must_use = "dropping the scope immediately restores the previous registration"]
pub struct CreationFuncScope<T: Any> {
    previous: Option<CreationFunc>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> Drop for CreationFuncScope<T> {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = REGISTRY.try_with(|registry| {
            if let Ok(mut registry) = registry.try_borrow_mut() {
                registry.restore(TypeId::of::<T>(), previous);
            } else {
                tracing::warn!(
                    type_name = type_name::<T>(),
                    "creation func scope dropped while registry is borrowed"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base {
        name: &'static str,
    }

    struct Derived {
        base: Rc<Base>,
    }

    struct Leaf {
        derived: Rc<Derived>,
    }

    fn named(label: &str) -> impl Fn(Option<Element>, Rc<Base>) -> Option<Element> + 'static {
        let label = label.to_owned();
        move |_, base| Some(Element::label(format!("{label}:{}", base.name)))
    }

    fn text(element: Option<Element>) -> Option<String> {
        element.and_then(|e| e.text())
    }

    fn hierarchy() -> CreationRegistry {
        let mut registry = CreationRegistry::new();
        registry
            .declare_parent::<Derived, Base>(|d| Rc::clone(&d.base))
            .unwrap();
        registry
            .declare_parent::<Leaf, Derived>(|l| Rc::clone(&l.derived))
            .unwrap();
        registry
    }

    fn leaf() -> ObjectRef {
        ObjectRef::new(Leaf {
            derived: Rc::new(Derived {
                base: Rc::new(Base { name: "b" }),
            }),
        })
    }

    #[test]
    fn derived_resolves_to_base_factory_with_upcast_object() {
        let mut registry = hierarchy();
        registry.register::<Base>(named("base"));
        assert_eq!(text(registry.create(None, &leaf())).as_deref(), Some("base:b"));
    }

    #[test]
    fn late_base_registration_invalidates_cached_miss() {
        let mut registry = hierarchy();
        assert!(registry.resolve(TypeId::of::<Leaf>()).is_none());
        assert_eq!(registry.cached_len(), 1);

        registry.register::<Base>(named("late"));
        assert_eq!(registry.cached_len(), 0);
        assert!(registry.resolve(TypeId::of::<Leaf>()).is_some());
    }

    #[test]
    fn nearest_registration_wins_and_unregister_falls_back() {
        let mut registry = hierarchy();
        registry.register::<Base>(named("base"));
        registry.register::<Derived>(|_, _| Some(Element::label("derived")));
        assert_eq!(text(registry.create(None, &leaf())).as_deref(), Some("derived"));

        assert!(registry.unregister(TypeId::of::<Derived>()));
        assert!(!registry.unregister(TypeId::of::<Derived>()));
        assert_eq!(text(registry.create(None, &leaf())).as_deref(), Some("base:b"));
    }

    #[test]
    fn ancestry_cycles_are_rejected() {
        let mut registry = hierarchy();
        let result = registry.declare_parent::<Base, Leaf>(|_| {
            Rc::new(Leaf {
                derived: Rc::new(Derived {
                    base: Rc::new(Base { name: "x" }),
                }),
            })
        });
        assert!(matches!(result, Err(ElementError::AncestryCycle { .. })));
    }

    #[test]
    fn null_and_unknown_objects_create_nothing() {
        let registry = hierarchy();
        assert!(registry.create(None, &ObjectRef::null()).is_none());
        assert!(registry.create(None, &ObjectRef::new(5_u32)).is_none());
    }

    #[test]
    fn scope_restores_previous_registration() {
        struct Scoped;
        register_creation_func::<Scoped>(|_, _| Some(Element::label("outer")));
        let object = ObjectRef::new(Scoped);
        {
            let _scope = creation_func_scope::<Scoped>(|_, _| Some(Element::label("inner")));
            assert_eq!(text(create_custom_element(None, &object)).as_deref(), Some("inner"));
        }
        assert_eq!(text(create_custom_element(None, &object)).as_deref(), Some("outer"));
        assert!(unregister_creation_func::<Scoped>());
        assert!(resolve_creation_func::<Scoped>().is_none());
    }

    #[test]
    fn scope_without_previous_unregisters_on_drop() {
        struct Fresh;
        {
            let _scope = creation_func_scope::<Fresh>(|_, _| None);
            assert!(resolve_creation_func::<Fresh>().is_some());
        }
        assert!(resolve_creation_func::<Fresh>().is_none());
    }
}
