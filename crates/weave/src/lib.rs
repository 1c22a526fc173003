#![forbid(unsafe_code)]

//! Weave: declarative data binding onto a UI-agnostic element tree.
//!
//! Application code binds program state with [`Binder`]s and composes
//! elements with the [`ui`] functions. A renderer (not part of this crate)
//! walks the resulting [`Element`] tree, calls [`Element::update`] once per
//! frame, and regenerates widgets when an element fires
//! [`Element::on_rebuild_children`].
//!
//! # Crates
//!
//! | Crate | Re-exported as | Contents |
//! |-------|----------------|----------|
//! | `weave-reactive` | [`reactive`] | binders, observables, subscriptions |
//! | `weave-element` | [`element`] | element tree, list views, dynamic rebuilds, registry |
//! | `weave` | | composition API, type dispatch, binder providers |

pub mod creator;
pub mod field;
pub mod provider;
pub mod ui;

pub use weave_element as element;
pub use weave_reactive as reactive;

pub use creator::ElementCreator;
pub use field::{FieldValue, SliderValue};
pub use provider::{BinderProvider, PropertyBag, label_for_path};
pub use weave_element::{
    CreationFunc, CreationFuncScope, CreationRegistry, Element, ElementConfig, ElementError,
    ElementId, ElementKind, LabelSource, LabelType, ListViewOption, MenuItem, SliderRange, Tick,
    WeakElement, create_custom_element, creation_func_scope, declare_parent,
    register_creation_func, resolve_creation_func, unregister_creation_func,
};
pub use weave_reactive::{
    BindError, Binder, ListBinder, ListValue, Notifier, ObjectRef, Observable, Subscription,
};

/// Build a `Vec<Option<Element>>` from mixed `Element` / `Option<Element>`
/// expressions, for the container functions in [`ui`].
#[macro_export]
macro_rules! children {
    ($($element:expr),* $(,)?) => {
        ::std::vec![$(::std::option::Option::<$crate::Element>::from($element)),*]
    };
}

pub mod prelude {
    //! Common imports for composing element trees.

    pub use crate::ui;
    pub use crate::{
        Binder, BinderProvider, Element, ElementCreator, FieldValue, ListBinder, ListViewOption,
        MenuItem, ObjectRef, PropertyBag, SliderRange, Tick, bind_field, children,
    };
}
