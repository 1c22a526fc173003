#![forbid(unsafe_code)]

//! UI-agnostic element tree for Weave.
//!
//! An [`Element`] tree describes *what* to show and *which data* each node is
//! bound to. Renderers walk the tree, subscribe to
//! [`Element::on_rebuild_children`] for structural changes, and drive it with
//! [`Element::update`] once per frame.
//!
//! # Architecture
//!
//! ```text
//! Element (Rc handle)
//!   ├─ flags / lifecycle / parent (Weak)
//!   ├─ children: Vec<Element>       header child first when present
//!   └─ body: Group | Label | Value | Button | OpenClose
//!            | ListView | Dynamic | PopupMenu
//! ```
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`element`] | identity, flags, lifecycle, update, destroy |
//! | [`group`] | rows, columns, folds, windows, child management |
//! | [`label`], [`value`], [`button`], [`menu`] | leaves |
//! | [`list_view`] | lazily materialized list items |
//! | [`dynamic`] | rebuild-on-change subtrees, polled lookups |
//! | [`custom`] | factories keyed by runtime type |
//! | [`config`] | thread-local tunables |

pub mod button;
pub mod config;
pub mod custom;
pub mod dynamic;
pub mod element;
pub mod error;
pub mod group;
pub mod label;
pub mod list_view;
pub mod menu;
pub mod value;

pub use config::{ConfigOverride, ElementConfig};
pub use custom::{
    CreationFunc, CreationFuncScope, CreationRegistry, create_custom_element,
    creation_func_scope, declare_parent, register_creation_func, resolve_creation_func,
    unregister_creation_func, with_registry,
};
pub use dynamic::PollSchedule;
pub use element::{Element, ElementFlags, ElementId, ElementKind, Lifecycle, Tick, WeakElement};
pub use error::ElementError;
pub use label::{LabelSource, LabelType};
pub use list_view::{BinderListSource, ItemFactory, ListSource, ListView, ListViewOption};
pub use menu::MenuItem;
pub use value::SliderRange;
