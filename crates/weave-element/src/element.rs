#![forbid(unsafe_code)]

//! Element nodes: identity, flags, lifecycle, per-tick update and destroy.
//!
//! An [`Element`] is a cheap handle to one node of the composition tree.
//! The tree is strictly owned top-down: a node's children list holds the
//! strong handles, the parent link is a [`Weak`] back-reference.
//!
//! # Lifecycle
//!
//! ```text
//! Constructed --update()--> Active --destroy()--> Destroyed
//!      \___________________destroy()_____________/
//! ```
//!
//! # Invariants
//!
//! 1. `update()` on a destroyed or disabled node does nothing.
//! 2. A node polls its own state before ticking its children (top-down).
//! 3. `destroy()` runs at most once; it destroys every child before releasing
//!    the node's own subscriptions and closures.
//! 4. After `destroy()` returns no callback registered on the subtree fires.
//!
//! # Failure Modes
//!
//! - Panic inside a build/trigger/getter closure: propagates out of
//!   `update()`. A dynamic node has already destroyed its previous subtree
//!   at that point, so nothing half-built stays mounted.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use web_time::Instant;
use weave_reactive::{BindingScope, Notifier, Subscription};

use crate::button::ButtonBody;
use crate::dynamic::DynamicBody;
use crate::group::OpenCloseBody;
use crate::label::LabelBody;
use crate::list_view::ListViewBody;
use crate::menu::PopupMenuBody;
use crate::value::ValueBody;

/// Global counter for element ids.
static ELEMENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique element identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(ELEMENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node variant, used by renderers to pick a visual primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Label,
    Button,
    Field,
    Slider,
    Dropdown,
    Row,
    Column,
    Box,
    Fold,
    Window,
    WindowLauncher,
    CompositeField,
    ListView,
    Dynamic,
    PopupMenu,
}

impl ElementKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Label => "Label",
            Self::Button => "Button",
            Self::Field => "Field",
            Self::Slider => "Slider",
            Self::Dropdown => "Dropdown",
            Self::Row => "Row",
            Self::Column => "Column",
            Self::Box => "Box",
            Self::Fold => "Fold",
            Self::Window => "Window",
            Self::WindowLauncher => "WindowLauncher",
            Self::CompositeField => "CompositeField",
            Self::ListView => "ListView",
            Self::Dynamic => "Dynamic",
            Self::PopupMenu => "PopupMenu",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// User-facing state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// Ticked by `update()` and shown by renderers.
        const ENABLED = 1 << 0;
        /// Accepts user-driven writes of its bound value.
        const INTERACTABLE = 1 << 1;
    }
}

impl Default for ElementFlags {
    fn default() -> Self {
        Self::ENABLED | Self::INTERACTABLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Constructed,
    Active,
    Destroyed,
}

/// One externally driven frame: the clock reading every poll compares against.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    now: Instant,
    frame: u64,
}

impl Tick {
    #[must_use]
    pub fn new(now: Instant, frame: u64) -> Self {
        Self { now, frame }
    }

    /// Frame 0 at the current wall-clock instant.
    #[must_use]
    pub fn first() -> Self {
        Self::new(Instant::now(), 0)
    }

    /// The following frame, observed at `now`.
    #[must_use]
    pub fn next(&self, now: Instant) -> Self {
        Self::new(now, self.frame + 1)
    }

    #[inline]
    #[must_use]
    pub fn now(&self) -> Instant {
        self.now
    }

    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

// ---------------------------------------------------------------------------
// Node storage
// ---------------------------------------------------------------------------

pub(crate) enum Body {
    Group,
    Label(LabelBody),
    Value(ValueBody),
    Button(ButtonBody),
    OpenClose(OpenCloseBody),
    ListView(ListViewBody),
    Dynamic(DynamicBody),
    PopupMenu(PopupMenuBody),
}

impl Body {
    fn release(&self) {
        match self {
            Self::Group => {}
            Self::Label(label) => label.release(),
            Self::Value(value) => value.release(),
            Self::Button(button) => button.release(),
            Self::OpenClose(open) => open.release(),
            Self::ListView(list) => list.release(),
            Self::Dynamic(dynamic) => dynamic.release(),
            Self::PopupMenu(menu) => menu.release(),
        }
    }
}

struct ElementState {
    flags: ElementFlags,
    lifecycle: Lifecycle,
    parent: Option<Weak<ElementInner>>,
    display_name: Option<String>,
}

pub(crate) struct ElementInner {
    id: ElementId,
    kind: ElementKind,
    state: RefCell<ElementState>,
    pub(crate) children: RefCell<Vec<Element>>,
    pub(crate) has_header: Cell<bool>,
    pub(crate) body: Body,
    pub(crate) rebuild: Notifier<Element>,
    subtree_changed: Notifier<ElementId>,
    scope: RefCell<BindingScope>,
}

// ---------------------------------------------------------------------------
// Element handle
// ---------------------------------------------------------------------------

/// Handle to a node of the composition tree.
#[derive(Clone)]
pub struct Element {
    pub(crate) inner: Rc<ElementInner>,
}

/// Non-owning handle; the form used for parent links and captured callbacks.
#[derive(Clone, Default)]
pub struct WeakElement(Weak<ElementInner>);

impl WeakElement {
    #[must_use]
    pub fn upgrade(&self) -> Option<Element> {
        self.0.upgrade().map(|inner| Element { inner })
    }
}

impl fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(element) => write!(f, "WeakElement({})", element.id()),
            None => f.write_str("WeakElement(dangling)"),
        }
    }
}

impl Element {
    pub(crate) fn new(kind: ElementKind, body: Body) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                id: ElementId::next(),
                kind,
                state: RefCell::new(ElementState {
                    flags: ElementFlags::default(),
                    lifecycle: Lifecycle::Constructed,
                    parent: None,
                    display_name: None,
                }),
                children: RefCell::new(Vec::new()),
                has_header: Cell::new(false),
                body,
                rebuild: Notifier::new(),
                subtree_changed: Notifier::new(),
                scope: RefCell::new(BindingScope::new()),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.inner.kind
    }

    /// Explicit display name, or the kind name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.inner
            .state
            .borrow()
            .display_name
            .clone()
            .unwrap_or_else(|| self.inner.kind.name().to_owned())
    }

    pub fn set_display_name(&self, name: impl Into<String>) {
        self.inner.state.borrow_mut().display_name = Some(name.into());
    }

    #[must_use]
    pub fn flags(&self) -> ElementFlags {
        self.inner.state.borrow().flags
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.flags().contains(ElementFlags::ENABLED)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner
            .state
            .borrow_mut()
            .flags
            .set(ElementFlags::ENABLED, enabled);
    }

    #[must_use]
    pub fn is_interactable(&self) -> bool {
        self.flags().contains(ElementFlags::INTERACTABLE)
    }

    pub fn set_interactable(&self, interactable: bool) {
        self.inner
            .state
            .borrow_mut()
            .flags
            .set(ElementFlags::INTERACTABLE, interactable);
    }

    /// Own flag AND every ancestor's flag.
    #[must_use]
    pub fn is_interactable_in_hierarchy(&self) -> bool {
        let mut current = Some(self.clone());
        while let Some(element) = current {
            if !element.is_interactable() {
                return false;
            }
            current = element.parent();
        }
        true
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.state.borrow().lifecycle
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle() == Lifecycle::Destroyed
    }

    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        self.inner
            .state
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Element { inner })
    }

    pub(crate) fn set_parent(&self, parent: Option<&Element>) {
        self.inner.state.borrow_mut().parent = parent.map(|p| Rc::downgrade(&p.inner));
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakElement {
        WeakElement(Rc::downgrade(&self.inner))
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Tie `sub` to this element; it is released by [`destroy`](Self::destroy).
    pub fn hold(&self, sub: Subscription) {
        if !self.is_destroyed() {
            self.inner.scope.borrow_mut().hold(sub);
        }
    }

    // --- Notifications ---

    /// Subscribe to structural-change notifications of this node.
    pub fn on_rebuild_children(&self, callback: impl Fn(&Element) + 'static) -> Subscription {
        self.inner.rebuild.subscribe(callback)
    }

    /// Tell renderers the set of children changed and must be regenerated.
    pub fn rebuild_children(&self) {
        if self.is_destroyed() {
            return;
        }
        tracing::trace!(id = %self.id(), kind = %self.kind(), "rebuild children");
        self.inner.rebuild.notify(self);
    }

    /// Subscribe to renderer-side writes made anywhere in this subtree.
    ///
    /// The callback receives the id of the leaf that was written.
    pub fn on_subtree_value_changed(
        &self,
        callback: impl Fn(&ElementId) + 'static,
    ) -> Subscription {
        self.inner.subtree_changed.subscribe(callback)
    }

    pub(crate) fn notify_subtree_value_changed(&self) {
        let source = self.id();
        let mut current = Some(self.clone());
        while let Some(element) = current {
            element.inner.subtree_changed.notify(&source);
            current = element.parent();
        }
    }

    // --- Tick / destroy ---

    /// Poll this node, then tick its children.
    pub fn update(&self, tick: &Tick) {
        {
            let mut state = self.inner.state.borrow_mut();
            match state.lifecycle {
                Lifecycle::Destroyed => return,
                Lifecycle::Constructed => state.lifecycle = Lifecycle::Active,
                Lifecycle::Active => {}
            }
            if !state.flags.contains(ElementFlags::ENABLED) {
                return;
            }
        }

        self.update_body(tick);
        if self.is_destroyed() {
            return;
        }

        for child in self.children() {
            child.update(tick);
        }
    }

    fn update_body(&self, tick: &Tick) {
        match &self.inner.body {
            Body::Group | Body::OpenClose(_) | Body::PopupMenu(_) => {}
            Body::Label(label) => label.poll(),
            Body::Value(value) => value.poll(),
            Body::Button(button) => button.poll(),
            Body::ListView(list) => list.tick(self),
            Body::Dynamic(dynamic) => dynamic.tick(self, tick),
        }
    }

    /// Destroy this node and its whole subtree.
    ///
    /// Calling it again is a no-op. A node destroyed while still attached to a
    /// live parent is detached and the parent fires `rebuild_children`.
    pub fn destroy(&self) {
        let parent = {
            let mut state = self.inner.state.borrow_mut();
            if state.lifecycle == Lifecycle::Destroyed {
                return;
            }
            state.lifecycle = Lifecycle::Destroyed;
            state.parent.take()
        };

        let children = std::mem::take(&mut *self.inner.children.borrow_mut());
        self.inner.has_header.set(false);
        for child in &children {
            child.set_parent(None);
            child.destroy();
        }

        let released = std::mem::take(&mut *self.inner.scope.borrow_mut());
        drop(released);
        self.inner.rebuild.clear();
        self.inner.subtree_changed.clear();
        self.inner.body.release();
        tracing::trace!(id = %self.id(), kind = %self.kind(), "destroyed");

        if let Some(parent) = parent.and_then(|weak| weak.upgrade()) {
            let parent = Element { inner: parent };
            if parent.detach(self) && !parent.is_destroyed() {
                parent.rebuild_children();
            }
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("lifecycle", &self.lifecycle())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}
