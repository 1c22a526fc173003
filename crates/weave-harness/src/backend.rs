#![forbid(unsafe_code)]

//! A renderer that records what it would do instead of drawing.
//!
//! [`RecordingBackend`] follows the renderer contract every real backend
//! follows:
//!
//! 1. Mount the tree: subscribe to each element's notifications and
//!    materialize list items.
//! 2. On `rebuild_children`, drop state for destroyed elements and re-mount
//!    the rebuilt element's children.
//! 3. Drive the tree with `update` once per frame.
//!
//! Every observation is appended to an event log that tests assert against.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use weave_element::{Element, ElementId, ElementKind, Tick, WeakElement};
use weave_reactive::Subscription;

/// One observation made by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Mounted { id: ElementId, kind: ElementKind },
    Rebuilt { id: ElementId },
    TextChanged { id: ElementId, text: String },
    ValueChanged { id: ElementId },
    OpenChanged { id: ElementId, open: bool },
    Unmounted { id: ElementId },
}

struct Mounted {
    element: WeakElement,
    _subscriptions: Vec<Subscription>,
}

struct Inner {
    events: RefCell<Vec<BackendEvent>>,
    mounted: RefCell<BTreeMap<ElementId, Mounted>>,
    materialize_lists: bool,
}

impl Inner {
    fn push(&self, event: BackendEvent) {
        self.events.borrow_mut().push(event);
    }

    fn mount(self: &Rc<Self>, element: &Element) {
        if element.is_destroyed() {
            return;
        }
        let id = element.id();
        if !self.mounted.borrow().contains_key(&id) {
            let subscriptions = self.subscribe(element);
            self.mounted.borrow_mut().insert(
                id,
                Mounted {
                    element: element.downgrade(),
                    _subscriptions: subscriptions,
                },
            );
            self.push(BackendEvent::Mounted {
                id,
                kind: element.kind(),
            });
        }

        if self.materialize_lists && element.is_open() {
            if let Some(view) = element.as_list_view() {
                view.materialize_all();
            }
        }
        for child in element.children() {
            self.mount(&child);
        }
    }

    fn subscribe(self: &Rc<Self>, element: &Element) -> Vec<Subscription> {
        let id = element.id();
        let mut subscriptions = Vec::new();

        let weak: Weak<Self> = Rc::downgrade(self);
        subscriptions.push(element.on_rebuild_children(move |rebuilt| {
            if let Some(inner) = weak.upgrade() {
                inner.push(BackendEvent::Rebuilt { id: rebuilt.id() });
                inner.prune();
                inner.mount(rebuilt);
            }
        }));

        let weak: Weak<Self> = Rc::downgrade(self);
        if let Some(sub) = element.on_text_changed(move |text| {
            if let Some(inner) = weak.upgrade() {
                inner.push(BackendEvent::TextChanged {
                    id,
                    text: text.clone(),
                });
            }
        }) {
            subscriptions.push(sub);
        }

        let weak: Weak<Self> = Rc::downgrade(self);
        if let Some(sub) = element.on_value_changed(move || {
            if let Some(inner) = weak.upgrade() {
                inner.push(BackendEvent::ValueChanged { id });
            }
        }) {
            subscriptions.push(sub);
        }

        let weak: Weak<Self> = Rc::downgrade(self);
        if let Ok(sub) = element.on_open_changed(move |open| {
            if let Some(inner) = weak.upgrade() {
                inner.push(BackendEvent::OpenChanged { id, open: *open });
                if *open {
                    if let Some(element) = inner.element(id) {
                        inner.mount(&element);
                    }
                }
            }
        }) {
            subscriptions.push(sub);
        }

        subscriptions
    }

    fn element(&self, id: ElementId) -> Option<Element> {
        self.mounted
            .borrow()
            .get(&id)
            .and_then(|mounted| mounted.element.upgrade())
    }

    /// Forget elements that were destroyed since the last prune.
    fn prune(&self) {
        let dead: Vec<ElementId> = self
            .mounted
            .borrow()
            .iter()
            .filter(|(_, m)| m.element.upgrade().is_none_or(|e| e.is_destroyed()))
            .map(|(id, _)| *id)
            .collect();
        let removed: Vec<Mounted> = {
            let mut mounted = self.mounted.borrow_mut();
            dead.iter().filter_map(|id| mounted.remove(id)).collect()
        };
        drop(removed);
        for id in dead {
            self.push(BackendEvent::Unmounted { id });
        }
    }
}

/// Event-logging stand-in for a real renderer.
pub struct RecordingBackend {
    root: Element,
    inner: Rc<Inner>,
}

impl RecordingBackend {
    /// Mount `root`, materializing list items of open list views.
    pub fn mount(root: Element) -> Self {
        Self::mount_with(root, true)
    }

    /// Mount `root`; list items are only materialized when
    /// `materialize_lists` is set.
    pub fn mount_with(root: Element, materialize_lists: bool) -> Self {
        let inner = Rc::new(Inner {
            events: RefCell::new(Vec::new()),
            mounted: RefCell::new(BTreeMap::new()),
            materialize_lists,
        });
        inner.mount(&root);
        tracing::debug!(root = %root.id(), "backend mounted");
        Self { root, inner }
    }

    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Tick the tree once and forget destroyed elements.
    pub fn update(&self, tick: &Tick) {
        self.root.update(tick);
        self.inner.prune();
    }

    #[must_use]
    pub fn events(&self) -> Vec<BackendEvent> {
        self.inner.events.borrow().clone()
    }

    /// Return and clear the event log.
    pub fn take_events(&self) -> Vec<BackendEvent> {
        std::mem::take(&mut *self.inner.events.borrow_mut())
    }

    /// How many `Rebuilt` events `id` produced so far.
    #[must_use]
    pub fn rebuilds_of(&self, id: ElementId) -> usize {
        self.inner
            .events
            .borrow()
            .iter()
            .filter(|e| matches!(e, BackendEvent::Rebuilt { id: r } if *r == id))
            .count()
    }

    #[must_use]
    pub fn mounted_count(&self) -> usize {
        self.inner.mounted.borrow().len()
    }

    #[must_use]
    pub fn is_mounted(&self, id: ElementId) -> bool {
        self.inner.mounted.borrow().contains_key(&id)
    }
}

impl Drop for RecordingBackend {
    fn drop(&mut self) {
        self.inner.mounted.borrow_mut().clear();
    }
}
