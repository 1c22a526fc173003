#![forbid(unsafe_code)]

//! Group elements and child management.
//!
//! A group owns an ordered list of children. Some groups carry a *header*
//! child in slot 0 (a fold or window title, a field label); the header is part
//! of [`Element::children`] but excluded from [`Element::contents`].
//!
//! # Invariants
//!
//! 1. A child appears in at most one children list, and its parent link
//!    points at that list's owner. Constructors take children from their
//!    previous parent and skip duplicates and destroyed elements.
//! 2. The tree is acyclic: attaching an ancestor under its descendant fails.
//! 3. Public structural edits (`add_child`, `remove_child`,
//!    `replace_children`) fire `rebuild_children` on the edited group.

use std::cell::Cell;

use weave_reactive::{Notifier, Subscription};

use crate::element::{Body, Element, ElementKind};
use crate::error::ElementError;

// ---------------------------------------------------------------------------
// Open/close state
// ---------------------------------------------------------------------------

/// Open/close state shared by folds, windows and list views.
pub(crate) struct OpenCloseBody {
    open: Cell<bool>,
    changed: Notifier<bool>,
}

impl OpenCloseBody {
    pub(crate) fn new(open: bool) -> Self {
        Self {
            open: Cell::new(open),
            changed: Notifier::new(),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.get()
    }

    pub(crate) fn set_open(&self, open: bool) {
        if self.open.replace(open) != open {
            self.changed.notify(&open);
        }
    }

    pub(crate) fn release(&self) {
        self.changed.clear();
    }
}

fn collect<I, E>(elements: I) -> Vec<Element>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Element>>,
{
    elements.into_iter().filter_map(Into::into).collect()
}

impl Element {
    // --- Constructors ---

    fn group(kind: ElementKind, body: Body, header: Option<Element>, contents: Vec<Element>) -> Self {
        let element = Self::new(kind, body);
        if let Some(header) = header {
            element.attach_header(header);
        }
        for child in contents {
            element.adopt(child);
        }
        element
    }

    /// Horizontal group. `None` entries are dropped.
    pub fn row<I, E>(elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Element>>,
    {
        Self::group(ElementKind::Row, Body::Group, None, collect(elements))
    }

    /// Vertical group. `None` entries are dropped.
    pub fn column<I, E>(elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Element>>,
    {
        Self::group(ElementKind::Column, Body::Group, None, collect(elements))
    }

    /// Framed vertical group.
    pub fn box_group<I, E>(elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Element>>,
    {
        Self::group(ElementKind::Box, Body::Group, None, collect(elements))
    }

    /// Collapsible group, closed initially.
    pub fn fold<I, E>(header: impl Into<Option<Element>>, elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Element>>,
    {
        Self::group(
            ElementKind::Fold,
            Body::OpenClose(OpenCloseBody::new(false)),
            header.into(),
            collect(elements),
        )
    }

    /// Top-level window, open initially.
    pub fn window<I, E>(title: impl Into<Option<Element>>, elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Element>>,
    {
        Self::group(
            ElementKind::Window,
            Body::OpenClose(OpenCloseBody::new(true)),
            title.into(),
            collect(elements),
        )
    }

    /// Labelled single-line group of fields.
    pub fn composite_field<I, E>(label: impl Into<Option<Element>>, elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Element>>,
    {
        let label = label.into();
        if let Some(label) = &label {
            label.promote_auto_label();
        }
        Self::group(ElementKind::CompositeField, Body::Group, label, collect(elements))
    }

    // --- Queries ---

    /// Snapshot of all children, header included.
    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        self.inner.children.borrow().clone()
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    #[must_use]
    pub fn header(&self) -> Option<Element> {
        if self.inner.has_header.get() {
            self.inner.children.borrow().first().cloned()
        } else {
            None
        }
    }

    pub(crate) fn header_len(&self) -> usize {
        usize::from(self.inner.has_header.get())
    }

    /// Children minus the header.
    #[must_use]
    pub fn contents(&self) -> Vec<Element> {
        self.inner.children.borrow()[self.header_len()..].to_vec()
    }

    #[must_use]
    pub fn content_at(&self, index: usize) -> Option<Element> {
        self.inner
            .children
            .borrow()
            .get(self.header_len() + index)
            .cloned()
    }

    #[must_use]
    pub fn content_count(&self) -> usize {
        self.child_count() - self.header_len()
    }

    /// Whether `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Element) -> bool {
        let mut current = Some(other.clone());
        while let Some(element) = current {
            if element.ptr_eq(self) {
                return true;
            }
            current = element.parent();
        }
        false
    }

    // --- Structural edits ---

    pub(crate) fn attach(&self, child: Element) {
        child.set_parent(Some(self));
        self.inner.children.borrow_mut().push(child);
    }

    /// Detach `child` from a parent other than `self`, firing that parent's
    /// rebuild.
    fn take_from_parent(&self, child: &Element) {
        let Some(old) = child.parent().filter(|old| !old.ptr_eq(self)) else {
            return;
        };
        tracing::warn!(
            child = %child.id(),
            from = %old.id(),
            to = %self.id(),
            "reparenting element that already has a parent"
        );
        if old.detach(child) {
            old.rebuild_children();
        }
    }

    /// Append `child` unless it is destroyed or already listed here.
    pub(crate) fn adopt(&self, child: Element) {
        if child.is_destroyed() || child.parent().is_some_and(|p| p.ptr_eq(self)) {
            return;
        }
        self.take_from_parent(&child);
        self.attach(child);
    }

    pub(crate) fn attach_header(&self, header: Element) {
        if header.is_destroyed() || self.header().is_some_and(|h| h.ptr_eq(&header)) {
            return;
        }
        if header.parent().is_some_and(|p| p.ptr_eq(self)) {
            self.detach(&header);
        } else {
            self.take_from_parent(&header);
        }
        header.set_parent(Some(self));
        let mut children = self.inner.children.borrow_mut();
        if self.inner.has_header.get() && !children.is_empty() {
            let old = children.remove(0);
            old.set_parent(None);
        }
        children.insert(0, header);
        self.inner.has_header.set(true);
    }

    /// Remove `child` from the children list; `false` when it was not there.
    pub(crate) fn detach(&self, child: &Element) -> bool {
        let mut children = self.inner.children.borrow_mut();
        let Some(pos) = children.iter().position(|c| c.ptr_eq(child)) else {
            return false;
        };
        children.remove(pos);
        if pos == 0 && self.inner.has_header.get() {
            self.inner.has_header.set(false);
        }
        true
    }

    fn ensure_container(&self, operation: &'static str) -> Result<(), ElementError> {
        if self.is_destroyed() {
            return Err(ElementError::Destroyed(self.id()));
        }
        match self.kind() {
            ElementKind::Row
            | ElementKind::Column
            | ElementKind::Box
            | ElementKind::Fold
            | ElementKind::Window
            | ElementKind::CompositeField => Ok(()),
            kind => Err(ElementError::Unsupported { kind, operation }),
        }
    }

    /// Append `child`, moving it out of its current parent if it has one.
    pub fn add_child(&self, child: Element) -> Result<(), ElementError> {
        self.ensure_container("add_child")?;
        if child.is_destroyed() {
            return Err(ElementError::Destroyed(child.id()));
        }
        if child.is_ancestor_of(self) {
            return Err(ElementError::Cycle {
                parent: self.id(),
                child: child.id(),
            });
        }
        if child.parent().is_some_and(|p| p.ptr_eq(self)) {
            self.detach(&child);
        } else {
            self.take_from_parent(&child);
        }
        self.attach(child);
        self.rebuild_children();
        Ok(())
    }

    /// Detach `child` without destroying it. Returns whether it was a child.
    pub fn remove_child(&self, child: &Element) -> bool {
        if !self.detach(child) {
            return false;
        }
        child.set_parent(None);
        self.rebuild_children();
        true
    }

    /// Replace the contents (the header stays). Old contents not present in
    /// the new sequence are destroyed.
    pub fn replace_children<I, E>(&self, elements: I) -> Result<(), ElementError>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Element>>,
    {
        self.ensure_container("replace_children")?;
        let header = self.header();
        let mut incoming: Vec<Element> = Vec::new();
        for child in collect(elements) {
            let duplicate = incoming.iter().any(|c| c.ptr_eq(&child));
            let is_header = header.as_ref().is_some_and(|h| h.ptr_eq(&child));
            if !duplicate && !is_header {
                incoming.push(child);
            }
        }
        for child in &incoming {
            if child.is_destroyed() {
                return Err(ElementError::Destroyed(child.id()));
            }
            if child.is_ancestor_of(self) {
                return Err(ElementError::Cycle {
                    parent: self.id(),
                    child: child.id(),
                });
            }
        }

        let old = {
            let mut children = self.inner.children.borrow_mut();
            let keep = self.header_len().min(children.len());
            children.split_off(keep)
        };
        for child in &old {
            child.set_parent(None);
        }
        let mut previous: Vec<Element> = Vec::new();
        for child in incoming {
            if let Some(prev) = child.parent() {
                prev.detach(&child);
                if !previous.iter().any(|p| p.ptr_eq(&prev)) {
                    previous.push(prev);
                }
            }
            self.attach(child);
        }
        for prev in previous {
            prev.rebuild_children();
        }
        for child in old {
            if child.parent().is_none() {
                child.destroy();
            }
        }
        self.rebuild_children();
        Ok(())
    }

    // --- Open/close ---

    pub(crate) fn open_close(&self) -> Option<&OpenCloseBody> {
        match &self.inner.body {
            Body::OpenClose(open) => Some(open),
            Body::ListView(list) => Some(list.open_state()),
            _ => None,
        }
    }

    /// Open state of a fold, window or list view; `false` for other kinds.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open_close().is_some_and(OpenCloseBody::is_open)
    }

    pub fn set_open(&self, open: bool) -> Result<(), ElementError> {
        if self.is_destroyed() {
            return Err(ElementError::Destroyed(self.id()));
        }
        let state = self.open_close().ok_or(ElementError::Unsupported {
            kind: self.kind(),
            operation: "set_open",
        })?;
        state.set_open(open);
        Ok(())
    }

    pub fn on_open_changed(
        &self,
        callback: impl Fn(&bool) + 'static,
    ) -> Result<Subscription, ElementError> {
        let state = self.open_close().ok_or(ElementError::Unsupported {
            kind: self.kind(),
            operation: "on_open_changed",
        })?;
        Ok(state.changed.subscribe(callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn labels(names: &[&str]) -> Vec<Element> {
        names.iter().map(|n| Element::label(*n)).collect()
    }

    #[test]
    fn none_entries_are_dropped() {
        let row = Element::row([Some(Element::label("a")), None, Some(Element::label("b"))]);
        assert_eq!(row.child_count(), 2);
        for child in row.children() {
            assert!(child.parent().is_some_and(|p| p.ptr_eq(&row)));
        }
    }

    #[test]
    fn fold_header_is_excluded_from_contents() {
        let fold = Element::fold(Element::label("Stats"), labels(&["hp", "mp"]));
        assert_eq!(fold.child_count(), 3);
        assert_eq!(fold.content_count(), 2);
        assert_eq!(fold.header().map(|h| h.text()), Some(Some("Stats".to_string())));
        assert_eq!(fold.content_at(0).and_then(|c| c.text()), Some("hp".to_string()));
        assert!(!fold.is_open());
    }

    #[test]
    fn add_child_reparents() {
        let child = Element::label("x");
        let a = Element::column([child.clone()]);
        let b = Element::column(Vec::<Element>::new());
        b.add_child(child.clone()).unwrap();
        assert_eq!(a.child_count(), 0);
        assert_eq!(b.child_count(), 1);
        assert!(child.parent().is_some_and(|p| p.ptr_eq(&b)));
    }

    #[test]
    fn add_child_rejects_cycles_and_leaves() {
        let inner = Element::column(Vec::<Element>::new());
        let outer = Element::row([inner.clone()]);
        assert!(matches!(
            inner.add_child(outer.clone()),
            Err(ElementError::Cycle { .. })
        ));
        assert!(matches!(
            Element::label("x").add_child(Element::label("y")),
            Err(ElementError::Unsupported { .. })
        ));
    }

    #[test]
    fn remove_child_keeps_child_alive() {
        let child = Element::label("x");
        let row = Element::row([child.clone()]);
        assert!(row.remove_child(&child));
        assert!(!child.is_destroyed());
        assert!(child.parent().is_none());
        assert!(!row.remove_child(&child));
    }

    #[test]
    fn replace_children_destroys_dropped_contents() {
        let keep = Element::label("keep");
        let drop = Element::label("drop");
        let window = Element::window(Element::label("title"), [keep.clone(), drop.clone()]);
        let fresh = Element::label("fresh");
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = window.on_rebuild_children(move |_| h.set(h.get() + 1));

        window.replace_children([keep.clone(), fresh.clone()]).unwrap();
        assert!(drop.is_destroyed());
        assert!(!keep.is_destroyed());
        assert_eq!(window.content_count(), 2);
        assert!(window.header().is_some());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn constructors_take_children_from_previous_parent() {
        let x = Element::label("x");
        let a = Element::row([x.clone()]);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = a.on_rebuild_children(move |_| h.set(h.get() + 1));

        let b = Element::column([x.clone()]);
        assert_eq!(a.child_count(), 0);
        assert_eq!(b.child_count(), 1);
        assert!(x.parent().is_some_and(|p| p.ptr_eq(&b)));
        assert_eq!(hits.get(), 1);

        let title = Element::label("t");
        let c = Element::fold(title.clone(), Vec::<Element>::new());
        let d = Element::window(title.clone(), Vec::<Element>::new());
        assert!(c.header().is_none());
        assert_eq!(c.child_count(), 0);
        assert!(d.header().is_some_and(|h| h.ptr_eq(&title)));
    }

    #[test]
    fn constructors_skip_duplicates_and_destroyed() {
        let y = Element::label("y");
        let dead = Element::label("dead");
        dead.destroy();
        let row = Element::row([y.clone(), y.clone(), dead.clone()]);
        assert_eq!(row.child_count(), 1);

        let header = Element::label("h");
        let fold = Element::fold(header.clone(), [header.clone(), Element::label("c")]);
        assert_eq!(fold.child_count(), 2);
        assert_eq!(fold.content_count(), 1);
    }

    #[test]
    fn replace_children_rebuilds_previous_parents_once() {
        let x = Element::label("x");
        let y = Element::label("y");
        let old = Element::column([x.clone(), y.clone()]);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = old.on_rebuild_children(move |_| h.set(h.get() + 1));

        let target = Element::row(Vec::<Element>::new());
        target
            .replace_children([x.clone(), y.clone(), x.clone()])
            .unwrap();
        assert_eq!(old.child_count(), 0);
        assert_eq!(target.child_count(), 2);
        assert!(y.parent().is_some_and(|p| p.ptr_eq(&target)));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn open_state_notifies_on_change_only() {
        let window = Element::window(None, Vec::<Element>::new());
        assert!(window.is_open());
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = window.on_open_changed(move |_| s.set(s.get() + 1)).unwrap();
        window.set_open(true).unwrap();
        window.set_open(false).unwrap();
        assert_eq!(seen.get(), 1);
        assert!(Element::row(Vec::<Element>::new()).set_open(true).is_err());
    }
}
