#![forbid(unsafe_code)]

//! List views: one lazily materialized item element per collection index.
//!
//! A list view owns a header label and one content child per *materialized*
//! item. Renderers materialize items on demand with
//! [`ListView::get_or_create_item_element`]; the view never builds items for
//! indices beyond the live length of the bound collection.
//!
//! # Sync protocol (every tick)
//!
//! ```text
//! read-only changed?  -> refresh INTERACTABLE, drop items (menus depend on it)
//! items > live length -> destroy the surplus items
//! length changed      -> rebuild_children()
//! ```
//!
//! # Invariants
//!
//! 1. Content child `i` is always bound to collection index `i`.
//! 2. `item_count() <= len()` after every sync, and no item past the live
//!    length is ever handed out.
//! 3. Structural edits (`duplicate_item`, `remove_item`, `move_item`) resync
//!    synchronously and always fire `rebuild_children` once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weave_reactive::{BindError, Binder, ListBinder, ListValue};

use crate::element::{Body, Element, ElementKind};
use crate::error::ElementError;
use crate::group::OpenCloseBody;
use crate::menu::MenuItem;

/// Presentation options of a list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct ListViewOption {
    /// Items may be moved by the renderer.
    pub reorderable: bool,
    /// Items may not be added or removed.
    pub fixed_size: bool,
}

impl Default for ListViewOption {
    fn default() -> Self {
        Self {
            reorderable: true,
            fixed_size: false,
        }
    }
}

impl ListViewOption {
    #[must_use]
    pub fn reorderable(mut self, reorderable: bool) -> Self {
        self.reorderable = reorderable;
        self
    }

    #[must_use]
    pub fn fixed_size(mut self, fixed_size: bool) -> Self {
        self.fixed_size = fixed_size;
        self
    }
}

// ---------------------------------------------------------------------------
// ListSource
// ---------------------------------------------------------------------------

/// The collection behind a list view, with its item factory.
pub trait ListSource {
    /// Live length; a null collection has length 0.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_binder_read_only(&self) -> bool;

    fn is_collection_read_only(&self) -> bool;

    fn is_fixed_size(&self) -> bool;

    /// Element for item `index`, or `None` when no element can represent it.
    fn create_item(&self, index: usize) -> Option<Element>;

    fn duplicate_item(&self, index: usize) -> Result<(), BindError>;

    fn remove_item(&self, index: usize) -> Result<(), BindError>;

    fn move_item(&self, from: usize, to: usize) -> Result<(), BindError>;
}

/// Builds the element for one item from its binder and index.
pub type ItemFactory<T> = Rc<dyn Fn(Binder<T>, usize) -> Option<Element>>;

/// [`ListSource`] over a list binder.
pub struct BinderListSource<L: ListValue> {
    binder: Binder<L>,
    factory: ItemFactory<L::Item>,
}

impl<L: ListValue> BinderListSource<L> {
    pub fn new(binder: Binder<L>, factory: ItemFactory<L::Item>) -> Self {
        Self { binder, factory }
    }
}

impl<L> ListSource for BinderListSource<L>
where
    L: ListValue,
    L::Item: Default,
{
    fn len(&self) -> usize {
        self.binder.list_len()
    }

    fn is_binder_read_only(&self) -> bool {
        self.binder.is_read_only()
    }

    fn is_collection_read_only(&self) -> bool {
        self.binder.is_list_read_only()
    }

    fn is_fixed_size(&self) -> bool {
        self.binder.is_list_fixed_size()
    }

    fn create_item(&self, index: usize) -> Option<Element> {
        (self.factory)(self.binder.item_binder(index), index)
    }

    fn duplicate_item(&self, index: usize) -> Result<(), BindError> {
        self.binder.duplicate_item(index)
    }

    fn remove_item(&self, index: usize) -> Result<(), BindError> {
        self.binder.remove_item(index)
    }

    fn move_item(&self, from: usize, to: usize) -> Result<(), BindError> {
        self.binder.move_item(from, to)
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

pub(crate) struct ListViewBody {
    source: RefCell<Option<Rc<dyn ListSource>>>,
    option: ListViewOption,
    open: OpenCloseBody,
    synced_len: Cell<usize>,
    last_read_only: Cell<Option<bool>>,
}

impl ListViewBody {
    pub(crate) fn open_state(&self) -> &OpenCloseBody {
        &self.open
    }

    fn source(&self) -> Option<Rc<dyn ListSource>> {
        self.source.borrow().clone()
    }

    pub(crate) fn tick(&self, element: &Element) {
        self.sync(element, false);
    }

    fn sync(&self, element: &Element, force: bool) {
        let Some(source) = self.source() else {
            return;
        };

        let read_only = source.is_binder_read_only() || source.is_collection_read_only();
        let previous = self.last_read_only.replace(Some(read_only));
        let mut force = force;
        if previous != Some(read_only) {
            element.set_interactable(!read_only);
            if previous.is_some() {
                // Item menus depend on read-only status; rebuild them lazily.
                destroy_contents_from(element, 0);
                force = true;
            }
        }

        let len = source.len();
        destroy_contents_from(element, len);

        let changed = self.synced_len.replace(len) != len;
        if changed || force {
            tracing::trace!(id = %element.id(), len, "list view resynced");
            element.rebuild_children();
        }
    }

    pub(crate) fn release(&self) {
        self.source.replace(None);
        self.open.release();
    }
}

fn destroy_contents_from(element: &Element, keep: usize) {
    let surplus = {
        let mut children = element.inner.children.borrow_mut();
        let keep = element.header_len() + keep;
        if children.len() > keep {
            children.split_off(keep)
        } else {
            Vec::new()
        }
    };
    for item in surplus {
        item.set_parent(None);
        item.destroy();
    }
}

// ---------------------------------------------------------------------------
// Element API
// ---------------------------------------------------------------------------

impl Element {
    /// List view over `binder`; `factory` builds the element for each item.
    pub fn list_view<L>(
        label: impl Into<Option<Element>>,
        binder: Binder<L>,
        factory: impl Fn(Binder<L::Item>, usize) -> Option<Element> + 'static,
        option: ListViewOption,
    ) -> Self
    where
        L: ListValue,
        L::Item: Default,
    {
        let source = BinderListSource::new(binder, Rc::new(factory));
        Self::list_view_from_source(label, Rc::new(source), option)
    }

    pub fn list_view_from_source(
        label: impl Into<Option<Element>>,
        source: Rc<dyn ListSource>,
        option: ListViewOption,
    ) -> Self {
        let read_only = source.is_binder_read_only() || source.is_collection_read_only();
        let len = source.len();
        let element = Self::new(
            ElementKind::ListView,
            Body::ListView(ListViewBody {
                source: RefCell::new(Some(source)),
                option,
                open: OpenCloseBody::new(false),
                synced_len: Cell::new(len),
                last_read_only: Cell::new(Some(read_only)),
            }),
        );
        element.set_interactable(!read_only);
        if let Some(label) = label.into() {
            element.attach_header(label);
        }
        element
    }

    /// List-view operations, or `None` for other kinds.
    #[must_use]
    pub fn as_list_view(&self) -> Option<ListView<'_>> {
        match &self.inner.body {
            Body::ListView(body) => Some(ListView {
                element: self,
                body,
            }),
            _ => None,
        }
    }
}

/// Borrowed view of a list-view element.
pub struct ListView<'a> {
    element: &'a Element,
    body: &'a ListViewBody,
}

impl ListView<'_> {
    #[must_use]
    pub fn option(&self) -> ListViewOption {
        self.body.option
    }

    /// Live length of the bound collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.source().map_or(0, |source| source.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of materialized item elements.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.element.content_count()
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.body
            .source()
            .is_none_or(|s| s.is_binder_read_only() || s.is_collection_read_only())
    }

    /// Collection or option forbids adding and removing items.
    #[must_use]
    pub fn is_fixed_size(&self) -> bool {
        self.body.option.fixed_size || self.body.source().is_some_and(|s| s.is_fixed_size())
    }

    /// Item element at `index`, materializing every missing item up to it.
    ///
    /// `None` when `index` is past the live length or the view is destroyed.
    pub fn get_or_create_item_element(&self, index: usize) -> Option<Element> {
        let source = self.body.source()?;
        if index >= source.len() || self.element.is_destroyed() {
            return None;
        }
        if let Some(existing) = self.element.content_at(index) {
            return Some(existing);
        }

        let with_menu = !self.is_read_only() && !self.is_fixed_size();
        for i in self.item_count()..=index {
            let item = source
                .create_item(i)
                .unwrap_or_else(|| Element::row(Vec::<Element>::new()));
            let item = if with_menu {
                self.item_menu(item, i)
            } else {
                item
            };
            if self.element.is_destroyed() {
                item.destroy();
                return None;
            }
            self.element.attach(item);
        }
        self.element.content_at(index)
    }

    fn item_menu(&self, item: Element, index: usize) -> Element {
        let list = self.element.downgrade();
        Element::popup_menu(item, move || {
            let add = list.clone();
            let remove = list.clone();
            vec![
                MenuItem::new("Add Element", move || {
                    if let Some(list) = add.upgrade() {
                        if let Some(Err(err)) = list.as_list_view().map(|v| v.duplicate_item(index)) {
                            tracing::warn!(%err, index, "list item duplicate failed");
                        }
                    }
                }),
                MenuItem::new("Remove Element", move || {
                    if let Some(list) = remove.upgrade() {
                        if let Some(Err(err)) = list.as_list_view().map(|v| v.remove_item(index)) {
                            tracing::warn!(%err, index, "list item removal failed");
                        }
                    }
                }),
            ]
        })
    }

    /// Materialize items for the full live length.
    pub fn materialize_all(&self) -> Vec<Element> {
        let len = self.len();
        if len > 0 {
            let _ = self.get_or_create_item_element(len - 1);
        }
        self.element.contents()
    }

    fn check_editable(&self, structural: bool) -> Result<Rc<dyn ListSource>, ElementError> {
        if self.element.is_destroyed() {
            return Err(ElementError::Destroyed(self.element.id()));
        }
        if !self.element.is_interactable_in_hierarchy() {
            return Err(ElementError::NotInteractable {
                id: self.element.id(),
            });
        }
        if structural && self.body.option.fixed_size {
            return Err(BindError::FixedSize.into());
        }
        self.body
            .source()
            .ok_or(ElementError::Destroyed(self.element.id()))
    }

    /// Insert a copy of item `index` after it.
    pub fn duplicate_item(&self, index: usize) -> Result<(), ElementError> {
        let source = self.check_editable(true)?;
        source.duplicate_item(index)?;
        self.body.sync(self.element, true);
        Ok(())
    }

    pub fn remove_item(&self, index: usize) -> Result<(), ElementError> {
        let source = self.check_editable(true)?;
        source.remove_item(index)?;
        self.body.sync(self.element, true);
        Ok(())
    }

    pub fn move_item(&self, from: usize, to: usize) -> Result<(), ElementError> {
        if !self.body.option.reorderable {
            return Err(ElementError::Unsupported {
                kind: ElementKind::ListView,
                operation: "move_item",
            });
        }
        let source = self.check_editable(false)?;
        source.move_item(from, to)?;
        self.body.sync(self.element, true);
        Ok(())
    }

    /// Run the per-tick sync now.
    pub fn sync(&self) {
        if !self.element.is_destroyed() {
            self.body.sync(self.element, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Tick;
    use proptest::prelude::*;

    fn int_list(values: Vec<i32>) -> (Rc<RefCell<Vec<i32>>>, Element) {
        let cell = Rc::new(RefCell::new(values));
        let binder = Binder::from_cell(Rc::clone(&cell));
        let list = Element::list_view(
            Element::label("values"),
            binder,
            |item, i| Some(Element::field(Element::label(format!("Item {i}")), item)),
            ListViewOption::default(),
        );
        (cell, list)
    }

    fn rebuild_counter(element: &Element) -> (Rc<Cell<u32>>, weave_reactive::Subscription) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = element.on_rebuild_children(move |_| h.set(h.get() + 1));
        (hits, sub)
    }

    #[test]
    fn items_materialize_lazily_up_to_index() {
        let (_cell, list) = int_list(vec![1, 2, 3]);
        let view = list.as_list_view().unwrap();
        assert_eq!(view.item_count(), 0);
        let second = view.get_or_create_item_element(1).unwrap();
        assert_eq!(view.item_count(), 2);
        assert_eq!(second.kind(), ElementKind::PopupMenu);
        assert_eq!(second.children()[0].value::<i32>(), Some(2));
        assert!(view.get_or_create_item_element(3).is_none());
        assert_eq!(view.materialize_all().len(), 3);
    }

    #[test]
    fn menu_duplicate_resyncs_and_rebuilds() {
        let (cell, list) = int_list(vec![10, 20]);
        let view = list.as_list_view().unwrap();
        view.materialize_all();
        let (hits, _sub) = rebuild_counter(&list);

        let item = view.get_or_create_item_element(1).unwrap();
        assert!(item.invoke_menu_item("Add Element"));
        assert_eq!(*cell.borrow(), vec![10, 20, 20]);
        assert_eq!(hits.get(), 1);
        assert_eq!(list.as_list_view().unwrap().materialize_all().len(), 3);
    }

    #[test]
    fn external_shrink_trims_items_on_tick() {
        let (cell, list) = int_list(vec![1, 2, 3]);
        let tick = Tick::first();
        list.update(&tick);
        let items = list.as_list_view().unwrap().materialize_all();
        let (hits, _sub) = rebuild_counter(&list);

        cell.borrow_mut().truncate(1);
        list.update(&tick);
        assert_eq!(list.as_list_view().unwrap().item_count(), 1);
        assert!(items[1].is_destroyed());
        assert!(items[2].is_destroyed());
        assert_eq!(hits.get(), 1);

        list.update(&tick);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn growth_fires_rebuild_without_materializing() {
        let (cell, list) = int_list(vec![1]);
        let tick = Tick::first();
        list.update(&tick);
        let (hits, _sub) = rebuild_counter(&list);
        cell.borrow_mut().push(2);
        list.update(&tick);
        assert_eq!(hits.get(), 1);
        assert_eq!(list.as_list_view().unwrap().item_count(), 0);
    }

    #[test]
    fn length_change_before_first_tick_rebuilds() {
        let (cell, list) = int_list(vec![1]);
        list.as_list_view().unwrap().materialize_all();
        let (hits, _sub) = rebuild_counter(&list);

        cell.borrow_mut().push(2);
        list.update(&Tick::first());
        assert_eq!(hits.get(), 1);
        assert_eq!(list.as_list_view().unwrap().item_count(), 1);
        assert_eq!(list.as_list_view().unwrap().materialize_all().len(), 2);

        list.update(&Tick::first());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn shrunk_list_hides_items_past_live_length() {
        let (cell, list) = int_list(vec![1, 2, 3]);
        let view = list.as_list_view().unwrap();
        let items = view.materialize_all();
        cell.borrow_mut().truncate(1);

        assert!(view.get_or_create_item_element(2).is_none());
        assert!(view.get_or_create_item_element(0).is_some_and(|i| i.ptr_eq(&items[0])));
        view.sync();
        assert_eq!(view.item_count(), 1);
        assert!(items[2].is_destroyed());
    }

    #[test]
    fn read_only_list_has_no_menus_and_rejects_edits() {
        let list = Element::list_view(
            None,
            Binder::constant(vec![1, 2]),
            |item, _| Some(Element::field(None, item)),
            ListViewOption::default(),
        );
        assert!(!list.is_interactable());
        let view = list.as_list_view().unwrap();
        let item = view.get_or_create_item_element(0).unwrap();
        assert_eq!(item.kind(), ElementKind::Field);
        assert!(matches!(
            view.duplicate_item(0),
            Err(ElementError::NotInteractable { .. })
        ));
    }

    #[test]
    fn fixed_size_option_blocks_structural_edits() {
        let cell = Rc::new(RefCell::new(vec![1, 2]));
        let list = Element::list_view(
            None,
            Binder::from_cell(Rc::clone(&cell)),
            |item, _| Some(Element::field(None, item)),
            ListViewOption::default().fixed_size(true),
        );
        let view = list.as_list_view().unwrap();
        assert!(view.is_fixed_size());
        assert_eq!(
            view.remove_item(0),
            Err(ElementError::Bind(BindError::FixedSize))
        );
        view.move_item(0, 1).unwrap();
        assert_eq!(*cell.borrow(), vec![2, 1]);
    }

    #[test]
    fn factory_miss_gets_placeholder() {
        let list = Element::list_view(
            None,
            Binder::from_cell(Rc::new(RefCell::new(vec![1, 2]))),
            |item: Binder<i32>, _| (item.get() != 1).then(|| Element::field(None, item)),
            ListViewOption::default(),
        );
        let items = list.as_list_view().unwrap().materialize_all();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].children()[0].kind(), ElementKind::Row);
        assert_eq!(items[1].children()[0].kind(), ElementKind::Field);
    }

    proptest! {
        #[test]
        fn item_count_never_exceeds_live_len(
            initial in 0usize..12,
            lens in proptest::collection::vec(0usize..12, 1..8),
        ) {
            let (cell, list) = int_list((0..initial as i32).collect());
            let tick = Tick::first();
            for len in lens {
                list.as_list_view().unwrap().materialize_all();
                cell.borrow_mut().resize(len, 0);
                list.update(&tick);
                let view = list.as_list_view().unwrap();
                prop_assert!(view.item_count() <= view.len());
                prop_assert_eq!(view.len(), len);
            }
        }
    }
}
