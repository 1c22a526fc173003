#![forbid(unsafe_code)]

//! Context (popup) menus attached to an element.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::element::{Body, Element, ElementKind};

/// One entry of a popup menu.
#[derive(Clone)]
pub struct MenuItem {
    name: String,
    action: Rc<dyn Fn()>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, action: impl Fn() + 'static) -> Self {
        Self {
            name: name.into(),
            action: Rc::new(action),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self) {
        (self.action)();
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem").field("name", &self.name).finish()
    }
}

type ItemsFn = Rc<dyn Fn() -> Vec<MenuItem>>;

pub(crate) struct PopupMenuBody {
    items: RefCell<Option<ItemsFn>>,
}

impl PopupMenuBody {
    pub(crate) fn release(&self) {
        self.items.replace(None);
    }
}

impl Element {
    /// Wrap `element` with a menu whose items are produced on demand.
    pub fn popup_menu(element: Element, items: impl Fn() -> Vec<MenuItem> + 'static) -> Self {
        let menu = Self::new(
            ElementKind::PopupMenu,
            Body::PopupMenu(PopupMenuBody {
                items: RefCell::new(Some(Rc::new(items))),
            }),
        );
        if let Some(old) = element.parent() {
            old.remove_child(&element);
        }
        menu.attach(element);
        menu
    }

    /// Current menu items; empty for non-menu or destroyed elements.
    #[must_use]
    pub fn menu_items(&self) -> Vec<MenuItem> {
        let Body::PopupMenu(menu) = &self.inner.body else {
            return Vec::new();
        };
        let items = menu.items.borrow().clone();
        items.map(|f| f()).unwrap_or_default()
    }

    /// Invoke the first item named `name`. Returns whether one ran.
    pub fn invoke_menu_item(&self, name: &str) -> bool {
        if !self.is_interactable_in_hierarchy() {
            return false;
        }
        match self.menu_items().into_iter().find(|item| item.name() == name) {
            Some(item) => {
                item.invoke();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn items_are_produced_on_demand() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let menu = Element::popup_menu(Element::label("x"), move || {
            let h = Rc::clone(&h);
            vec![MenuItem::new("Ping", move || h.set(h.get() + 1))]
        });
        assert_eq!(menu.child_count(), 1);
        assert_eq!(menu.menu_items().len(), 1);
        assert!(menu.invoke_menu_item("Ping"));
        assert!(!menu.invoke_menu_item("Missing"));
        assert_eq!(hits.get(), 1);

        menu.destroy();
        assert!(menu.menu_items().is_empty());
    }
}
