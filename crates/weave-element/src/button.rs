#![forbid(unsafe_code)]

//! Buttons and window launchers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::element::{Body, Element, ElementKind};
use crate::label::{LabelBody, LabelSource};

pub(crate) struct ButtonBody {
    label: LabelBody,
    action: RefCell<Option<Rc<dyn Fn()>>>,
}

impl ButtonBody {
    fn new(label: LabelSource, action: Rc<dyn Fn()>) -> Self {
        Self {
            label: LabelBody::new(label),
            action: RefCell::new(Some(action)),
        }
    }

    pub(crate) fn label(&self) -> &LabelBody {
        &self.label
    }

    pub(crate) fn poll(&self) {
        self.label.poll();
    }

    pub(crate) fn release(&self) {
        self.label.release();
        self.action.replace(None);
    }
}

impl Element {
    pub fn button(label: impl Into<LabelSource>, action: impl Fn() + 'static) -> Self {
        Self::new(
            ElementKind::Button,
            Body::Button(ButtonBody::new(label.into(), Rc::new(action))),
        )
    }

    /// Button owning `window`; clicking toggles the window open state.
    ///
    /// The window starts closed.
    pub fn window_launcher(label: impl Into<LabelSource>, window: Element) -> Self {
        let handle = window.downgrade();
        let action = move || {
            if let Some(window) = handle.upgrade() {
                let _ = window.set_open(!window.is_open());
            }
        };
        let launcher = Self::new(
            ElementKind::WindowLauncher,
            Body::Button(ButtonBody::new(label.into(), Rc::new(action))),
        );
        let _ = window.set_open(false);
        if let Some(old) = window.parent() {
            old.remove_child(&window);
        }
        launcher.attach(window);
        launcher
    }

    /// Run the button action. Ignored (returns `false`) unless the button is
    /// live, enabled and interactable in its hierarchy.
    pub fn click(&self) -> bool {
        let Body::Button(button) = &self.inner.body else {
            return false;
        };
        if self.is_destroyed() || !self.is_enabled() || !self.is_interactable_in_hierarchy() {
            return false;
        }
        let action = button.action.borrow().clone();
        match action {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Window owned by a launcher.
    #[must_use]
    pub fn launched_window(&self) -> Option<Element> {
        if self.kind() != ElementKind::WindowLauncher {
            return None;
        }
        self.inner.children.borrow().first().cloned()
    }

    /// Open the launched window. Returns whether a window was opened.
    pub fn launch(&self) -> bool {
        match self.launched_window() {
            Some(window) if !self.is_destroyed() => window.set_open(true).is_ok(),
            _ => false,
        }
    }

    /// Toggle the launched window, subject to the same checks as `click`.
    pub fn toggle(&self) -> bool {
        self.kind() == ElementKind::WindowLauncher && self.click()
    }
}
