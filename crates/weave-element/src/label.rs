#![forbid(unsafe_code)]

//! Text labels: constant or computed, polled once per tick.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use weave_reactive::{Notifier, Subscription};

use crate::element::{Body, Element, ElementKind};

/// Where a label's text comes from.
#[derive(Clone)]
pub enum LabelSource {
    Text(String),
    Computed(Rc<dyn Fn() -> String>),
}

impl LabelSource {
    pub fn computed(f: impl Fn() -> String + 'static) -> Self {
        Self::Computed(Rc::new(f))
    }

    #[must_use]
    pub fn read(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Computed(f) => f(),
        }
    }

    #[must_use]
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

impl fmt::Debug for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for LabelSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for LabelSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for LabelSource {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

/// How a renderer should lay out a label relative to what it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelType {
    /// Renderer decides.
    #[default]
    Auto,
    /// Fixed-width prefix in front of a value editor.
    Prefix,
    /// Plain inline text.
    Standard,
}

pub(crate) struct LabelBody {
    source: RefCell<Option<LabelSource>>,
    text: RefCell<String>,
    label_type: Cell<LabelType>,
    changed: Notifier<String>,
}

impl LabelBody {
    pub(crate) fn new(source: LabelSource) -> Self {
        let text = source.read();
        Self {
            source: RefCell::new(Some(source)),
            text: RefCell::new(text),
            label_type: Cell::new(LabelType::Auto),
            changed: Notifier::new(),
        }
    }

    pub(crate) fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Re-read a computed source; notify when the text changed.
    pub(crate) fn poll(&self) {
        let Some(source) = self.source.borrow().clone() else {
            return;
        };
        if !source.is_computed() {
            return;
        }
        let fresh = source.read();
        if *self.text.borrow() != fresh {
            self.text.replace(fresh.clone());
            self.changed.notify(&fresh);
        }
    }

    pub(crate) fn subscribe(&self, callback: impl Fn(&String) + 'static) -> Subscription {
        self.changed.subscribe(callback)
    }

    pub(crate) fn release(&self) {
        self.source.replace(None);
        self.changed.clear();
    }
}

impl Element {
    /// Label element with constant or computed text.
    pub fn label(source: impl Into<LabelSource>) -> Self {
        Self::new(ElementKind::Label, Body::Label(LabelBody::new(source.into())))
    }

    fn label_body(&self) -> Option<&LabelBody> {
        match &self.inner.body {
            Body::Label(label) => Some(label),
            Body::Button(button) => Some(button.label()),
            _ => None,
        }
    }

    /// Current text of a label or button, as of the last poll.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.label_body().map(LabelBody::text)
    }

    /// Text source of a label, for building an equivalent label elsewhere.
    #[must_use]
    pub fn label_source(&self) -> Option<LabelSource> {
        self.label_body()
            .and_then(|label| label.source.borrow().clone())
    }

    /// Subscribe to text changes of a label or button.
    pub fn on_text_changed(&self, callback: impl Fn(&String) + 'static) -> Option<Subscription> {
        self.label_body().map(|label| label.subscribe(callback))
    }

    #[must_use]
    pub fn label_type(&self) -> Option<LabelType> {
        match &self.inner.body {
            Body::Label(label) => Some(label.label_type.get()),
            _ => None,
        }
    }

    pub fn set_label_type(&self, label_type: LabelType) {
        if let Body::Label(label) = &self.inner.body {
            label.label_type.set(label_type);
        }
    }

    /// A label used as a field header becomes a prefix unless set explicitly.
    pub(crate) fn promote_auto_label(&self) {
        if self.label_type() == Some(LabelType::Auto) {
            self.set_label_type(LabelType::Prefix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Tick;

    #[test]
    fn constant_label_text() {
        let label = Element::label("Speed");
        assert_eq!(label.kind(), ElementKind::Label);
        assert_eq!(label.text().as_deref(), Some("Speed"));
        assert_eq!(label.label_type(), Some(LabelType::Auto));
    }

    #[test]
    fn computed_label_updates_on_tick() {
        let count = Rc::new(Cell::new(1));
        let c = Rc::clone(&count);
        let label = Element::label(LabelSource::computed(move || format!("n={}", c.get())));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = label
            .on_text_changed(move |t| s.borrow_mut().push(t.clone()))
            .unwrap();

        label.update(&Tick::first());
        assert!(seen.borrow().is_empty());

        count.set(2);
        label.update(&Tick::first());
        assert_eq!(label.text().as_deref(), Some("n=2"));
        assert_eq!(*seen.borrow(), vec!["n=2".to_string()]);
    }

    #[test]
    fn header_label_becomes_prefix() {
        let label = Element::label("x");
        let _group = Element::composite_field(label.clone(), Vec::<Element>::new());
        assert_eq!(label.label_type(), Some(LabelType::Prefix));

        let standard = Element::label("y");
        standard.set_label_type(LabelType::Standard);
        standard.promote_auto_label();
        assert_eq!(standard.label_type(), Some(LabelType::Standard));
    }

    #[test]
    fn non_label_has_no_text() {
        assert_eq!(Element::row(Vec::<Element>::new()).text(), None);
    }
}
