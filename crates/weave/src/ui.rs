#![forbid(unsafe_code)]

//! Composition functions.
//!
//! Every function returns `Option<Element>`, and every container accepts any
//! sequence of `Into<Option<Element>>`, dropping the `None`s. An unresolved
//! binding (`None` binder) therefore propagates as "no element" instead of an
//! error, and a whole panel can be written as one expression:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use weave::prelude::*;
//!
//! let speed = Rc::new(RefCell::new(1.5_f32));
//! let panel = ui::window(
//!     "Player",
//!     children![
//!         ui::field("speed", Some(Binder::from_cell(Rc::clone(&speed)))),
//!         ui::field::<u32>("missing", None),
//!         ui::button("Reset", move || *speed.borrow_mut() = 0.0),
//!     ],
//! )
//! .unwrap();
//! assert_eq!(panel.content_count(), 2);
//! ```

use std::rc::Rc;

use weave_element::{
    Element, LabelSource, ListViewOption, MenuItem, PollSchedule, SliderRange, Tick,
};
use weave_reactive::{Binder, ListValue, ObjectRef};

use crate::creator::{ElementCreator, short_type_name};
use crate::field::{FieldValue, SliderValue, list_of, object_element};
use crate::provider::BinderProvider;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Anything usable as an element label.
pub trait IntoLabel {
    fn into_label(self) -> Option<Element>;
}

impl IntoLabel for &str {
    fn into_label(self) -> Option<Element> {
        Some(Element::label(self))
    }
}

impl IntoLabel for String {
    fn into_label(self) -> Option<Element> {
        Some(Element::label(self))
    }
}

impl IntoLabel for &String {
    fn into_label(self) -> Option<Element> {
        Some(Element::label(self))
    }
}

impl IntoLabel for LabelSource {
    fn into_label(self) -> Option<Element> {
        Some(Element::label(self))
    }
}

impl IntoLabel for Element {
    fn into_label(self) -> Option<Element> {
        Some(self)
    }
}

impl IntoLabel for Option<Element> {
    fn into_label(self) -> Option<Element> {
        self
    }
}

impl IntoLabel for Option<&str> {
    fn into_label(self) -> Option<Element> {
        self.map(Element::label)
    }
}

pub fn label(text: impl Into<LabelSource>) -> Option<Element> {
    Some(Element::label(text))
}

/// Label whose text is recomputed every tick.
pub fn label_fn(text: impl Fn() -> String + 'static) -> Option<Element> {
    Some(Element::label(LabelSource::computed(text)))
}

pub fn button(text: impl Into<LabelSource>, action: impl Fn() + 'static) -> Option<Element> {
    Some(Element::button(text, action))
}

// ---------------------------------------------------------------------------
// Value fields
// ---------------------------------------------------------------------------

/// Editor for `binder`, chosen by the value type.
pub fn field<T: FieldValue>(label: impl IntoLabel, binder: Option<Binder<T>>) -> Option<Element> {
    let binder = binder?;
    T::create_field(label.into_label(), binder)
}

/// [`field`] that also calls `on_change` after each successful write
/// through the binder.
pub fn field_with<T: FieldValue>(
    label: impl IntoLabel,
    binder: Option<Binder<T>>,
    on_change: impl Fn(&T) + 'static,
) -> Option<Element> {
    let binder = binder?;
    let subscription = binder.on_value_changed(on_change);
    let element = T::create_field(label.into_label(), binder)?;
    element.hold(subscription);
    Some(element)
}

/// Field for a named value resolved through `provider`, labelled with the
/// path's last segment.
pub fn field_from<T: FieldValue>(provider: &impl BinderProvider, path: &str) -> Option<Element> {
    let (binder, label) = provider.resolve::<T>(path)?;
    field(label, Some(binder))
}

pub fn slider<T: SliderValue>(label: impl IntoLabel, binder: Option<Binder<T>>) -> Option<Element> {
    slider_with_range(label, binder, T::default_range())
}

pub fn slider_with_range<T: FieldValue + PartialOrd>(
    label: impl IntoLabel,
    binder: Option<Binder<T>>,
    range: SliderRange<T>,
) -> Option<Element> {
    Some(Element::slider(label.into_label(), binder?, range))
}

pub fn dropdown<S: Into<String>>(
    label: impl IntoLabel,
    binder: Option<Binder<usize>>,
    options: impl IntoIterator<Item = S>,
) -> Option<Element> {
    Some(Element::dropdown(label.into_label(), binder?, options))
}

/// List view with one `field` per item.
pub fn list<L>(label: impl IntoLabel, binder: Option<Binder<L>>) -> Option<Element>
where
    L: ListValue,
    L::Item: FieldValue + Default,
{
    Some(list_of(label.into_label(), binder?))
}

/// List view with a custom item factory.
pub fn list_with<L>(
    label: impl IntoLabel,
    binder: Option<Binder<L>>,
    item: impl Fn(Binder<L::Item>, usize) -> Option<Element> + 'static,
    option: ListViewOption,
) -> Option<Element>
where
    L: ListValue,
    L::Item: Default,
{
    Some(Element::list_view(label.into_label(), binder?, item, option))
}

/// UI for a bound object, produced by the creation func registered for its
/// runtime type and rebuilt when a different object is bound.
pub fn object_field(label: impl IntoLabel, binder: Option<Binder<ObjectRef>>) -> Option<Element> {
    Some(object_element(label.into_label(), binder?))
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

pub fn row<I, E>(elements: I) -> Option<Element>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Element>>,
{
    Some(Element::row(elements))
}

pub fn column<I, E>(elements: I) -> Option<Element>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Element>>,
{
    Some(Element::column(elements))
}

pub fn box_group<I, E>(elements: I) -> Option<Element>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Element>>,
{
    Some(Element::box_group(elements))
}

pub fn fold<I, E>(header: impl IntoLabel, elements: I) -> Option<Element>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Element>>,
{
    Some(Element::fold(header.into_label(), elements))
}

pub fn window<I, E>(title: impl IntoLabel, elements: I) -> Option<Element>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Element>>,
{
    Some(Element::window(title.into_label(), elements))
}

/// Button toggling `window`; `None` when there is no window.
///
/// Without a `label` the button shows the window's title.
pub fn window_launcher(label: Option<LabelSource>, window: Option<Element>) -> Option<Element> {
    let window = window?;
    let label = label
        .or_else(|| window.header().and_then(|title| title.label_source()))
        .unwrap_or_else(|| LabelSource::from(""));
    Some(Element::window_launcher(label, window))
}

pub fn composite_field<I, E>(label: impl IntoLabel, elements: I) -> Option<Element>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Element>>,
{
    Some(Element::composite_field(label.into_label(), elements))
}

pub fn popup_menu(
    element: Option<Element>,
    items: impl Fn() -> Vec<MenuItem> + 'static,
) -> Option<Element> {
    Some(Element::popup_menu(element?, items))
}

// ---------------------------------------------------------------------------
// Dynamic
// ---------------------------------------------------------------------------

pub fn dynamic(
    build: impl FnMut() -> Option<Element> + 'static,
    rebuild_if: impl FnMut(Option<&Element>, &Tick) -> bool + 'static,
) -> Option<Element> {
    Some(Element::dynamic(build, rebuild_if))
}

pub fn dynamic_on_status_changed<S: PartialEq + 'static>(
    read_status: impl Fn() -> S + 'static,
    build: impl Fn(&S) -> Option<Element> + 'static,
) -> Option<Element> {
    Some(Element::dynamic_on_status_changed(read_status, build))
}

/// Polled lookup on the configured jittered interval.
pub fn find_object_observer<T: Clone + 'static>(
    find: impl Fn() -> Option<T> + 'static,
    is_alive: impl Fn(&T) -> bool + 'static,
    build: impl Fn(&T) -> Option<Element> + 'static,
    rebuild_if_disabled: bool,
) -> Option<Element> {
    Some(Element::find_object_observer(
        find,
        is_alive,
        build,
        rebuild_if_disabled,
        PollSchedule::from_config(),
    ))
}

/// The creator's own UI, inline, looked up with `find`.
pub fn element_creator_inline<C: ElementCreator + Clone + 'static>(
    find: impl Fn() -> Option<C> + 'static,
    rebuild_if_disabled: bool,
) -> Option<Element> {
    let element = find_object_observer(
        find,
        C::is_active,
        C::create_element,
        rebuild_if_disabled,
    )?;
    element.set_display_name(short_type_name::<C>());
    Some(element)
}

/// A launcher for a window holding the creator's UI.
///
/// The title defaults to the creator's type name.
pub fn element_creator_window_launcher<C: ElementCreator + Clone + 'static>(
    find: impl Fn() -> Option<C> + 'static,
    title: Option<String>,
) -> Option<Element> {
    let title: Rc<str> = title
        .unwrap_or_else(|| short_type_name::<C>().to_owned())
        .into();
    let element = find_object_observer(
        find,
        C::is_active,
        move |creator: &C| {
            let window = Element::window(
                Element::label(title.to_string()),
                [creator.create_element()],
            );
            window_launcher(None, Some(window))
        },
        true,
    )?;
    element.set_display_name(short_type_name::<C>());
    Some(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use std::cell::{Cell, RefCell};
    use weave_element::ElementKind;

    fn cell<T: Clone + 'static>(v: T) -> (Rc<RefCell<T>>, Option<Binder<T>>) {
        let cell = Rc::new(RefCell::new(v));
        let binder = Binder::from_cell(Rc::clone(&cell));
        (cell, Some(binder))
    }

    #[test]
    fn unresolved_binder_yields_no_element() {
        assert!(field::<i32>("x", None).is_none());
        assert!(slider::<f32>("x", None).is_none());
        assert!(list::<Vec<u8>>("x", None).is_none());
        assert!(window_launcher(Some("w".into()), None).is_none());
        let group = column(children![field::<i32>("x", None), label("y")]).unwrap();
        assert_eq!(group.child_count(), 1);
    }

    #[test]
    fn field_with_reports_writes() {
        let (_cell, binder) = cell(1_i32);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let element = field_with("n", binder, move |v| s.set(*v)).unwrap();
        element.set_value(9_i32).unwrap();
        assert_eq!(seen.get(), 9);
        element.destroy();
    }

    #[test]
    fn slider_uses_default_range() {
        let (cell, binder) = cell(0.5_f64);
        let element = slider("t", binder).unwrap();
        element.set_value(3.0_f64).unwrap();
        assert_eq!(*cell.borrow(), 1.0);
    }

    #[derive(Clone)]
    struct Panel {
        active: Rc<Cell<bool>>,
    }

    impl ElementCreator for Panel {
        fn create_element(&self) -> Option<Element> {
            label("panel")
        }

        fn is_active(&self) -> bool {
            self.active.get()
        }
    }

    #[test]
    fn element_creator_inline_builds_found_object() {
        let panel = Panel {
            active: Rc::new(Cell::new(true)),
        };
        let element = element_creator_inline(move || Some(panel.clone()), true).unwrap();
        assert_eq!(element.display_name(), "Panel");
        assert_eq!(
            element.dynamic_child().and_then(|c| c.text()).as_deref(),
            Some("panel")
        );
    }

    #[test]
    fn window_launcher_label_defaults_to_window_title() {
        let count = Rc::new(Cell::new(1));
        let c = Rc::clone(&count);
        let title = LabelSource::computed(move || format!("Log ({})", c.get()));
        let launcher = window_launcher(None, window(title, children![label("line")])).unwrap();
        assert_eq!(launcher.text().as_deref(), Some("Log (1)"));
        count.set(2);
        launcher.update(&Tick::first());
        assert_eq!(launcher.text().as_deref(), Some("Log (2)"));

        let named =
            window_launcher(Some("Open".into()), window("Log", Vec::<Element>::new())).unwrap();
        assert_eq!(named.text().as_deref(), Some("Open"));
        let untitled =
            window_launcher(None, window(None::<Element>, Vec::<Element>::new())).unwrap();
        assert_eq!(untitled.text().as_deref(), Some(""));
    }

    #[test]
    fn element_creator_window_launcher_wraps_window() {
        let panel = Panel {
            active: Rc::new(Cell::new(true)),
        };
        let element = element_creator_window_launcher(move || Some(panel.clone()), None).unwrap();
        let launcher = element.dynamic_child().unwrap();
        assert_eq!(launcher.kind(), ElementKind::WindowLauncher);
        let window = launcher.launched_window().unwrap();
        assert_eq!(window.header().and_then(|h| h.text()).as_deref(), Some("Panel"));
        assert!(!window.is_open());
    }
}
