#![forbid(unsafe_code)]

//! Value leaves: fields, sliders and dropdowns.
//!
//! Each value leaf wraps a [`Binder`] behind a type-erased slot so the element
//! tree stays monomorphic. Renderers read and write through
//! [`Element::value`] / [`Element::set_value`] with the concrete type they
//! expect; a wrong type is reported, never coerced.
//!
//! # Invariants
//!
//! 1. Every tick compares the freshly read value with the last seen one and
//!    notifies `on_value_changed` only when they differ.
//! 2. A slider write is clamped to the range read at write time.
//! 3. A successful renderer write fires `on_subtree_value_changed` on the leaf
//!    and every ancestor, in that order.

use std::any::{Any, type_name};
use std::cell::RefCell;

use weave_reactive::{BindError, Binder, Notifier, Subscription};

use crate::element::{Body, Element, ElementKind};
use crate::error::ElementError;

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

pub(crate) trait ValueSlot {
    /// Re-read the binder; `true` when the value differs from the last read.
    fn poll(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn value_type_name(&self) -> &'static str;
    fn is_read_only(&self) -> bool;
    fn is_null(&self) -> bool;
}

/// A binder plus the value it held at the last poll.
pub(crate) struct BoundValue<T: 'static> {
    binder: Binder<T>,
    last: RefCell<Option<T>>,
}

impl<T: Clone + PartialEq + 'static> BoundValue<T> {
    fn new(binder: Binder<T>) -> Self {
        let last = RefCell::new(binder.try_get());
        Self { binder, last }
    }
}

impl<T: Clone + PartialEq + 'static> ValueSlot for BoundValue<T> {
    fn poll(&self) -> bool {
        let fresh = self.binder.try_get();
        if *self.last.borrow() == fresh {
            return false;
        }
        self.last.replace(fresh);
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn is_read_only(&self) -> bool {
        self.binder.is_read_only()
    }

    fn is_null(&self) -> bool {
        self.binder.is_null()
    }
}

/// Inclusive bounds of a slider, each read through its own binder.
pub struct SliderRange<T: 'static> {
    min: Binder<T>,
    max: Binder<T>,
}

impl<T: 'static> Clone for SliderRange<T> {
    fn clone(&self) -> Self {
        Self {
            min: self.min.clone(),
            max: self.max.clone(),
        }
    }
}

impl<T: Clone + PartialOrd + 'static> SliderRange<T> {
    pub fn constant(min: T, max: T) -> Self {
        Self::bound(Binder::constant(min), Binder::constant(max))
    }

    /// Range whose bounds follow live values.
    pub fn bound(min: Binder<T>, max: Binder<T>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn min(&self) -> Option<T> {
        self.min.try_get()
    }

    #[must_use]
    pub fn max(&self) -> Option<T> {
        self.max.try_get()
    }

    /// Clamp `value` to the current bounds; a null bound does not constrain.
    #[must_use]
    pub fn clamp(&self, mut value: T) -> T {
        if let Some(min) = self.min() {
            if value < min {
                value = min;
            }
        }
        if let Some(max) = self.max() {
            if value > max {
                value = max;
            }
        }
        value
    }
}

pub(crate) trait RangeSlot {
    fn poll(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn clamp_any(&self, value: Box<dyn Any>) -> Box<dyn Any>;
}

struct RangeState<T: 'static> {
    range: SliderRange<T>,
    last: RefCell<(Option<T>, Option<T>)>,
}

impl<T: Clone + PartialOrd + 'static> RangeSlot for RangeState<T> {
    fn poll(&self) -> bool {
        let fresh = (self.range.min(), self.range.max());
        if *self.last.borrow() == fresh {
            return false;
        }
        self.last.replace(fresh);
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clamp_any(&self, value: Box<dyn Any>) -> Box<dyn Any> {
        match value.downcast::<T>() {
            Ok(value) => Box::new(self.range.clamp(*value)),
            Err(other) => other,
        }
    }
}

pub(crate) struct ValueBody {
    slot: RefCell<Option<Box<dyn ValueSlot>>>,
    range: RefCell<Option<Box<dyn RangeSlot>>>,
    options: RefCell<Vec<String>>,
    changed: Notifier<()>,
}

impl ValueBody {
    fn new(slot: Box<dyn ValueSlot>) -> Self {
        Self {
            slot: RefCell::new(Some(slot)),
            range: RefCell::new(None),
            options: RefCell::new(Vec::new()),
            changed: Notifier::new(),
        }
    }

    pub(crate) fn poll(&self) {
        let value_changed = self.slot.borrow().as_ref().is_some_and(|slot| slot.poll());
        let range_changed = self.range.borrow().as_ref().is_some_and(|range| range.poll());
        if value_changed || range_changed {
            self.changed.notify(&());
        }
    }

    fn binder<T: Clone + 'static>(&self) -> Result<Binder<T>, BindError> {
        let slot = self.slot.borrow();
        let slot = slot.as_ref().ok_or(BindError::Null)?;
        slot.as_any()
            .downcast_ref::<BoundValue<T>>()
            .map(|bound| bound.binder.clone())
            .ok_or(BindError::TypeMismatch {
                expected: slot.value_type_name(),
            })
    }

    pub(crate) fn release(&self) {
        self.slot.replace(None);
        self.range.replace(None);
        self.changed.clear();
    }
}

// ---------------------------------------------------------------------------
// Element API
// ---------------------------------------------------------------------------

impl Element {
    fn value_leaf(
        kind: ElementKind,
        label: Option<Element>,
        body: ValueBody,
        read_only: bool,
    ) -> Self {
        let element = Self::new(kind, Body::Value(body));
        element.set_interactable(!read_only);
        if let Some(label) = label {
            label.promote_auto_label();
            element.attach_header(label);
        }
        element
    }

    /// Editable value field.
    pub fn field<T: Clone + PartialEq + 'static>(
        label: impl Into<Option<Element>>,
        binder: Binder<T>,
    ) -> Self {
        let read_only = binder.is_read_only();
        let body = ValueBody::new(Box::new(BoundValue::new(binder)));
        Self::value_leaf(ElementKind::Field, label.into(), body, read_only)
    }

    /// Value field with a min/max range.
    pub fn slider<T: Clone + PartialOrd + 'static>(
        label: impl Into<Option<Element>>,
        binder: Binder<T>,
        range: SliderRange<T>,
    ) -> Self {
        let read_only = binder.is_read_only();
        let body = ValueBody::new(Box::new(BoundValue::new(binder)));
        let last = (range.min(), range.max());
        body.range.replace(Some(Box::new(RangeState {
            range,
            last: RefCell::new(last),
        })));
        Self::value_leaf(ElementKind::Slider, label.into(), body, read_only)
    }

    /// Selection of one of `options` by index.
    pub fn dropdown<S: Into<String>>(
        label: impl Into<Option<Element>>,
        binder: Binder<usize>,
        options: impl IntoIterator<Item = S>,
    ) -> Self {
        let read_only = binder.is_read_only();
        let body = ValueBody::new(Box::new(BoundValue::new(binder)));
        body.options
            .replace(options.into_iter().map(Into::into).collect());
        Self::value_leaf(ElementKind::Dropdown, label.into(), body, read_only)
    }

    fn value_body(&self) -> Option<&ValueBody> {
        match &self.inner.body {
            Body::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Current bound value, read through the binder.
    ///
    /// `None` for non-value elements, a type mismatch, or a null binding.
    #[must_use]
    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.value_body()?.binder::<T>().ok()?.try_get()
    }

    /// Renderer-side write of a new value.
    pub fn set_value<T: Clone + 'static>(&self, value: T) -> Result<(), ElementError> {
        if self.is_destroyed() {
            return Err(ElementError::Destroyed(self.id()));
        }
        let body = self.value_body().ok_or(ElementError::Unsupported {
            kind: self.kind(),
            operation: "set_value",
        })?;
        let binder = body.binder::<T>()?;
        if !self.is_interactable_in_hierarchy() {
            return Err(ElementError::NotInteractable { id: self.id() });
        }

        let mut value = value;
        if let Some(range) = body.range.borrow().as_ref() {
            if let Ok(clamped) = range.clamp_any(Box::new(value.clone())).downcast::<T>() {
                value = *clamped;
            }
        }
        if self.kind() == ElementKind::Dropdown {
            let len = body.options.borrow().len();
            if let Some(&index) = (&value as &dyn Any).downcast_ref::<usize>() {
                if index >= len {
                    return Err(BindError::IndexOutOfRange { index, len }.into());
                }
            }
        }

        binder.set(value)?;
        if !self.is_destroyed() {
            body.poll();
        }
        self.notify_subtree_value_changed();
        Ok(())
    }

    /// Rust type name of the bound value.
    #[must_use]
    pub fn value_type_name(&self) -> Option<&'static str> {
        let body = self.value_body()?;
        let slot = body.slot.borrow();
        slot.as_ref().map(|slot| slot.value_type_name())
    }

    #[must_use]
    pub fn is_value_read_only(&self) -> bool {
        self.value_body()
            .and_then(|body| body.slot.borrow().as_ref().map(|slot| slot.is_read_only()))
            .unwrap_or(true)
    }

    #[must_use]
    pub fn is_value_null(&self) -> bool {
        self.value_body()
            .and_then(|body| body.slot.borrow().as_ref().map(|slot| slot.is_null()))
            .unwrap_or(true)
    }

    /// Subscribe to value (and slider range) changes seen by `update`.
    pub fn on_value_changed(&self, callback: impl Fn() + 'static) -> Option<Subscription> {
        self.value_body()
            .map(|body| body.changed.subscribe(move |_| callback()))
    }

    /// Current `(min, max)` of a slider.
    #[must_use]
    pub fn slider_range<T: Clone + PartialOrd + 'static>(&self) -> Option<(Option<T>, Option<T>)> {
        let body = self.value_body()?;
        let range = body.range.borrow();
        let state = range.as_ref()?.as_any().downcast_ref::<RangeState<T>>()?;
        Some((state.range.min(), state.range.max()))
    }

    /// Options of a dropdown; empty for other kinds.
    #[must_use]
    pub fn options(&self) -> Vec<String> {
        self.value_body()
            .map(|body| body.options.borrow().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Tick;
    use std::cell::Cell;
    use std::rc::Rc;

    fn cell_binder<T: Clone + 'static>(v: T) -> (Rc<RefCell<T>>, Binder<T>) {
        let cell = Rc::new(RefCell::new(v));
        (Rc::clone(&cell), Binder::from_cell(cell))
    }

    #[test]
    fn field_reads_and_writes_through_binder() {
        let (cell, binder) = cell_binder(3_i32);
        let field = Element::field(Element::label("hp"), binder);
        assert_eq!(field.value::<i32>(), Some(3));
        field.set_value(7_i32).unwrap();
        assert_eq!(*cell.borrow(), 7);
        assert_eq!(field.value_type_name(), Some("i32"));
        assert_eq!(field.header().and_then(|h| h.text()).as_deref(), Some("hp"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let (_cell, binder) = cell_binder(3_i32);
        let field = Element::field(None, binder);
        assert_eq!(field.value::<f32>(), None);
        assert!(matches!(
            field.set_value(1.0_f32),
            Err(ElementError::Bind(BindError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn read_only_field_is_not_interactable() {
        let field = Element::field(None, Binder::constant(5_u8));
        assert!(!field.is_interactable());
        assert!(field.is_value_read_only());
        assert!(matches!(
            field.set_value(6_u8),
            Err(ElementError::NotInteractable { .. })
        ));
    }

    #[test]
    fn tick_notifies_only_on_change() {
        let (cell, binder) = cell_binder(String::from("a"));
        let field = Element::field(None, binder);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = field.on_value_changed(move || h.set(h.get() + 1)).unwrap();

        let tick = Tick::first();
        field.update(&tick);
        assert_eq!(hits.get(), 0);
        *cell.borrow_mut() = "b".into();
        field.update(&tick);
        field.update(&tick);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn slider_clamps_to_live_range() {
        let (cell, binder) = cell_binder(5_i32);
        let (max_cell, max) = cell_binder(10_i32);
        let slider = Element::slider(None, binder, SliderRange::bound(Binder::constant(0), max));
        slider.set_value(50_i32).unwrap();
        assert_eq!(*cell.borrow(), 10);

        *max_cell.borrow_mut() = 20;
        slider.set_value(50_i32).unwrap();
        assert_eq!(*cell.borrow(), 20);
        slider.set_value(-3_i32).unwrap();
        assert_eq!(*cell.borrow(), 0);
        assert_eq!(slider.slider_range::<i32>(), Some((Some(0), Some(20))));
    }

    #[test]
    fn dropdown_rejects_out_of_range_index() {
        let (cell, binder) = cell_binder(0_usize);
        let dropdown = Element::dropdown(None, binder, ["low", "high"]);
        dropdown.set_value(1_usize).unwrap();
        assert_eq!(*cell.borrow(), 1);
        assert!(dropdown.set_value(2_usize).is_err());
        assert_eq!(dropdown.options(), vec!["low", "high"]);
    }

    #[test]
    fn renderer_write_bubbles_to_ancestors() {
        let (_cell, binder) = cell_binder(0_i32);
        let field = Element::field(None, binder);
        let root = Element::column([Element::row([field.clone()])]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = root.on_subtree_value_changed(move |id| s.borrow_mut().push(*id));

        field.set_value(4_i32).unwrap();
        assert_eq!(*seen.borrow(), vec![field.id()]);
    }

    #[test]
    fn non_interactable_ancestor_blocks_writes() {
        let (_cell, binder) = cell_binder(0_i32);
        let field = Element::field(None, binder);
        let root = Element::column([field.clone()]);
        root.set_interactable(false);
        assert!(field.set_value(1_i32).is_err());
    }
}
