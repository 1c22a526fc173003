#![forbid(unsafe_code)]

//! Value-type dispatch for [`ui::field`](crate::ui::field).
//!
//! | Bound type | Element |
//! |------------|---------|
//! | primitives, `String` | `Field` |
//! | `Vec<T>`, `[T; N]`, `Rc<[T]>` | `ListView` of `T` fields |
//! | [`ObjectRef`] | `Dynamic` wrapping the registered factory's element |

use std::rc::Rc;

use weave_element::{Element, ElementConfig, SliderRange, create_custom_element};
use weave_reactive::{Binder, ListValue, ObjectRef};

/// A value type that knows which element edits it.
pub trait FieldValue: Clone + 'static {
    fn create_field(label: Option<Element>, binder: Binder<Self>) -> Option<Element>;
}

macro_rules! leaf_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn create_field(label: Option<Element>, binder: Binder<Self>) -> Option<Element> {
                    Some(Element::field(label, binder))
                }
            }
        )*
    };
}

leaf_field!(
    bool, char, String, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

/// List view whose items are built with `T::create_field`.
pub(crate) fn list_of<L>(label: Option<Element>, binder: Binder<L>) -> Element
where
    L: ListValue,
    L::Item: FieldValue + Default,
{
    let config = ElementConfig::global();
    let option = config.list_option;
    Element::list_view(
        label,
        binder,
        move |item, index| {
            let label = Element::label(config.item_label(index));
            <L::Item as FieldValue>::create_field(Some(label), item)
        },
        option,
    )
}

impl<T: FieldValue + Default> FieldValue for Vec<T> {
    fn create_field(label: Option<Element>, binder: Binder<Self>) -> Option<Element> {
        Some(list_of(label, binder))
    }
}

impl<T: FieldValue + Default, const N: usize> FieldValue for [T; N] {
    fn create_field(label: Option<Element>, binder: Binder<Self>) -> Option<Element> {
        Some(list_of(label, binder))
    }
}

impl<T: FieldValue + Default> FieldValue for Rc<[T]> {
    fn create_field(label: Option<Element>, binder: Binder<Self>) -> Option<Element> {
        Some(list_of(label, binder))
    }
}

impl FieldValue for ObjectRef {
    fn create_field(label: Option<Element>, binder: Binder<Self>) -> Option<Element> {
        Some(object_element(label, binder))
    }
}

/// Dynamic element showing the registered factory's UI for the bound object.
///
/// The subtree is rebuilt whenever a different object (by identity) is bound.
/// Renderer writes inside the subtree are written back through `binder`, so
/// listeners on the parent value observe them.
pub(crate) fn object_element(label: Option<Element>, binder: Binder<ObjectRef>) -> Element {
    let source = label.as_ref().and_then(Element::label_source);
    if let Some(label) = label {
        label.destroy();
    }

    let read = binder.clone();
    Element::dynamic_on_status_changed(
        move || read.try_get().unwrap_or_default(),
        move |object: &ObjectRef| {
            let label = source.clone().map(Element::label);
            let element = create_custom_element(label.clone(), object);
            if let Some(label) = label.filter(|l| l.parent().is_none()) {
                label.destroy();
            }
            if let Some(element) = &element {
                if !binder.is_read_only() {
                    let write_back = binder.clone();
                    let object = object.clone();
                    element.hold(element.on_subtree_value_changed(move |_| {
                        if let Err(err) = write_back.set(object.clone()) {
                            tracing::debug!(%err, "object write-back rejected");
                        }
                    }));
                }
            }
            element
        },
    )
}

/// A field type with a natural slider range.
pub trait SliderValue: FieldValue + PartialOrd {
    /// Range used when none is given.
    fn default_range() -> SliderRange<Self>;
}

macro_rules! slider_value {
    ($min:expr, $max:expr; $($ty:ty),* $(,)?) => {
        $(
            impl SliderValue for $ty {
                fn default_range() -> SliderRange<Self> {
                    SliderRange::constant($min, $max)
                }
            }
        )*
    };
}

slider_value!(0, 100; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
slider_value!(0.0, 1.0; f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use weave_element::ElementKind;

    #[test]
    fn primitives_build_fields() {
        let binder = Binder::from_cell(Rc::new(RefCell::new(1.5_f32)));
        let element = f32::create_field(None, binder).unwrap();
        assert_eq!(element.kind(), ElementKind::Field);
        assert_eq!(element.value::<f32>(), Some(1.5));
    }

    #[test]
    fn vectors_build_list_views_with_item_labels() {
        let binder = Binder::from_cell(Rc::new(RefCell::new(vec![1_u8, 2])));
        let element = Vec::<u8>::create_field(None, binder).unwrap();
        assert_eq!(element.kind(), ElementKind::ListView);
        let items = element.as_list_view().unwrap().materialize_all();
        let field = &items[1].children()[0];
        assert_eq!(field.header().and_then(|h| h.text()).as_deref(), Some("Item 1"));
        assert_eq!(field.value::<u8>(), Some(2));
    }

    #[test]
    fn default_slider_ranges() {
        assert_eq!(u8::default_range().max(), Some(100));
        assert_eq!(f64::default_range().max(), Some(1.0));
    }
}
