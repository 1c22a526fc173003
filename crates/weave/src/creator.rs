#![forbid(unsafe_code)]

use weave_element::Element;

/// An externally owned object that can describe its own UI.
///
/// Used with [`ui::element_creator_inline`](crate::ui::element_creator_inline)
/// and [`ui::element_creator_window_launcher`](crate::ui::element_creator_window_launcher),
/// which look the object up periodically and rebuild when it appears or goes
/// away.
pub trait ElementCreator {
    fn create_element(&self) -> Option<Element>;

    /// Whether the object is still live. Inactive objects are looked up again.
    fn is_active(&self) -> bool {
        true
    }
}

/// Last path segment of a type name: `app::panels::Stats` -> `Stats`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
