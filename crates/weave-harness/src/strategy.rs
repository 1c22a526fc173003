#![forbid(unsafe_code)]

//! Proptest strategies for random element trees.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use weave::{Binder, Element};

/// Shape of a generated tree, built with [`TreeSpec::build`].
#[derive(Debug, Clone)]
pub enum TreeSpec {
    Label(String),
    Field(i32),
    ReadOnlyField(i32),
    Button,
    Row(Vec<TreeSpec>),
    Column(Vec<TreeSpec>),
    Fold(Vec<TreeSpec>),
    Disabled(Box<TreeSpec>),
}

impl TreeSpec {
    /// Number of elements [`build`](Self::build) creates, labels of value
    /// fields and fold headers included.
    #[must_use]
    pub fn element_count(&self) -> usize {
        match self {
            Self::Label(_) | Self::Button => 1,
            Self::Field(_) | Self::ReadOnlyField(_) => 2,
            Self::Row(children) | Self::Column(children) => {
                1 + children.iter().map(Self::element_count).sum::<usize>()
            }
            Self::Fold(children) => 2 + children.iter().map(Self::element_count).sum::<usize>(),
            Self::Disabled(inner) => inner.element_count(),
        }
    }

    /// Build the tree. Field values live in fresh cells.
    #[must_use]
    pub fn build(&self) -> Element {
        match self {
            Self::Label(text) => Element::label(text.as_str()),
            Self::Field(value) => Element::field(
                Some(Element::label("value")),
                Binder::from_cell(Rc::new(RefCell::new(*value))),
            ),
            Self::ReadOnlyField(value) => {
                let value = *value;
                Element::field(Some(Element::label("value")), Binder::read_only(move || value))
            }
            Self::Button => Element::button("press", || {}),
            Self::Row(children) => Element::row(children.iter().map(Self::build)),
            Self::Column(children) => Element::column(children.iter().map(Self::build)),
            Self::Fold(children) => {
                Element::fold(Element::label("fold"), children.iter().map(Self::build))
            }
            Self::Disabled(inner) => {
                let element = inner.build();
                element.set_enabled(false);
                element
            }
        }
    }
}

fn leaf() -> impl Strategy<Value = TreeSpec> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(TreeSpec::Label),
        any::<i32>().prop_map(TreeSpec::Field),
        any::<i32>().prop_map(TreeSpec::ReadOnlyField),
        Just(TreeSpec::Button),
    ]
}

/// Trees up to four levels deep with at most five children per container.
pub fn tree_spec() -> impl Strategy<Value = TreeSpec> {
    leaf().prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(TreeSpec::Row),
            prop::collection::vec(inner.clone(), 0..5).prop_map(TreeSpec::Column),
            prop::collection::vec(inner.clone(), 0..5).prop_map(TreeSpec::Fold),
            inner.prop_map(|spec| TreeSpec::Disabled(Box::new(spec))),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(element: &Element) -> usize {
        1 + element.children().iter().map(count).sum::<usize>()
    }

    #[test]
    fn element_count_matches_built_tree() {
        let spec = TreeSpec::Column(vec![
            TreeSpec::Field(1),
            TreeSpec::Fold(vec![TreeSpec::Button, TreeSpec::Label("x".into())]),
        ]);
        let root = spec.build();
        assert_eq!(count(&root), spec.element_count());
        assert_eq!(spec.element_count(), 7);
    }
}
