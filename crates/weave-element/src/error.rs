#![forbid(unsafe_code)]

use thiserror::Error;
use weave_reactive::BindError;

use crate::element::{ElementId, ElementKind};

/// Failures of element-tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("element {0} is destroyed")]
    Destroyed(ElementId),

    #[error("element {id} is not interactable")]
    NotInteractable { id: ElementId },

    #[error("{kind} elements do not support {operation}")]
    Unsupported {
        kind: ElementKind,
        operation: &'static str,
    },

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: ElementId, child: ElementId },

    #[error("type ancestry cycle through {type_name}")]
    AncestryCycle { type_name: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),
}
