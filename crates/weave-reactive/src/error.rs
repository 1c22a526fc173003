#![forbid(unsafe_code)]

//! Errors raised by binder writes.

/// Failure of a write or structural edit through a [`Binder`](crate::Binder).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// The binder or its collection does not accept writes.
    #[error("binding is read-only")]
    ReadOnly,
    /// The collection cannot grow or shrink.
    #[error("collection has a fixed size")]
    FixedSize,
    /// A child binder addressed an index the parent collection no longer has.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// The parent value is null, so there is nothing to write through.
    #[error("binding target is null")]
    Null,
    /// A type-erased value did not have the expected type.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str },
}
