#![forbid(unsafe_code)]

//! Test support for Weave element trees.
//!
//! - [`RecordingBackend`]: mounts a tree like a renderer would and records
//!   every notification it receives.
//! - [`TickDriver`]: frames on a virtual clock, for poll-driven rebuilds.
//! - [`tree_snapshot`] / [`assert_tree!`]: indented text dumps of a tree.
//! - [`strategy`]: proptest generators for random trees.
//! - [`init_test_logging`]: `RUST_LOG`-filtered tracing output in tests.

pub mod backend;
pub mod driver;
pub mod logging;
pub mod snapshot;
pub mod strategy;

pub use backend::{BackendEvent, RecordingBackend};
pub use driver::TickDriver;
pub use logging::init_test_logging;
pub use snapshot::tree_snapshot;
pub use strategy::{TreeSpec, tree_spec};
