//! Assembly kernel: containers, references, components and properties
//!
//! This crate provides:
//! - Containers with shared undo/redo history logs and content proxies
//! - Reference edges carrying validated rigid transforms
//! - Canonical component resolution with memoized paths
//! - Leaf-nearest property overlays (suppress, hide, custom attributes)
//! - Use-counted handles and the cleanup sweeps that release containers
//! - Session document export/import for the persistence layer

pub mod apply;
pub mod commands;
pub mod errors;
pub mod factory;
pub mod history;
pub mod lifecycle;
pub mod logging_facility;
pub mod manager;
pub mod model;
pub mod ops;
pub mod render;
pub mod snapshot;
pub mod traversal;

pub use asmx_core_types;

// Re-export commonly used types
pub use apply::apply;
pub use commands::{Command, CommandOutcome};
pub use errors::{AsmError, ExError, ExErrorKind, Result};
pub use lifecycle::{ComponentHandle, ContainerHandle, ContentHandle};
pub use ops::Session;
