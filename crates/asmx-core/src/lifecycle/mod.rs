//! Use counting and unneeded-object sweeps

pub mod sweep;
pub mod use_count;

pub use sweep::{cleanup, cleanup_tree, CleanupOptions, CleanupReport, CleanupScope};
pub use use_count::{ComponentHandle, ContainerHandle, ContentHandle, Hold};
