//! Assembly store - persistence of container graphs
//!
//! Provides:
//! - Save/restore over lists of root containers
//! - Text (pretty JSON) and digest-checked binary encodings
//! - Atomic file writes for path-based save

pub mod atomic;
pub mod codec;
pub mod errors;
pub mod persist;

// Re-export key types
pub use codec::{SaveFormat, SaveOptions};
pub use errors::Result;
pub use persist::{restore, restore_from_path, save, save_to_path};
