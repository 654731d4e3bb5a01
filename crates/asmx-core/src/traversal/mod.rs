//! Tree walks over the folded component tree

pub mod walk;

pub use walk::{get_components, ComponentRequest};
