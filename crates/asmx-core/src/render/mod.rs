//! Boundary with the rendering layer

pub mod bridge;
pub mod scene;

pub use bridge::{request_highlight, request_hide, RenderBridge, RenderTarget};
pub use scene::{scene_description, SceneNode};
