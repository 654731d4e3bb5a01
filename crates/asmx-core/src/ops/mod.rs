pub mod component_ops;
pub mod container_ops;
pub mod content_ops;
pub mod context;
pub mod property_ops;
pub mod reference_ops;
pub mod session;

pub use context::{in_context, nested_activate, nested_deactivate, ActivationToken};
pub use session::{ComponentRecord, ContainerRecord, ProxyRecord, ReferenceEdge, Session};
