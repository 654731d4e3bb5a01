//! Core types shared across the assembly kernel and its persistence layer
//!
//! This crate provides:
//!
//! - **Identifiers**: session-local newtypes for containers, content objects,
//!   reference edges, components, content proxies, properties and history logs
//! - **Schema constants**: canonical field keys and event names for
//!   structured logging

pub mod ids;
pub mod schema;

pub use ids::{ComponentId, ContainerId, ContentId, EdgeId, IdAllocator, LogId, PropertyId, ProxyId};
