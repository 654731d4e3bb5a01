//! Command inventory for the `apply()` boundary
//!
//! Covers the mutating surface that runs inside one container's context.

use asmx_core_types::{ComponentId, ContainerId, ContentId, EdgeId, PropertyId};
use nalgebra::Matrix4;

use crate::model::PropertyValue;

/// A mutation applied inside the context of one container
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a content object, optionally owned by another
    CreateContent {
        kind: String,
        owner: Option<ContentId>,
    },

    /// Delete a content object and the objects it owns
    DeleteContent { content: ContentId },

    /// Give the container its composite root
    CreateCompositeRoot,

    /// Instance `target` under the container's composite root
    AddReference {
        target: ContainerId,
        transform: Matrix4<f64>,
        pushback: bool,
    },

    RemoveReference { edge: EdgeId },

    /// Record a property on `component`, owned by the context container
    SetProperty {
        component: ComponentId,
        value: PropertyValue,
    },

    RemoveProperty { property: PropertyId },

    /// Record `Suppress(true)` in the context container
    Suppress { component: ComponentId },

    /// Record `Suppress(false)` in the context container
    Unsuppress { component: ComponentId },
}

impl Command {
    /// Stable name used as the `op` field in logs
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::CreateContent { .. } => "create_content",
            Command::DeleteContent { .. } => "delete_content",
            Command::CreateCompositeRoot => "create_composite_root",
            Command::AddReference { .. } => "add_reference",
            Command::RemoveReference { .. } => "remove_reference",
            Command::SetProperty { .. } => "set_property",
            Command::RemoveProperty { .. } => "remove_property",
            Command::Suppress { .. } => "suppress",
            Command::Unsuppress { .. } => "unsuppress",
        }
    }
}

/// Result of a successfully applied command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    ContentCreated(ContentId),
    ContentDeleted(Vec<ContentId>),
    CompositeRootCreated(ContentId),
    ReferenceAdded(EdgeId),
    ReferenceRemoved(EdgeId),
    PropertySet(PropertyId),
    PropertyRemoved(PropertyId),
}
