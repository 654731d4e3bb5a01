use asmx_core_types::{EdgeId, PropertyId};
use serde::{Deserialize, Serialize};

/// Kind of a recorded property
///
/// Custom properties are keyed by name, so two custom properties with
/// different names are different kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyKind {
    Suppress,
    Hide,
    Custom(String),
}

impl PropertyKind {
    /// Suppression changes which components a walk visits
    pub fn is_structural(&self) -> bool {
        matches!(self, PropertyKind::Suppress)
    }
}

/// Value of a recorded property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Suppress(bool),
    Hide(bool),
    Custom {
        name: String,
        value: serde_json::Value,
    },
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Suppress(_) => PropertyKind::Suppress,
            PropertyValue::Hide(_) => PropertyKind::Hide,
            PropertyValue::Custom { name, .. } => PropertyKind::Custom(name.clone()),
        }
    }

    /// Boolean payload for suppress/hide values
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PropertyValue::Suppress(flag) | PropertyValue::Hide(flag) => Some(*flag),
            PropertyValue::Custom { .. } => None,
        }
    }
}

/// A single property stored on an owner record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub value: PropertyValue,
}

/// Property owner attribute recorded in one container
///
/// `target` is the component's edge list *relative to the recording
/// container*, so a single owner applies to every occurrence of that
/// container in the folded tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOwner {
    pub target: Vec<EdgeId>,
    pub properties: Vec<Property>,
}

impl PropertyOwner {
    pub fn new(target: Vec<EdgeId>) -> Self {
        Self {
            target,
            properties: Vec::new(),
        }
    }

    pub fn find(&self, kind: &PropertyKind) -> Option<&Property> {
        self.properties.iter().find(|p| &p.value.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Answer of `has_property`
///
/// The three flags are independent: a component can be modified itself,
/// through an ancestor, and have modified descendants all at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyFlags {
    /// Some proper descendant is modified
    pub child_mods: bool,
    /// The component itself is modified
    pub component_mods: bool,
    /// Some ancestor modifies it
    pub parent_mods: bool,
}

impl PropertyFlags {
    pub fn any(&self) -> bool {
        self.child_mods || self.component_mods || self.parent_mods
    }
}
