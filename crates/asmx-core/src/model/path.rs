use asmx_core_types::{ContainerId, EdgeId};
use serde::{Deserialize, Serialize};

/// Structural identity of a component: a root container plus a tip-to-tail
/// edge list
///
/// An empty edge list denotes the root container's own top level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentPath {
    pub root: ContainerId,
    pub edges: Vec<EdgeId>,
}

impl ComponentPath {
    pub fn new(root: ContainerId, edges: Vec<EdgeId>) -> Self {
        Self { root, edges }
    }

    /// The zero-length path of a container
    pub fn root_of(root: ContainerId) -> Self {
        Self {
            root,
            edges: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Path with the last edge dropped; `None` for a zero-length path
    pub fn parent(&self) -> Option<ComponentPath> {
        let (_, rest) = self.edges.split_last()?;
        Some(Self {
            root: self.root,
            edges: rest.to_vec(),
        })
    }

    /// Path extended by one edge
    pub fn child(&self, edge: EdgeId) -> ComponentPath {
        let mut edges = self.edges.clone();
        edges.push(edge);
        Self {
            root: self.root,
            edges,
        }
    }

    /// True if `self` is a strict prefix of `other` under the same root
    pub fn is_proper_ancestor_of(&self, other: &ComponentPath) -> bool {
        self.root == other.root
            && self.edges.len() < other.edges.len()
            && other.edges.starts_with(&self.edges)
    }
}
