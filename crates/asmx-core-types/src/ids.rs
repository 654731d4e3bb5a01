//! Identifier newtypes
//!
//! Identifiers are allocated by a session and are only meaningful inside
//! it. Persistence remaps them on restore.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw value
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw value
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a container (model)
    ContainerId,
    "container"
);
define_id!(
    /// Identifier of a content object (entity) inside a history log
    ContentId,
    "content"
);
define_id!(
    /// Identifier of a reference edge (model reference)
    EdgeId,
    "edge"
);
define_id!(
    /// Identifier of a canonical component proxy
    ComponentId,
    "component"
);
define_id!(
    /// Identifier of a content proxy (entity handle)
    ProxyId,
    "proxy"
);
define_id!(
    /// Identifier of a single recorded property
    PropertyId,
    "property"
);
define_id!(
    /// Identifier of a history (undo/redo) log
    LogId,
    "log"
);

/// Monotonic allocator for one identifier family
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next raw value
    pub fn next_raw(&mut self) -> u64 {
        if self.next == 0 {
            self.next = 1;
        }
        let raw = self.next;
        self.next += 1;
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_prefix() {
        assert_eq!(ContainerId::from_raw(7).to_string(), "container-7");
        assert_eq!(EdgeId::from_raw(3).to_string(), "edge-3");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&ComponentId::from_raw(42)).unwrap();
        assert_eq!(json, "42");
        let back: ComponentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.raw(), 42);
    }

    #[test]
    fn test_allocator_never_hands_out_zero() {
        let mut alloc = crate::IdAllocator::default();
        assert_eq!(alloc.next_raw(), 1);
        assert_eq!(alloc.next_raw(), 2);
    }
}
