use asmx_core_types::{ContainerId, ContentId};
use serde::{Deserialize, Serialize};

/// A modeled object living in a history log
///
/// The kernel treats content as opaque apart from its owner chain (used for
/// ownership checks) and the container it was created for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    pub id: ContentId,

    /// Container the object was created in
    pub container: ContainerId,

    /// Free-form kind label ("body", "face", "assembly", ...)
    pub kind: String,

    /// Owning content object; `None` for top-level objects
    pub owner: Option<ContentId>,
}

impl ContentObject {
    pub fn new(
        id: ContentId,
        container: ContainerId,
        kind: impl Into<String>,
        owner: Option<ContentId>,
    ) -> Self {
        Self {
            id,
            container,
            kind: kind.into(),
            owner,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.owner.is_none()
    }
}

/// Kind label used for composite roots
pub const COMPOSITE_ROOT_KIND: &str = "assembly";
