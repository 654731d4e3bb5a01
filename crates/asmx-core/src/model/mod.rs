pub mod content;
pub mod customer_info;
pub mod path;
pub mod property;
pub mod transform;

pub use content::{ContentObject, COMPOSITE_ROOT_KIND};
pub use customer_info::{CustomerInfo, ANGULAR_TOLERANCE};
pub use path::ComponentPath;
pub use property::{Property, PropertyFlags, PropertyKind, PropertyOwner, PropertyValue};
pub use transform::{RigidTransform, Transform};
