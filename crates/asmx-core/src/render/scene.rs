use std::collections::BTreeMap;

use asmx_core_types::ContainerId;

use crate::errors::Result;
use crate::lifecycle::use_count::ComponentHandle;
use crate::model::Transform;
use crate::ops::component_ops::{end_container, get_transform, resolve_component};
use crate::ops::property_ops::{custom_properties, is_hidden, is_suppressed};
use crate::ops::Session;
use crate::traversal::{get_components, ComponentRequest};

/// Resolved state of one component, as handed to a renderer
#[derive(Debug)]
pub struct SceneNode {
    pub component: ComponentHandle,
    pub end_container: ContainerId,
    /// Placement in the root's frame, unit rescale included
    pub transform: Transform,
    pub suppressed: bool,
    pub hidden: bool,
    pub custom: BTreeMap<String, serde_json::Value>,
}

/// Describe every component under `root` in walk order
///
/// Suppressed subtrees are left out unless `include_suppressed` is set.
///
/// # Errors
/// * `ContainerNotFound` / `StaleContainer` - `root` is not live
pub fn scene_description(
    session: &mut Session,
    root: ContainerId,
    include_suppressed: bool,
) -> Result<Vec<SceneNode>> {
    let start = resolve_component(session, root, &[])?;
    let components = get_components(session, start.id(), ComponentRequest::All, include_suppressed)?;

    let mut nodes = Vec::with_capacity(components.len());
    for component in components {
        let id = component.id();
        nodes.push(SceneNode {
            end_container: end_container(session, id)?,
            transform: get_transform(session, id, true)?,
            suppressed: is_suppressed(session, id)?,
            hidden: is_hidden(session, id)?,
            custom: custom_properties(session, id)?,
            component,
        });
    }
    Ok(nodes)
}
