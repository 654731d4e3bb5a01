use asmx_core_types::{ComponentId, ContainerId};

use crate::errors::Result;
use crate::lifecycle::use_count::ComponentHandle;
use crate::model::ComponentPath;
use crate::ops::component_ops::{live_component, resolve_path, walk_path};
use crate::ops::property_ops::is_path_suppressed;
use crate::ops::Session;

/// Which components a walk returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRequest {
    /// Direct children of the start component
    Immediate,
    /// All proper descendants
    Sub,
    /// The start component plus all proper descendants
    All,
    /// Descendants whose end container owns no composite root
    Leaf,
}

/// Walk the folded tree below `start`
///
/// Preorder, children in sibling order. Unless `include_suppressed` is set,
/// a suppressed component is skipped together with its whole subtree; that
/// includes `start` itself.
///
/// For `Leaf`, a start component without a composite root is its own
/// single leaf.
///
/// # Errors
/// * `ComponentNotFound` / `StaleComponent` - `start` is not live
pub fn get_components(
    session: &mut Session,
    start: ComponentId,
    request: ComponentRequest,
    include_suppressed: bool,
) -> Result<Vec<ComponentHandle>> {
    let start_path = live_component(session, start)?.path.clone();
    let paths = collect_paths(session, &start_path, request, include_suppressed)?;
    paths
        .iter()
        .map(|path| resolve_path(session, path))
        .collect()
}

/// Path-level walk; resolves nothing
pub(crate) fn collect_paths(
    session: &Session,
    start: &ComponentPath,
    request: ComponentRequest,
    include_suppressed: bool,
) -> Result<Vec<ComponentPath>> {
    if !include_suppressed && is_path_suppressed(session, start)? {
        return Ok(Vec::new());
    }

    let start_end = end_of(session, start)?;
    let start_is_assembly = session.container(start_end)?.manager.has_composite_root();
    let mut found = Vec::new();
    match request {
        ComponentRequest::All => found.push(start.clone()),
        ComponentRequest::Leaf if !start_is_assembly => {
            found.push(start.clone());
            return Ok(found);
        }
        _ => {}
    }

    let mut stack: Vec<(ComponentPath, usize)> = children(session, start)?
        .into_iter()
        .rev()
        .map(|child| (child, 1))
        .collect();
    while let Some((path, depth)) = stack.pop() {
        if !include_suppressed && is_path_suppressed(session, &path)? {
            continue;
        }
        let end = end_of(session, &path)?;
        let is_assembly = session.container(end)?.manager.has_composite_root();
        let wanted = match request {
            ComponentRequest::Immediate => depth == 1,
            ComponentRequest::Sub | ComponentRequest::All => true,
            ComponentRequest::Leaf => !is_assembly,
        };
        if wanted {
            found.push(path.clone());
        }
        if request != ComponentRequest::Immediate {
            for child in children(session, &path)?.into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }
    Ok(found)
}

fn end_of(session: &Session, path: &ComponentPath) -> Result<ContainerId> {
    let containers = walk_path(session, path.root, &path.edges)?;
    Ok(*containers.last().unwrap_or(&path.root))
}

fn children(session: &Session, path: &ComponentPath) -> Result<Vec<ComponentPath>> {
    let end = end_of(session, path)?;
    Ok(session
        .container(end)?
        .edges
        .iter()
        .map(|edge| path.child(*edge))
        .collect())
}
