//! Component resolver
//!
//! Turns (root, edge list) paths into canonical component proxies. The memo
//! table maps each live path to exactly one record, so two resolutions of
//! equal paths hand out holders of the same object.

use asmx_core_types::{ComponentId, ContainerId, EdgeId};
use nalgebra::Similarity3;

use super::content_ops::get_or_create_proxy;
use super::session::{ComponentRecord, Session};
use crate::errors::{AsmError, Result};
use crate::lifecycle::use_count::{ComponentHandle, ContentHandle, Hold, UseCell};
use crate::model::{ComponentPath, Transform};

/// Resolve a path into its canonical component
///
/// Every edge must leave the container the previous edge entered (the
/// first edge must leave `root`). No active context is required.
///
/// # Errors
/// * `ContainerNotFound` / `StaleContainer` - Unknown or swept root
/// * `UnreachablePath` - An edge is missing or does not continue the path
pub fn resolve_component(
    session: &mut Session,
    root: ContainerId,
    edges: &[EdgeId],
) -> Result<ComponentHandle> {
    let root_uses = session.container(root)?.uses.clone();
    walk_path(session, root, edges)?;

    let path = ComponentPath::new(root, edges.to_vec());
    if let Some(id) = session.memo.get(&path) {
        let record = session.component(*id)?;
        return Ok(Hold::acquire(record.id, &record.uses));
    }

    let id = session.next_component_id();
    let uses = UseCell::new();
    let handle = Hold::acquire(id, &uses);
    session.components.insert(
        id,
        ComponentRecord {
            id,
            path: path.clone(),
            uses,
            root: Hold::acquire(root, &root_uses),
        },
    );
    session.memo.insert(path, id);
    Ok(handle)
}

/// Resolve a structural path, see `resolve_component`
pub fn resolve_path(session: &mut Session, path: &ComponentPath) -> Result<ComponentHandle> {
    resolve_component(session, path.root, &path.edges)
}

/// Containers visited by a path: the root, then each edge's target
///
/// # Errors
/// * `UnreachablePath` - An edge is missing or does not continue the path
pub(crate) fn walk_path(
    session: &Session,
    root: ContainerId,
    edges: &[EdgeId],
) -> Result<Vec<ContainerId>> {
    let mut visited = Vec::with_capacity(edges.len() + 1);
    visited.push(root);
    let mut current = root;
    for (step, edge_id) in edges.iter().enumerate() {
        let edge = session
            .edges
            .get(edge_id)
            .ok_or_else(|| AsmError::UnreachablePath {
                root,
                step,
                reason: format!("{edge_id} does not exist"),
            })?;
        if edge.source != current {
            return Err(AsmError::UnreachablePath {
                root,
                step,
                reason: format!("{edge_id} leaves {} not {current}", edge.source),
            });
        }
        current = edge.target();
        visited.push(current);
    }
    Ok(visited)
}

/// Look up a component whose edges must all still exist
///
/// # Errors
/// * `ComponentNotFound` - Unknown or swept component
/// * `StaleComponent` - An edge on the path has been removed
pub(crate) fn live_component(session: &Session, component: ComponentId) -> Result<&ComponentRecord> {
    let record = session.component(component)?;
    if let Some(edge_id) = record
        .path
        .edges
        .iter()
        .find(|e| !session.edges.contains_key(e))
    {
        return Err(AsmError::StaleComponent {
            component_id: component,
            edge_id: *edge_id,
        });
    }
    Ok(record)
}

/// Structural path of a component
pub fn component_path(session: &Session, component: ComponentId) -> Result<ComponentPath> {
    Ok(live_component(session, component)?.path.clone())
}

/// Containers along a component's path, root first
pub fn path_containers(session: &Session, component: ComponentId) -> Result<Vec<ContainerId>> {
    let record = live_component(session, component)?;
    walk_path(session, record.path.root, &record.path.edges)
}

/// Container holding the component's own content
pub fn end_container(session: &Session, component: ComponentId) -> Result<ContainerId> {
    let containers = path_containers(session, component)?;
    containers.last().copied().ok_or_else(|| AsmError::Internal {
        message: format!("{component} has an empty container chain"),
    })
}

/// Parent component; `None` for a zero-length path
pub fn parent(session: &mut Session, component: ComponentId) -> Result<Option<ComponentHandle>> {
    let path = component_path(session, component)?;
    match path.parent() {
        Some(parent_path) => Ok(Some(resolve_path(session, &parent_path)?)),
        None => Ok(None),
    }
}

/// All ancestors, nearest first
pub fn ancestors(session: &mut Session, component: ComponentId) -> Result<Vec<ComponentHandle>> {
    let path = component_path(session, component)?;
    let mut result = Vec::with_capacity(path.len());
    let mut current = path.parent();
    while let Some(ancestor) = current {
        result.push(resolve_path(session, &ancestor)?);
        current = ancestor.parent();
    }
    Ok(result)
}

/// Tip-to-tail composition of two components
///
/// `b`'s root must be `a`'s end container; the result is the component for
/// `a`'s edges followed by `b`'s.
///
/// # Errors
/// * `UnreachablePath` - `b` does not start where `a` ends
pub fn concatenate(
    session: &mut Session,
    a: ComponentId,
    b: ComponentId,
) -> Result<ComponentHandle> {
    let head = component_path(session, a)?;
    let tail = component_path(session, b)?;
    let joint = end_container(session, a)?;
    if joint != tail.root {
        return Err(AsmError::UnreachablePath {
            root: head.root,
            step: head.len(),
            reason: format!("{b} starts at {} but {a} ends at {joint}", tail.root),
        });
    }
    let mut edges = head.edges;
    edges.extend_from_slice(&tail.edges);
    resolve_component(session, head.root, &edges)
}

/// Content proxies for the top-level content of the end container
pub fn component_content(
    session: &mut Session,
    component: ComponentId,
) -> Result<Vec<ContentHandle>> {
    let container = end_container(session, component)?;
    let owned = session.log_of(container)?.top_level_of(container);
    owned
        .into_iter()
        .map(|content| get_or_create_proxy(session, container, content, false))
        .collect()
}

/// Compose the edge transforms along a component's path
///
/// With column vectors, a path `[e1, e2]` yields `T1 * T2`: geometry in the
/// end container's frame is placed by `T2` first, then `T1`. With
/// `include_unit_rescale`, each step also scales by the ratio of the child
/// container's unit length to its parent's, giving `T1 * S1 * T2 * S2`.
///
/// # Errors
/// * `InvalidUnitScale` - A container on the path has an unusable unit scale
pub fn get_transform(
    session: &Session,
    component: ComponentId,
    include_unit_rescale: bool,
) -> Result<Transform> {
    let record = live_component(session, component)?;
    let mut acc = Transform::identity();
    let mut parent_info = &session.container(record.path.root)?.manager.info;
    for edge_id in &record.path.edges {
        let edge = session.edge(*edge_id)?;
        acc = acc * edge.transform.to_transform();
        if include_unit_rescale {
            let child_info = &session.container(edge.target())?.manager.info;
            acc = acc * Similarity3::from_scaling(child_info.unit_ratio_into(parent_info)?);
            parent_info = child_info;
        }
    }
    Ok(acc)
}

/// Transform carrying geometry from `origin`'s frame into `target`'s frame
///
/// Computed as `X_target⁻¹ * X_origin` where `X` is `get_transform`.
///
/// # Errors
/// * `NoCommonRoot` - The components hang off different roots
pub fn get_relative_transform(
    session: &Session,
    origin: ComponentId,
    target: ComponentId,
    include_unit_rescale: bool,
) -> Result<Transform> {
    let origin_root = live_component(session, origin)?.path.root;
    let target_root = live_component(session, target)?.path.root;
    if origin_root != target_root {
        return Err(AsmError::NoCommonRoot { origin, target });
    }
    let x_origin = get_transform(session, origin, include_unit_rescale)?;
    let x_target = get_transform(session, target, include_unit_rescale)?;
    Ok(x_target.inverse() * x_origin)
}
