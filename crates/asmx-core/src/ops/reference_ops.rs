use std::collections::BTreeSet;

use asmx_core_types::{ContainerId, EdgeId};
use nalgebra::Matrix4;

use super::session::{ReferenceEdge, Session};
use crate::errors::{AsmError, Result};
use crate::lifecycle::use_count::Hold;
use crate::manager::ChangeSeverity;
use crate::model::RigidTransform;

/// Instance `target` inside `source`'s composite root
///
/// Everything is validated before anything is touched; a failed call
/// leaves the edge list exactly as it was.
///
/// # Arguments
/// * `source` - Container owning the composite root
/// * `target` - Container to instance
/// * `transform` - Placement of the target in the source's frame
/// * `pushback` - Append to the sibling order (true) or insert at its head
///
/// # Errors
/// * `WrongContext` - `source`'s log is not active
/// * `NotAnAssembly` - `source` has no composite root
/// * `InvalidTransform` - Reflection, shear, scale or a projective part
/// * `CycleDetected` - `target` already reaches `source`
pub fn add_reference(
    session: &mut Session,
    source: ContainerId,
    target: ContainerId,
    transform: &Matrix4<f64>,
    pushback: bool,
) -> Result<EdgeId> {
    session.require_active(source)?;
    if !session.container(source)?.manager.has_composite_root() {
        return Err(AsmError::NotAnAssembly {
            container_id: source,
        });
    }
    let rigid = RigidTransform::from_matrix(transform)?;
    let target_uses = session.container(target)?.uses.clone();
    if source == target || would_create_cycle(session, source, target) {
        return Err(AsmError::CycleDetected {
            source_container: source,
            target,
        });
    }

    let id = session.next_edge_id();
    session.edges.insert(
        id,
        ReferenceEdge {
            id,
            source,
            target: Hold::acquire(target, &target_uses),
            transform: rigid,
        },
    );
    let record = session.container_mut(source)?;
    if pushback {
        record.edges.push(id);
    } else {
        record.edges.insert(0, id);
    }
    session.note_change(ChangeSeverity::Geometric);
    tracing::debug!(
        edge_id = id.raw(),
        container_id = source.raw(),
        target = target.raw(),
        "reference added"
    );
    Ok(id)
}

/// Detach and dispose an edge
///
/// The target only loses the edge's hold; it is not deleted here. Property
/// owners whose targets run through the edge go with it.
///
/// # Errors
/// * `EdgeNotFound` - Unknown edge
/// * `WrongContext` - The source container's log is not active
pub fn remove_reference(session: &mut Session, edge: EdgeId) -> Result<()> {
    let source = session.edge(edge)?.source;
    session.require_active(source)?;

    session.container_mut(source)?.edges.retain(|e| *e != edge);
    session.edges.remove(&edge);
    purge_owners_through(session, &[edge]);
    session.note_change(ChangeSeverity::Geometric);
    tracing::debug!(edge_id = edge.raw(), container_id = source.raw(), "reference removed");
    Ok(())
}

/// Outgoing edges of a container in sibling order
pub fn edges_of(session: &Session, container: ContainerId) -> Result<Vec<EdgeId>> {
    Ok(session.container(container)?.edges.clone())
}

/// Check whether linking `source -> target` would close a cycle
///
/// True when `source` is reachable from `target` by following edges.
pub(crate) fn would_create_cycle(session: &Session, source: ContainerId, target: ContainerId) -> bool {
    let mut visited = BTreeSet::new();
    let mut stack = vec![target];
    while let Some(current) = stack.pop() {
        if current == source {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(record) = session.containers.get(&current) {
            for edge in &record.edges {
                if let Some(e) = session.edges.get(edge) {
                    stack.push(e.target());
                }
            }
        }
    }
    false
}

/// Containers reachable from `roots` through edges, roots included
///
/// Preorder, each container once.
pub(crate) fn reachable_containers(session: &Session, roots: &[ContainerId]) -> Vec<ContainerId> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    let mut stack: Vec<ContainerId> = roots.iter().rev().copied().collect();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        order.push(current);
        if let Some(record) = session.containers.get(&current) {
            for edge in record.edges.iter().rev() {
                if let Some(e) = session.edges.get(edge) {
                    stack.push(e.target());
                }
            }
        }
    }
    order
}

/// Drop property owners whose relative target uses any of `edges`
pub(crate) fn purge_owners_through(session: &mut Session, edges: &[EdgeId]) {
    let mut dropped = Vec::new();
    for record in session.containers.values_mut() {
        record.owners.retain(|owner| {
            let dead = owner.target.iter().any(|e| edges.contains(e));
            if dead {
                dropped.extend(owner.properties.iter().map(|p| p.id));
            }
            !dead
        });
    }
    for id in dropped {
        session.property_index.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomerInfo;
    use crate::ops::container_ops::{create_composite_root, create_container};
    use crate::ops::context::in_context;

    fn assembly(session: &mut Session, name: &str) -> crate::lifecycle::ContainerHandle {
        let asm = create_container(session, CustomerInfo::new(name)).unwrap();
        in_context(session, asm.id(), |s| create_composite_root(s, asm.id())).unwrap();
        asm
    }

    #[test]
    fn test_pushback_controls_sibling_order() {
        let mut session = Session::new();
        let asm = assembly(&mut session, "asm");
        let a = create_container(&mut session, CustomerInfo::new("a")).unwrap();
        let b = create_container(&mut session, CustomerInfo::new("b")).unwrap();

        let (ea, eb) = in_context(&mut session, asm.id(), |s| {
            let ea = add_reference(s, asm.id(), a.id(), &Matrix4::identity(), true)?;
            let eb = add_reference(s, asm.id(), b.id(), &Matrix4::identity(), false)?;
            Ok((ea, eb))
        })
        .unwrap();

        assert_eq!(edges_of(&session, asm.id()).unwrap(), vec![eb, ea]);
        assert_eq!(a.use_count(), 2);
    }

    #[test]
    fn test_non_assembly_source_rejected() {
        let mut session = Session::new();
        let part = create_container(&mut session, CustomerInfo::new("part")).unwrap();
        let other = create_container(&mut session, CustomerInfo::new("other")).unwrap();

        let err = in_context(&mut session, part.id(), |s| {
            add_reference(s, part.id(), other.id(), &Matrix4::identity(), true)
        })
        .unwrap_err();
        assert!(matches!(err, AsmError::NotAnAssembly { .. }));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut session = Session::new();
        let top = assembly(&mut session, "top");
        let sub = assembly(&mut session, "sub");

        in_context(&mut session, top.id(), |s| {
            add_reference(s, top.id(), sub.id(), &Matrix4::identity(), true)
        })
        .unwrap();
        let err = in_context(&mut session, sub.id(), |s| {
            add_reference(s, sub.id(), top.id(), &Matrix4::identity(), true)
        })
        .unwrap_err();
        assert!(matches!(err, AsmError::CycleDetected { .. }));

        let err = in_context(&mut session, top.id(), |s| {
            add_reference(s, top.id(), top.id(), &Matrix4::identity(), true)
        })
        .unwrap_err();
        assert!(matches!(err, AsmError::CycleDetected { .. }));
    }

    #[test]
    fn test_remove_reference_releases_target_hold() {
        let mut session = Session::new();
        let asm = assembly(&mut session, "asm");
        let part = create_container(&mut session, CustomerInfo::new("part")).unwrap();

        let edge = in_context(&mut session, asm.id(), |s| {
            add_reference(s, asm.id(), part.id(), &Matrix4::identity(), true)
        })
        .unwrap();
        assert_eq!(part.use_count(), 2);

        in_context(&mut session, asm.id(), |s| remove_reference(s, edge)).unwrap();
        assert_eq!(part.use_count(), 1);
        assert!(edges_of(&session, asm.id()).unwrap().is_empty());
        assert!(session.contains_container(part.id()));
    }
}
