use std::collections::{BTreeMap, BTreeSet};

use asmx_core_types::{ContainerId, ContentId, EdgeId, LogId};
use nalgebra::Matrix4;

use super::document::{SessionDocument, FORMAT_VERSION};
use crate::errors::{AsmError, Result};
use crate::factory::FactoryRegistry;
use crate::history::{Change, ContentRecord, HistoryState};
use crate::lifecycle::use_count::{ContainerHandle, Hold};
use crate::model::{Property, PropertyOwner, RigidTransform};
use crate::ops::container_ops::{insert_container, new_log};
use crate::ops::{ReferenceEdge, Session};

fn invalid(reason: impl Into<String>) -> AsmError {
    AsmError::InvalidDocument {
        reason: reason.into(),
    }
}

/// Rebuild the containers of `doc` inside `session`
///
/// Every identifier is freshly allocated. The whole document is checked
/// before anything is inserted, so a rejected document leaves the session
/// as it was.
///
/// Returns one handle per saved root, in document order.
///
/// # Errors
/// * `InvalidDocument` - Unknown format version or inconsistent content
/// * `FactoryMissing` - No manager factory is registered
/// * `InvalidTransform` - A stored edge matrix is not rigid
/// * `InvalidUnitScale` - A stored container has an unusable unit scale
pub fn import_document(
    session: &mut Session,
    doc: &SessionDocument,
    registry: &FactoryRegistry,
) -> Result<Vec<ContainerHandle>> {
    if doc.format_version != FORMAT_VERSION {
        return Err(invalid(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            doc.format_version
        )));
    }
    let factory = registry.get().ok_or(AsmError::FactoryMissing)?;
    let transforms = validate(doc)?;

    // Logs first so shared segments map to one fresh log each.
    let log_ids: Vec<LogId> = doc.logs.iter().map(|_| new_log(session)).collect();

    let mut container_map: BTreeMap<ContainerId, ContainerId> = BTreeMap::new();
    let mut temporary: Vec<ContainerHandle> = Vec::with_capacity(doc.containers.len());
    for entry in &doc.containers {
        let kind = factory.create(&entry.info, &entry.manager_kind, &entry.manager_payload);
        let handle = insert_container(session, kind, entry.info.clone(), log_ids[entry.log]);
        container_map.insert(entry.id, handle.id());
        temporary.push(handle);
    }

    let mut content_map: BTreeMap<ContentId, ContentId> = BTreeMap::new();
    for segment in &doc.logs {
        for record in &segment.records {
            let fresh = session.next_content_id();
            content_map.insert(record.object.id, fresh);
        }
    }
    for (segment, log_id) in doc.logs.iter().zip(&log_ids) {
        let records: Vec<ContentRecord> = segment
            .records
            .iter()
            .map(|r| {
                let mut record = r.clone();
                record.object.id = content_map[&r.object.id];
                record.object.container = container_map[&r.object.container];
                record.object.owner = r.object.owner.map(|o| content_map[&o]);
                record
            })
            .collect();
        let states: Vec<HistoryState> = segment
            .states
            .iter()
            .map(|state| HistoryState {
                changes: state
                    .changes
                    .iter()
                    .map(|c| match *c {
                        Change::Created(id) => Change::Created(content_map[&id]),
                        Change::Deleted(id) => Change::Deleted(content_map[&id]),
                    })
                    .collect(),
                committed_at: state.committed_at,
            })
            .collect();

        let history = session.logs.get_mut(log_id).ok_or_else(|| AsmError::Internal {
            message: format!("fresh {log_id} vanished during restore"),
        })?;
        for record in records {
            history.records.insert(record.object.id, record);
        }
        history.cursor = segment.cursor;
        history.states = states;
    }

    let mut edge_map: BTreeMap<EdgeId, EdgeId> = BTreeMap::new();
    for entry in &doc.containers {
        let fresh = container_map[&entry.id];
        let mut edges = Vec::with_capacity(entry.edges.len());
        for edge in &entry.edges {
            let target = container_map[&edge.target];
            let target_uses = session.container(target)?.uses.clone();
            let id = session.next_edge_id();
            session.edges.insert(
                id,
                ReferenceEdge {
                    id,
                    source: fresh,
                    target: Hold::acquire(target, &target_uses),
                    transform: transforms[&edge.id],
                },
            );
            edge_map.insert(edge.id, id);
            edges.push(id);
        }
        let record = session.container_mut(fresh)?;
        record.edges = edges;
        if let Some(root) = entry.composite_root {
            record.manager.set_composite_root(content_map[&root]);
        }
    }

    for entry in &doc.containers {
        let fresh = container_map[&entry.id];
        let mut owners = Vec::with_capacity(entry.owners.len());
        for owner in &entry.owners {
            let mut rebuilt = PropertyOwner::new(owner.target.iter().map(|e| edge_map[e]).collect());
            for property in &owner.properties {
                let id = session.next_property_id();
                session.property_index.insert(id, fresh);
                rebuilt.properties.push(Property {
                    id,
                    value: property.value.clone(),
                });
            }
            owners.push(rebuilt);
        }
        session.container_mut(fresh)?.owners = owners;
    }

    let roots = doc
        .roots
        .iter()
        .map(|root| {
            let fresh = container_map[root];
            let record = session.container(fresh)?;
            Ok(Hold::acquire(fresh, &record.uses))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        containers = doc.containers.len(),
        logs = doc.logs.len(),
        roots = roots.len(),
        "document imported"
    );
    drop(temporary);
    Ok(roots)
}

/// Check referential integrity and decode edge transforms
fn validate(doc: &SessionDocument) -> Result<BTreeMap<EdgeId, RigidTransform>> {
    let mut containers = BTreeSet::new();
    for entry in &doc.containers {
        if !containers.insert(entry.id) {
            return Err(invalid(format!("{} appears twice", entry.id)));
        }
        if entry.log >= doc.logs.len() {
            return Err(invalid(format!("{} points at log segment {}", entry.id, entry.log)));
        }
        entry.info.validate()?;
    }
    for root in &doc.roots {
        if !containers.contains(root) {
            return Err(invalid(format!("root {root} is not in the document")));
        }
    }

    let mut contents: BTreeMap<ContentId, usize> = BTreeMap::new();
    for (index, segment) in doc.logs.iter().enumerate() {
        if segment.cursor > segment.states.len() {
            return Err(invalid(format!(
                "log segment {index} cursor {} exceeds {} states",
                segment.cursor,
                segment.states.len()
            )));
        }
        for record in &segment.records {
            if contents.insert(record.object.id, index).is_some() {
                return Err(invalid(format!("{} appears twice", record.object.id)));
            }
            if !containers.contains(&record.object.container) {
                return Err(invalid(format!(
                    "{} belongs to unknown {}",
                    record.object.id, record.object.container
                )));
            }
        }
    }
    for (index, segment) in doc.logs.iter().enumerate() {
        for record in &segment.records {
            if let Some(owner) = record.object.owner {
                if contents.get(&owner) != Some(&index) {
                    return Err(invalid(format!(
                        "{} is owned by {owner} outside its log",
                        record.object.id
                    )));
                }
            }
        }
        for state in &segment.states {
            for change in &state.changes {
                let (Change::Created(id) | Change::Deleted(id)) = *change;
                if contents.get(&id) != Some(&index) {
                    return Err(invalid(format!("history of segment {index} names unknown {id}")));
                }
            }
        }
    }

    let mut transforms = BTreeMap::new();
    let mut graph: BTreeMap<ContainerId, Vec<ContainerId>> = BTreeMap::new();
    for entry in &doc.containers {
        if let Some(root) = entry.composite_root {
            if contents.get(&root) != Some(&entry.log) {
                return Err(invalid(format!("composite root {root} of {} is missing", entry.id)));
            }
        } else if !entry.edges.is_empty() {
            return Err(invalid(format!("{} has edges but no composite root", entry.id)));
        }
        for edge in &entry.edges {
            if !containers.contains(&edge.target) {
                return Err(invalid(format!("{} targets unknown {}", edge.id, edge.target)));
            }
            let matrix = Matrix4::from_fn(|r, c| edge.transform[r][c]);
            if transforms
                .insert(edge.id, RigidTransform::from_matrix(&matrix)?)
                .is_some()
            {
                return Err(invalid(format!("{} appears twice", edge.id)));
            }
            graph.entry(entry.id).or_default().push(edge.target);
        }
    }
    for entry in &doc.containers {
        for owner in &entry.owners {
            if let Some(edge) = owner.target.iter().find(|e| !transforms.contains_key(e)) {
                return Err(invalid(format!("owner in {} names unknown {edge}", entry.id)));
            }
        }
    }

    if let Some(container) = find_cycle(&graph) {
        return Err(invalid(format!("reference cycle through {container}")));
    }
    Ok(transforms)
}

fn find_cycle(graph: &BTreeMap<ContainerId, Vec<ContainerId>>) -> Option<ContainerId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Open,
        Done,
    }
    let mut marks: BTreeMap<ContainerId, Mark> = BTreeMap::new();
    for start in graph.keys() {
        if marks.contains_key(start) {
            continue;
        }
        let mut stack = vec![(*start, 0usize)];
        marks.insert(*start, Mark::Open);
        while let Some((node, next)) = stack.pop() {
            let children = graph.get(&node).map(Vec::as_slice).unwrap_or(&[]);
            if let Some(child) = children.get(next) {
                stack.push((node, next + 1));
                match marks.get(child) {
                    Some(Mark::Open) => return Some(*child),
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(*child, Mark::Open);
                        stack.push((*child, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
            }
        }
    }
    None
}
