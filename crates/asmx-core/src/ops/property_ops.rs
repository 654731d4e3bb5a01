//! Property overlay engine
//!
//! Owners are recorded in some container on a component's path and target
//! the component by its edge list relative to that container. Lookup order
//! is leaf-nearest first:
//!
//! 1. recording containers from the component's end container toward the
//!    root;
//! 2. inside one container, the component itself, then its ancestors from
//!    the nearest.
//!
//! The first owner carrying the requested kind wins, so a property recorded
//! nearer the root only governs when nothing nearer the leaf says otherwise.

use std::collections::BTreeMap;

use asmx_core_types::{ComponentId, ContainerId, EdgeId, PropertyId};

use super::component_ops::{live_component, walk_path};
use super::reference_ops::reachable_containers;
use super::session::Session;
use crate::errors::{AsmError, Result};
use crate::manager::ChangeSeverity;
use crate::model::{
    ComponentPath, Property, PropertyFlags, PropertyKind, PropertyOwner, PropertyValue,
};

/// Winning property for a component
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveProperty {
    pub property: Property,
    /// Container the owner is recorded in
    pub recorded_in: ContainerId,
    /// Owner target relative to `recorded_in`
    pub target: Vec<EdgeId>,
}

struct Lineage {
    root: ContainerId,
    edges: Vec<EdgeId>,
    /// `containers[i]` is entered by `edges[i - 1]`
    containers: Vec<ContainerId>,
}

impl Lineage {
    fn position(&self, container: ContainerId) -> Option<usize> {
        self.containers.iter().position(|c| *c == container)
    }

    /// (container index, prefix end) pairs in precedence order
    fn precedence(&self) -> impl Iterator<Item = (usize, usize)> {
        let n = self.edges.len();
        (0..=n).rev().flat_map(move |i| (i..=n).rev().map(move |k| (i, k)))
    }
}

fn lineage(session: &Session, component: ComponentId) -> Result<Lineage> {
    path_lineage(session, &live_component(session, component)?.path)
}

fn path_lineage(session: &Session, path: &ComponentPath) -> Result<Lineage> {
    let containers = walk_path(session, path.root, &path.edges)?;
    Ok(Lineage {
        root: path.root,
        edges: path.edges.clone(),
        containers,
    })
}

fn relative_target(
    lineage: &Lineage,
    component: ComponentId,
    container: ContainerId,
) -> Result<Vec<EdgeId>> {
    let pos = lineage
        .position(container)
        .ok_or(AsmError::ContainerNotOnPath {
            container_id: container,
            component_id: component,
        })?;
    Ok(lineage.edges[pos..].to_vec())
}

/// The zero-length component of a non-assembly container is its content
fn check_root_modification(session: &Session, lineage: &Lineage) -> Result<()> {
    if lineage.edges.is_empty() && !session.container(lineage.root)?.manager.has_composite_root()
    {
        return Err(AsmError::RootComponentModification {
            container_id: lineage.root,
        });
    }
    Ok(())
}

fn severity_of(kind: &PropertyKind) -> ChangeSeverity {
    if kind.is_structural() {
        ChangeSeverity::Geometric
    } else {
        ChangeSeverity::RenderOnly
    }
}

/// Find, and optionally create, the owner for `component` in `owning_container`
///
/// `owning_container` may be any container on the component's path and
/// must be the active context.
///
/// # Errors
/// * `WrongContext` - `owning_container`'s log is not active
/// * `ContainerNotOnPath` - `owning_container` is not on the path
/// * `RootComponentModification` - Creating an owner for the zero-length
///   component of a non-assembly container
pub fn find_or_create_property_owner(
    session: &mut Session,
    component: ComponentId,
    owning_container: ContainerId,
    create_if_absent: bool,
) -> Result<Option<&PropertyOwner>> {
    session.require_active(owning_container)?;
    let lineage = lineage(session, component)?;
    let target = relative_target(&lineage, component, owning_container)?;

    let exists = session
        .container(owning_container)?
        .owner(&target)
        .is_some();
    if !exists {
        if !create_if_absent {
            return Ok(None);
        }
        check_root_modification(session, &lineage)?;
        session
            .container_mut(owning_container)?
            .owners
            .push(PropertyOwner::new(target.clone()));
    }
    Ok(session.container(owning_container)?.owner(&target))
}

/// Record one property on the component's owner in `owning_container`
///
/// A property of the same kind already on that owner is replaced in place
/// and keeps its id.
///
/// # Errors
/// Same as `find_or_create_property_owner`.
pub fn set_property(
    session: &mut Session,
    component: ComponentId,
    owning_container: ContainerId,
    value: PropertyValue,
) -> Result<PropertyId> {
    session.require_active(owning_container)?;
    let lineage = lineage(session, component)?;
    let target = relative_target(&lineage, component, owning_container)?;
    check_root_modification(session, &lineage)?;

    let kind = value.kind();
    let fresh = session.next_property_id();
    let record = session.container_mut(owning_container)?;
    let owner_index = match record.owners.iter().position(|o| o.target == target) {
        Some(index) => index,
        None => {
            record.owners.push(PropertyOwner::new(target));
            record.owners.len() - 1
        }
    };
    let owner = &mut record.owners[owner_index];
    let id = match owner.properties.iter_mut().find(|p| p.value.kind() == kind) {
        Some(existing) => {
            existing.value = value;
            existing.id
        }
        None => {
            owner.properties.push(Property { id: fresh, value });
            fresh
        }
    };

    session.property_index.insert(id, owning_container);
    session.note_change(severity_of(&kind));
    Ok(id)
}

/// Remove a single property
///
/// The owner record goes too once it is empty.
///
/// # Errors
/// * `PropertyNotFound` - Unknown property
/// * `WrongContext` - The recording container's log is not active
pub fn remove_property(session: &mut Session, property: PropertyId) -> Result<()> {
    let container = *session
        .property_index
        .get(&property)
        .ok_or(AsmError::PropertyNotFound {
            property_id: property,
        })?;
    session.require_active(container)?;

    let record = session.container_mut(container)?;
    let mut removed = None;
    for owner in &mut record.owners {
        if let Some(pos) = owner.properties.iter().position(|p| p.id == property) {
            removed = Some(owner.properties.remove(pos).value.kind());
            break;
        }
    }
    record.owners.retain(|o| !o.is_empty());
    let kind = removed.ok_or(AsmError::PropertyNotFound {
        property_id: property,
    })?;

    session.property_index.remove(&property);
    session.note_change(severity_of(&kind));
    Ok(())
}

/// Every owner applying to the component, in precedence order
pub fn property_owners(
    session: &Session,
    component: ComponentId,
) -> Result<Vec<(ContainerId, &PropertyOwner)>> {
    owners_in_precedence(session, &lineage(session, component)?)
}

fn owners_in_precedence<'s>(
    session: &'s Session,
    lineage: &Lineage,
) -> Result<Vec<(ContainerId, &'s PropertyOwner)>> {
    let mut owners = Vec::new();
    for (i, k) in lineage.precedence() {
        let container = lineage.containers[i];
        if let Some(owner) = session.container(container)?.owner(&lineage.edges[i..k]) {
            owners.push((container, owner));
        }
    }
    Ok(owners)
}

/// Winning property of `kind` for the component, if any
pub fn effective_property(
    session: &Session,
    component: ComponentId,
    kind: &PropertyKind,
) -> Result<Option<EffectiveProperty>> {
    for (container, owner) in property_owners(session, component)? {
        if let Some(property) = owner.find(kind) {
            return Ok(Some(EffectiveProperty {
                property: property.clone(),
                recorded_in: container,
                target: owner.target.clone(),
            }));
        }
    }
    Ok(None)
}

/// Effective custom attributes, by name
pub fn custom_properties(
    session: &Session,
    component: ComponentId,
) -> Result<BTreeMap<String, serde_json::Value>> {
    let mut custom = BTreeMap::new();
    for (_, owner) in property_owners(session, component)? {
        for property in &owner.properties {
            if let PropertyValue::Custom { name, value } = &property.value {
                custom.entry(name.clone()).or_insert_with(|| value.clone());
            }
        }
    }
    Ok(custom)
}

/// Where `kind` is recorded relative to the component
pub fn has_property(
    session: &Session,
    component: ComponentId,
    kind: &PropertyKind,
) -> Result<PropertyFlags> {
    let lineage = lineage(session, component)?;
    let n = lineage.edges.len();
    let mut flags = PropertyFlags::default();

    for (i, container) in lineage.containers.iter().enumerate() {
        let relative = &lineage.edges[i..];
        for owner in &session.container(*container)?.owners {
            if owner.find(kind).is_none() {
                continue;
            }
            if owner.target == relative {
                flags.component_mods = true;
            } else if owner.target.len() > relative.len() && owner.target.starts_with(relative) {
                flags.child_mods = true;
            } else if relative.starts_with(&owner.target) {
                flags.parent_mods = true;
            }
        }
    }

    if !flags.child_mods {
        let end = lineage.containers[n];
        flags.child_mods = reachable_containers(session, &[end])
            .into_iter()
            .skip(1)
            .filter_map(|c| session.containers.get(&c))
            .any(|record| record.owners.iter().any(|o| o.find(kind).is_some()));
    }
    Ok(flags)
}

fn flag(session: &Session, component: ComponentId, kind: PropertyKind) -> Result<bool> {
    Ok(effective_property(session, component, &kind)?
        .and_then(|e| e.property.value.as_flag())
        .unwrap_or(false))
}

/// Suppression of a path that may not have a component record yet
pub(crate) fn is_path_suppressed(session: &Session, path: &ComponentPath) -> Result<bool> {
    let lineage = path_lineage(session, path)?;
    for (_, owner) in owners_in_precedence(session, &lineage)? {
        if let Some(property) = owner.find(&PropertyKind::Suppress) {
            return Ok(property.value.as_flag().unwrap_or(false));
        }
    }
    Ok(false)
}

pub fn is_suppressed(session: &Session, component: ComponentId) -> Result<bool> {
    flag(session, component, PropertyKind::Suppress)
}

pub fn is_hidden(session: &Session, component: ComponentId) -> Result<bool> {
    flag(session, component, PropertyKind::Hide)
}

fn record_in_root(
    session: &mut Session,
    component: ComponentId,
    value: PropertyValue,
) -> Result<PropertyId> {
    let root = live_component(session, component)?.path.root;
    set_property(session, component, root, value)
}

/// Suppress the component, recording in its root container
///
/// Suppressed components and their whole subtrees drop out of default
/// tree walks.
pub fn suppress(session: &mut Session, component: ComponentId) -> Result<PropertyId> {
    record_in_root(session, component, PropertyValue::Suppress(true))
}

pub fn unsuppress(session: &mut Session, component: ComponentId) -> Result<PropertyId> {
    record_in_root(session, component, PropertyValue::Suppress(false))
}

pub fn hide(session: &mut Session, component: ComponentId) -> Result<PropertyId> {
    record_in_root(session, component, PropertyValue::Hide(true))
}

pub fn unhide(session: &mut Session, component: ComponentId) -> Result<PropertyId> {
    record_in_root(session, component, PropertyValue::Hide(false))
}
