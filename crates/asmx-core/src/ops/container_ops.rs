use asmx_core_types::{ContainerId, ContentId, LogId};

use super::session::{ContainerRecord, Session};
use crate::errors::{AsmError, Result};
use crate::history::HistoryLog;
use crate::lifecycle::use_count::{ContainerHandle, Hold, UseCell};
use crate::manager::{ChangeSeverity, ContainerManager, DefaultManager, ManagerKind};
use crate::model::{ContentObject, CustomerInfo, COMPOSITE_ROOT_KIND};

/// Create a container with a default manager and a fresh log
///
/// The returned handle is the only holder; dropping it makes the container
/// eligible for the next sweep.
///
/// # Errors
/// * `InvalidUnitScale` - `info.mm_per_unit` is not a finite positive length
pub fn create_container(session: &mut Session, info: CustomerInfo) -> Result<ContainerHandle> {
    create_container_with(
        session,
        ManagerKind::Default(DefaultManager::new()),
        info,
        None,
    )
}

/// Create a container with an explicit manager kind
///
/// # Arguments
/// * `kind` - Manager implementation
/// * `info` - Customer info block
/// * `share_log_with` - Put the new container's content into this
///   container's log instead of a fresh one
///
/// # Errors
/// * `InvalidUnitScale` - `info.mm_per_unit` is not a finite positive length
/// * `ContainerNotFound` / `StaleContainer` - `share_log_with` is unknown
pub fn create_container_with(
    session: &mut Session,
    kind: ManagerKind,
    info: CustomerInfo,
    share_log_with: Option<ContainerId>,
) -> Result<ContainerHandle> {
    info.validate()?;
    let log = match share_log_with {
        Some(other) => session.container(other)?.manager.log,
        None => new_log(session),
    };
    Ok(insert_container(session, kind, info, log))
}

pub(crate) fn new_log(session: &mut Session) -> LogId {
    let id = session.next_log_id();
    session.logs.insert(id, HistoryLog::new(id));
    id
}

pub(crate) fn insert_container(
    session: &mut Session,
    kind: ManagerKind,
    info: CustomerInfo,
    log: LogId,
) -> ContainerHandle {
    let id = session.next_container_id();
    let uses = UseCell::new();
    let handle = Hold::acquire(id, &uses);
    if let Some(history) = session.logs.get_mut(&log) {
        history.members.insert(id);
    }
    session.containers.insert(
        id,
        ContainerRecord {
            id,
            manager: ContainerManager::new(kind, info, log),
            uses,
            edges: Vec::new(),
            owners: Vec::new(),
        },
    );
    tracing::debug!(container_id = id.raw(), log_id = log.raw(), "container created");
    handle
}

/// Acquire another holder on an existing container
pub fn container_handle(session: &Session, container: ContainerId) -> Result<ContainerHandle> {
    let record = session.container(container)?;
    Ok(Hold::acquire(container, &record.uses))
}

/// Give a container its composite root
///
/// The root is held by the manager and sits outside the undo stream.
///
/// # Errors
/// * `WrongContext` - The container's log is not active
/// * `DuplicateCompositeRoot` - The container already has one
pub fn create_composite_root(session: &mut Session, container: ContainerId) -> Result<ContentId> {
    session.require_active(container)?;
    if session.container(container)?.manager.has_composite_root() {
        return Err(AsmError::DuplicateCompositeRoot {
            container_id: container,
        });
    }

    let id = session.next_content_id();
    session.log_of_mut(container)?.insert_pinned(ContentObject::new(
        id,
        container,
        COMPOSITE_ROOT_KIND,
        None,
    ));
    session
        .container_mut(container)?
        .manager
        .set_composite_root(id);
    session.note_change(ChangeSeverity::Geometric);
    Ok(id)
}

/// Create a content object in `container`
///
/// # Errors
/// * `WrongContext` - The container's log is not active
/// * `ContentNotFound` - `owner` is not live
/// * `NotOwned` - `owner` belongs to another container
pub fn create_content(
    session: &mut Session,
    container: ContainerId,
    kind: &str,
    owner: Option<ContentId>,
) -> Result<ContentId> {
    session.require_active(container)?;
    if let Some(owner_id) = owner {
        let log = session.log_of(container)?;
        let owner_obj = log
            .live(owner_id)
            .ok_or(AsmError::ContentNotFound {
                content_id: owner_id,
            })?;
        if owner_obj.container != container {
            return Err(AsmError::NotOwned {
                container_id: container,
                content_id: owner_id,
            });
        }
    }

    let id = session.next_content_id();
    session
        .log_of_mut(container)?
        .create(ContentObject::new(id, container, kind, owner));
    session.note_change(ChangeSeverity::Geometric);
    Ok(id)
}

/// Delete a content object and everything it owns
///
/// Returns the ids that were live and are now deleted.
///
/// # Errors
/// * `WrongContext` - The container's log is not active
/// * `ContentNotFound` - The object is not live
/// * `NotOwned` - The object belongs to another container, or is the
///   manager-held composite root
pub fn delete_content(
    session: &mut Session,
    container: ContainerId,
    content: ContentId,
) -> Result<Vec<ContentId>> {
    session.require_active(container)?;
    let log = session.log_of(container)?;
    let record = log
        .get(content)
        .filter(|r| r.live)
        .ok_or(AsmError::ContentNotFound {
            content_id: content,
        })?;
    if record.object.container != container || record.pinned {
        return Err(AsmError::NotOwned {
            container_id: container,
            content_id: content,
        });
    }

    let deleted = session.log_of_mut(container)?.delete(content);
    session.note_change(ChangeSeverity::Geometric);
    Ok(deleted)
}

/// Live top-level content of a container, in creation order
///
/// The composite root is not included.
pub fn owned_content(session: &Session, container: ContainerId) -> Result<Vec<ContentId>> {
    Ok(session.log_of(container)?.top_level_of(container))
}

/// Undo up to `steps` committed states of the container's log
///
/// # Errors
/// * `NothingToUndo` - The log is already at its first state
pub fn roll_back(session: &mut Session, container: ContainerId, steps: usize) -> Result<usize> {
    let log = session.log_of_mut(container)?;
    log.note_state();
    if log.cursor() == 0 {
        return Err(AsmError::NothingToUndo {
            container_id: container,
        });
    }
    let undone = log.roll_back(steps);
    notify_members(session, container, ChangeSeverity::Geometric)?;
    tracing::debug!(container_id = container.raw(), undone, "rolled back");
    Ok(undone)
}

/// Redo up to `steps` states of the container's log
///
/// # Errors
/// * `NothingToRedo` - No undone states remain
pub fn roll_forward(session: &mut Session, container: ContainerId, steps: usize) -> Result<usize> {
    let log = session.log_of_mut(container)?;
    if log.cursor() >= log.state_count() {
        return Err(AsmError::NothingToRedo {
            container_id: container,
        });
    }
    let redone = log.roll_forward(steps);
    notify_members(session, container, ChangeSeverity::Geometric)?;
    tracing::debug!(container_id = container.raw(), redone, "rolled forward");
    Ok(redone)
}

/// Every container sharing a log with `container`, itself included
///
/// Best-effort: `None` when the container or its log cannot be found, in
/// which case callers fall back to scanning all containers.
pub fn containers_sharing_history(
    session: &Session,
    container: ContainerId,
) -> Option<Vec<ContainerId>> {
    let log = session.log_of(container).ok()?;
    Some(log.members().collect())
}

fn notify_members(
    session: &mut Session,
    container: ContainerId,
    severity: ChangeSeverity,
) -> Result<()> {
    let members: Vec<ContainerId> = session.log_of(container)?.members().collect();
    for member in members {
        if let Some(record) = session.containers.get_mut(&member) {
            record.manager.notify(severity);
        }
    }
    Ok(())
}
