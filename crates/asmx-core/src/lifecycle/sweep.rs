//! Unneeded-object sweeps
//!
//! A sweep pass is planned from a snapshot of the use counts and then
//! committed; passes repeat until one deletes nothing. Nothing with a
//! non-zero count is ever planned.

use std::collections::BTreeSet;
use std::time::Instant;

use asmx_core_types::{ComponentId, ContainerId, ProxyId};
use serde::{Deserialize, Serialize};

use crate::errors::{AsmError, Result};
use crate::ops::content_ops::release_owning_container;
use crate::ops::reference_ops::{purge_owners_through, reachable_containers};
use crate::ops::Session;
use crate::{log_op_end, log_op_error, log_op_start};

/// Sweep tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupOptions {
    pub sweep_content_proxies: bool,
    pub sweep_components: bool,
    /// Upper bound on passes; hitting it is an internal error
    pub max_passes: usize,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            sweep_content_proxies: true,
            sweep_components: true,
            max_passes: 64,
        }
    }
}

/// Which containers a sweep may touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupScope {
    All,
    Containers(Vec<ContainerId>),
}

impl CleanupScope {
    fn contains(&self, id: ContainerId) -> bool {
        match self {
            CleanupScope::All => true,
            CleanupScope::Containers(ids) => ids.contains(&id),
        }
    }
}

/// What a sweep deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Passes that deleted something
    pub passes: usize,
    pub containers_deleted: usize,
    pub content_proxies_deleted: usize,
    pub components_deleted: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.containers_deleted + self.content_proxies_deleted + self.components_deleted
    }
}

#[derive(Debug, Default)]
struct SweepPlan {
    containers: Vec<ContainerId>,
    proxies: Vec<ProxyId>,
    components: Vec<ComponentId>,
}

impl SweepPlan {
    fn is_empty(&self) -> bool {
        self.containers.is_empty() && self.proxies.is_empty() && self.components.is_empty()
    }
}

fn plan_sweep(session: &Session, scope: &CleanupScope, options: &CleanupOptions) -> SweepPlan {
    let containers: Vec<ContainerId> = session
        .containers
        .values()
        .filter(|r| scope.contains(r.id) && r.uses.is_unneeded() && !session.in_any_context(r.id))
        .map(|r| r.id)
        .collect();
    let doomed: BTreeSet<ContainerId> = containers.iter().copied().collect();

    let proxies = if options.sweep_content_proxies {
        session
            .proxies
            .values()
            .filter(|p| p.uses.is_unneeded() && scope.contains(p.container))
            .filter(|p| !doomed.contains(&p.container))
            .map(|p| p.id)
            .collect()
    } else {
        Vec::new()
    };

    let components = if options.sweep_components {
        session
            .components
            .values()
            .filter(|c| c.uses.is_unneeded() && scope.contains(c.root()))
            .map(|c| c.id)
            .collect()
    } else {
        Vec::new()
    };

    SweepPlan {
        containers,
        proxies,
        components,
    }
}

fn commit_plan(session: &mut Session, plan: SweepPlan, report: &mut CleanupReport) {
    for id in plan.components {
        if let Some(record) = session.components.remove(&id) {
            session.memo.remove(&record.path);
            report.components_deleted += 1;
        }
    }
    for id in plan.proxies {
        if let Some(record) = session.proxies.remove(&id) {
            let key = (record.container, record.content);
            if session.proxy_index.get(&key) == Some(&id) {
                session.proxy_index.remove(&key);
            }
            report.content_proxies_deleted += 1;
        }
    }
    for id in plan.containers {
        if session.containers.contains_key(&id) {
            report.content_proxies_deleted += delete_container(session, id);
            report.containers_deleted += 1;
        }
    }
}

/// Sweep unneeded containers, content proxies and components to a fixed point
///
/// Safe to call at any point; a second call right after the first deletes
/// nothing.
///
/// # Errors
/// * `Internal` - `max_passes` reached without converging
pub fn cleanup(
    session: &mut Session,
    scope: &CleanupScope,
    options: &CleanupOptions,
) -> Result<CleanupReport> {
    let start = Instant::now();
    log_op_start!("cleanup");
    match sweep(session, scope, options) {
        Ok(report) => {
            log_op_end!(
                "cleanup",
                start,
                containers_deleted = report.containers_deleted,
                components_deleted = report.components_deleted,
            );
            Ok(report)
        }
        Err(err) => {
            log_op_error!("cleanup", start, err.clone());
            Err(err)
        }
    }
}

fn sweep(
    session: &mut Session,
    scope: &CleanupScope,
    options: &CleanupOptions,
) -> Result<CleanupReport> {
    let mut report = CleanupReport {
        containers_deleted: reap_armed(session),
        ..CleanupReport::default()
    };
    loop {
        let plan = plan_sweep(session, scope, options);
        if plan.is_empty() {
            return Ok(report);
        }
        if report.passes >= options.max_passes {
            return Err(AsmError::Internal {
                message: format!("sweep did not converge in {} passes", options.max_passes),
            });
        }
        commit_plan(session, plan, &mut report);
        report.passes += 1;
        tracing::debug!(pass = report.passes, deleted = report.total(), "sweep pass");
    }
}

/// Sweep a whole subtree
///
/// Visits every container reachable from `roots` and sweeps them as one
/// scope. With `force_clear`, each visited container's log is emptied first
/// and the container is armed: it is deleted as soon as its count reaches
/// zero, at the next operation boundary, without another explicit sweep.
///
/// # Errors
/// * `ContainerNotFound` / `StaleContainer` - A root is not live
pub fn cleanup_tree(
    session: &mut Session,
    roots: &[ContainerId],
    force_clear: bool,
    options: &CleanupOptions,
) -> Result<CleanupReport> {
    let start = Instant::now();
    log_op_start!("cleanup_tree", root_count = roots.len());
    let result = sweep_tree(session, roots, force_clear, options);
    match &result {
        Ok(report) => {
            log_op_end!(
                "cleanup_tree",
                start,
                containers_deleted = report.containers_deleted,
            );
        }
        Err(err) => {
            log_op_error!("cleanup_tree", start, err.clone());
        }
    }
    result
}

fn sweep_tree(
    session: &mut Session,
    roots: &[ContainerId],
    force_clear: bool,
    options: &CleanupOptions,
) -> Result<CleanupReport> {
    for root in roots {
        session.container(*root)?;
    }
    let visited = reachable_containers(session, roots);

    if force_clear {
        let queue = session.reap_queue.clone();
        let mut cleared = BTreeSet::new();
        for id in &visited {
            let Some(record) = session.containers.get(id) else {
                continue;
            };
            record.uses.arm(*id, &queue);
            let log = record.manager.log;
            if cleared.insert(log) {
                if let Some(history) = session.logs.get_mut(&log) {
                    history.clear();
                }
            }
        }
    }

    sweep(session, &CleanupScope::Containers(visited), options)
}

/// Delete armed containers whose count dropped to zero
///
/// Containers still inside an open bracket stay queued for a later
/// boundary. Returns how many containers were deleted.
pub(crate) fn reap_armed(session: &mut Session) -> usize {
    let mut deleted = 0;
    let mut deferred = BTreeSet::new();
    loop {
        let pending = std::mem::take(&mut *session.reap_queue.borrow_mut());
        if pending.is_empty() {
            break;
        }
        for id in pending {
            let ready = session
                .containers
                .get(&id)
                .is_some_and(|r| r.uses.is_unneeded() && r.uses.is_armed());
            if !ready {
                continue;
            }
            if session.in_any_context(id) {
                deferred.insert(id);
            } else {
                delete_container(session, id);
                deleted += 1;
            }
        }
    }
    session.reap_queue.borrow_mut().extend(deferred);
    deleted
}

/// Tear down one container
///
/// Its edges go (releasing their targets), its proxies are decoupled and
/// the unheld ones deleted, and its content leaves the shared log. The log
/// itself goes once no container uses it. Returns the number of proxies
/// deleted.
pub(crate) fn delete_container(session: &mut Session, id: ContainerId) -> usize {
    let Some(record) = session.containers.remove(&id) else {
        return 0;
    };
    session.released.insert(id);

    for edge in &record.edges {
        session.edges.remove(edge);
    }
    purge_owners_through(session, &record.edges);
    session.property_index.retain(|_, c| *c != id);

    release_owning_container(session, id);
    let unheld: Vec<ProxyId> = session
        .proxies
        .values()
        .filter(|p| p.container == id && p.uses.is_unneeded())
        .map(|p| p.id)
        .collect();
    for proxy in &unheld {
        session.proxies.remove(proxy);
    }

    let log_id = record.manager.log;
    let log_empty = match session.logs.get_mut(&log_id) {
        Some(log) => {
            log.purge_container(id);
            log.members.remove(&id);
            log.members.is_empty()
        }
        None => false,
    };
    if log_empty {
        session.logs.remove(&log_id);
    }
    tracing::debug!(container_id = id.raw(), proxies = unheld.len(), "container deleted");
    unheld.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomerInfo;
    use crate::ops::container_ops::create_container;

    #[test]
    fn test_dropped_container_is_swept() {
        let mut session = Session::new();
        let part = create_container(&mut session, CustomerInfo::new("part")).unwrap();
        let id = part.id();
        drop(part);

        let report = cleanup(&mut session, &CleanupScope::All, &CleanupOptions::default()).unwrap();
        assert_eq!(report.containers_deleted, 1);
        assert!(session.is_released(id));
        assert_eq!(session.log_count(), 0);
    }

    #[test]
    fn test_scope_limits_sweep() {
        let mut session = Session::new();
        let a = create_container(&mut session, CustomerInfo::new("a")).unwrap().id();
        let b = create_container(&mut session, CustomerInfo::new("b")).unwrap().id();

        let scope = CleanupScope::Containers(vec![a]);
        cleanup(&mut session, &scope, &CleanupOptions::default()).unwrap();
        assert!(!session.contains_container(a));
        assert!(session.contains_container(b));
    }

    #[test]
    fn test_zero_passes_is_internal_error() {
        let mut session = Session::new();
        drop(create_container(&mut session, CustomerInfo::new("a")).unwrap());
        let options = CleanupOptions {
            max_passes: 0,
            ..CleanupOptions::default()
        };
        let err = cleanup(&mut session, &CleanupScope::All, &options).unwrap_err();
        assert!(matches!(err, AsmError::Internal { .. }));
    }
}
