use std::collections::{BTreeMap, BTreeSet};

use asmx_core_types::{ContainerId, ContentId, LogId};
use chrono::Utc;

use super::document::{ContainerEntry, EdgeEntry, LogSegment, SessionDocument, FORMAT_VERSION};
use crate::errors::{AsmError, Result};
use crate::history::{Change, HistoryLog, HistoryState};
use crate::manager::ManagerKind;
use crate::ops::reference_ops::reachable_containers;
use crate::ops::Session;

/// Build the document for `roots` and everything they reach
///
/// Each log is written once however many saved containers share it. Only
/// records of saved containers go into a segment.
///
/// # Errors
/// * `ContainerNotFound` / `StaleContainer` - A root is not live
pub fn export_document(
    session: &Session,
    roots: &[ContainerId],
    include_history: bool,
) -> Result<SessionDocument> {
    for root in roots {
        session.container(*root)?;
    }
    let saved = reachable_containers(session, roots);
    let saved_set: BTreeSet<ContainerId> = saved.iter().copied().collect();

    let mut log_index: BTreeMap<LogId, usize> = BTreeMap::new();
    let mut logs = Vec::new();
    let mut containers = Vec::with_capacity(saved.len());

    for id in &saved {
        let record = session.container(*id)?;
        let log_id = record.manager.log;
        let index = match log_index.get(&log_id) {
            Some(index) => *index,
            None => {
                let history = session.log(log_id).ok_or_else(|| AsmError::Internal {
                    message: format!("{id} points at missing {log_id}"),
                })?;
                logs.push(segment(history, &saved_set, include_history));
                log_index.insert(log_id, logs.len() - 1);
                logs.len() - 1
            }
        };

        let mut edges = Vec::with_capacity(record.edges.len());
        for edge_id in &record.edges {
            let edge = session.edge(*edge_id)?;
            let m = edge.transform.to_matrix();
            let mut rows = [[0.0; 4]; 4];
            for (r, row) in rows.iter_mut().enumerate() {
                for (c, value) in row.iter_mut().enumerate() {
                    *value = m[(r, c)];
                }
            }
            edges.push(EdgeEntry {
                id: edge.id,
                target: edge.target(),
                transform: rows,
            });
        }

        let manager = &record.manager;
        let manager_payload = match &manager.kind {
            ManagerKind::Default(_) => serde_json::Value::Null,
            ManagerKind::Extension(ext) => ext.payload(),
        };
        containers.push(ContainerEntry {
            id: *id,
            info: manager.info.clone(),
            manager_kind: manager.kind.kind_name().to_string(),
            manager_payload,
            log: index,
            composite_root: manager.composite_root,
            edges,
            owners: record.owners.clone(),
        });
    }

    Ok(SessionDocument {
        format_version: FORMAT_VERSION,
        created_at: Utc::now().to_rfc3339(),
        include_history,
        roots: roots.to_vec(),
        logs,
        containers,
    })
}

fn segment(history: &HistoryLog, saved: &BTreeSet<ContainerId>, include_history: bool) -> LogSegment {
    let records: Vec<_> = history
        .records
        .values()
        .filter(|r| saved.contains(&r.object.container))
        .filter(|r| include_history || r.live)
        .cloned()
        .collect();
    if !include_history {
        return LogSegment {
            records,
            states: Vec::new(),
            cursor: 0,
        };
    }

    let kept: BTreeSet<ContentId> = records.iter().map(|r| r.object.id).collect();
    let states = history
        .states
        .iter()
        .map(|state| HistoryState {
            changes: state
                .changes
                .iter()
                .filter(|c| match c {
                    Change::Created(id) | Change::Deleted(id) => kept.contains(id),
                })
                .copied()
                .collect(),
            committed_at: state.committed_at,
        })
        .collect();
    LogSegment {
        records,
        states,
        cursor: history.cursor,
    }
}
