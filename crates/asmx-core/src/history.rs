//! Reference history (undo/redo) log
//!
//! A log owns the content records of every container that shares it.
//! Changes accumulate in an open transaction; `note_state` closes the
//! transaction into a committed state, and rollback/rollforward move whole
//! states. A content object is live iff its creation is applied and its
//! deletion is not.

use std::collections::{BTreeMap, BTreeSet};

use asmx_core_types::{ContainerId, ContentId, LogId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ContentObject;

/// One recorded change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    Created(ContentId),
    Deleted(ContentId),
}

/// A committed group of changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    pub changes: Vec<Change>,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub object: ContentObject,
    pub live: bool,
    /// Pinned records sit outside the undo stream (composite roots)
    pub pinned: bool,
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    pub(crate) id: LogId,
    pub(crate) uuid: Uuid,
    pub(crate) records: BTreeMap<ContentId, ContentRecord>,
    pub(crate) states: Vec<HistoryState>,
    /// Number of states currently applied
    pub(crate) cursor: usize,
    pub(crate) open: Vec<Change>,
    pub(crate) members: BTreeSet<ContainerId>,
}

impl HistoryLog {
    pub fn new(id: LogId) -> Self {
        Self {
            id,
            uuid: Uuid::now_v7(),
            records: BTreeMap::new(),
            states: Vec::new(),
            cursor: 0,
            open: Vec::new(),
            members: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> LogId {
        self.id
    }

    /// Stable identity used to write shared logs once on save
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Containers whose content lives in this log
    pub fn members(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.members.iter().copied()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn states(&self) -> &[HistoryState] {
        &self.states
    }

    pub fn has_open_changes(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn get(&self, id: ContentId) -> Option<&ContentRecord> {
        self.records.get(&id)
    }

    /// Live object lookup; `None` once rolled out of existence
    pub fn live(&self, id: ContentId) -> Option<&ContentObject> {
        self.records
            .get(&id)
            .filter(|r| r.live)
            .map(|r| &r.object)
    }

    /// Follow the owner chain to the top-level object
    ///
    /// Returns `None` if the chain is broken.
    pub fn top_level_owner(&self, id: ContentId) -> Option<&ContentObject> {
        let mut current = self.records.get(&id)?;
        let mut guard = self.records.len();
        while let Some(owner) = current.object.owner {
            current = self.records.get(&owner)?;
            guard = guard.checked_sub(1)?;
        }
        Some(&current.object)
    }

    /// Live top-level objects of `container`, in creation order
    pub fn top_level_of(&self, container: ContainerId) -> Vec<ContentId> {
        self.records
            .values()
            .filter(|r| r.live && !r.pinned)
            .filter(|r| r.object.container == container && r.object.is_top_level())
            .map(|r| r.object.id)
            .collect()
    }

    /// Record creation of a new object in the open transaction
    pub fn create(&mut self, object: ContentObject) {
        self.discard_redo_tail();
        let id = object.id;
        self.records.insert(
            id,
            ContentRecord {
                object,
                live: true,
                pinned: false,
            },
        );
        self.open.push(Change::Created(id));
    }

    /// Insert an object outside the undo stream
    pub fn insert_pinned(&mut self, object: ContentObject) {
        self.records.insert(
            object.id,
            ContentRecord {
                object,
                live: true,
                pinned: true,
            },
        );
    }

    /// Record deletion of an object and everything it owns
    ///
    /// Returns the ids that went from live to dead. Already-dead objects are
    /// skipped.
    pub fn delete(&mut self, id: ContentId) -> Vec<ContentId> {
        self.discard_redo_tail();
        let mut doomed = vec![id];
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for record in self.records.values() {
                if record.live && record.object.owner == Some(current) {
                    doomed.push(record.object.id);
                    frontier.push(record.object.id);
                }
            }
        }

        let mut deleted = Vec::new();
        for victim in doomed {
            if let Some(record) = self.records.get_mut(&victim) {
                if record.live && !record.pinned {
                    record.live = false;
                    self.open.push(Change::Deleted(victim));
                    deleted.push(victim);
                }
            }
        }
        deleted
    }

    /// Close the open transaction into a committed state
    ///
    /// Returns false when there was nothing to commit.
    pub fn note_state(&mut self) -> bool {
        if self.open.is_empty() {
            return false;
        }
        self.discard_redo_tail();
        let changes = std::mem::take(&mut self.open);
        self.states.push(HistoryState {
            changes,
            committed_at: Utc::now(),
        });
        self.cursor = self.states.len();
        true
    }

    /// Undo up to `steps` committed states; returns how many were undone
    pub fn roll_back(&mut self, steps: usize) -> usize {
        self.note_state();
        let mut undone = 0;
        while undone < steps && self.cursor > 0 {
            self.cursor -= 1;
            let changes = self.states[self.cursor].changes.clone();
            for change in changes.iter().rev() {
                match *change {
                    Change::Created(id) => self.set_live(id, false),
                    Change::Deleted(id) => self.set_live(id, true),
                }
            }
            undone += 1;
        }
        undone
    }

    /// Redo up to `steps` states; returns how many were redone
    pub fn roll_forward(&mut self, steps: usize) -> usize {
        let mut redone = 0;
        while redone < steps && self.cursor < self.states.len() {
            let changes = self.states[self.cursor].changes.clone();
            for change in &changes {
                match *change {
                    Change::Created(id) => self.set_live(id, true),
                    Change::Deleted(id) => self.set_live(id, false),
                }
            }
            self.cursor += 1;
            redone += 1;
        }
        redone
    }

    /// Drop every state and every unpinned record
    pub fn clear(&mut self) {
        self.states.clear();
        self.open.clear();
        self.cursor = 0;
        self.records.retain(|_, r| r.pinned);
    }

    /// Remove every record belonging to `container`
    ///
    /// Changes referring to purged objects are dropped from history.
    pub fn purge_container(&mut self, container: ContainerId) {
        let purged: BTreeSet<ContentId> = self
            .records
            .values()
            .filter(|r| r.object.container == container)
            .map(|r| r.object.id)
            .collect();
        if purged.is_empty() {
            return;
        }
        self.records.retain(|id, _| !purged.contains(id));
        let keep = |c: &Change| match c {
            Change::Created(id) | Change::Deleted(id) => !purged.contains(id),
        };
        self.open.retain(keep);
        for state in &mut self.states {
            state.changes.retain(keep);
        }
    }

    fn set_live(&mut self, id: ContentId, live: bool) {
        if let Some(record) = self.records.get_mut(&id) {
            record.live = live;
        }
    }

    /// A new change after rollback invalidates the undone states
    fn discard_redo_tail(&mut self) {
        if self.cursor >= self.states.len() {
            return;
        }
        let discarded = self.states.split_off(self.cursor);
        for state in discarded {
            for change in state.changes {
                if let Change::Created(id) = change {
                    self.records.remove(&id);
                }
            }
        }
    }
}
