//! Persisted session document schema
//!
//! ## Schema Version
//!
//! Current document format version: **1**
//!
//! ## Layout
//!
//! - `format_version`: Schema version (currently 1)
//! - `created_at`: RFC3339 timestamp
//! - `include_history`: Whether log segments carry committed states
//! - `roots`: Containers the caller asked to save
//! - `logs`: One segment per log, shared logs written once
//! - `containers`: Every container reachable from `roots`
//!
//! Identifiers inside a document are only meaningful within it; restore
//! allocates fresh ones.

use asmx_core_types::{ContainerId, ContentId, EdgeId};
use serde::{Deserialize, Serialize};

use crate::history::{ContentRecord, HistoryState};
use crate::model::{CustomerInfo, PropertyOwner};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub format_version: u32,
    pub created_at: String,
    pub include_history: bool,
    pub roots: Vec<ContainerId>,
    pub logs: Vec<LogSegment>,
    pub containers: Vec<ContainerEntry>,
}

/// Content and (optionally) history of one log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSegment {
    pub records: Vec<ContentRecord>,
    /// Empty unless history is included
    pub states: Vec<HistoryState>,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub id: ContainerId,
    pub info: CustomerInfo,
    pub manager_kind: String,
    pub manager_payload: serde_json::Value,
    /// Index into `SessionDocument::logs`
    pub log: usize,
    pub composite_root: Option<ContentId>,
    /// Outgoing edges in sibling order
    pub edges: Vec<EdgeEntry>,
    pub owners: Vec<PropertyOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub id: EdgeId,
    pub target: ContainerId,
    /// Row-major homogeneous matrix
    pub transform: [[f64; 4]; 4],
}
