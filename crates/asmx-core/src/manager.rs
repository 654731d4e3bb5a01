//! Container managers
//!
//! One manager per container bridges the container to the customer object
//! that manages its content. The known kinds form a closed enum; anything
//! else plugs in through the `Extension` variant.

use std::any::Any;

use asmx_core_types::{ContentId, LogId};
use serde::{Deserialize, Serialize};

use crate::model::CustomerInfo;

/// Severity of a change reported when a context bracket closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeSeverity {
    NoChange,
    /// Only rendering state changed (visibility, custom display attributes)
    RenderOnly,
    /// Geometry or structure changed
    Geometric,
}

/// Customer-supplied manager behaviour
pub trait ManagerExtension: std::fmt::Debug {
    /// Implementation name, persisted alongside the payload
    fn kind_name(&self) -> &str;

    /// Called when a context bracket on the container closes
    fn on_change(&mut self, severity: ChangeSeverity);

    /// Opaque state persisted on save and handed back to the factory on
    /// restore
    fn payload(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn as_any(&self) -> &dyn Any;
}

/// Built-in manager: keeps per-severity change counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultManager {
    pub geometric_changes: u64,
    pub render_changes: u64,
    pub no_changes: u64,
}

impl DefaultManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, severity: ChangeSeverity) {
        match severity {
            ChangeSeverity::Geometric => self.geometric_changes += 1,
            ChangeSeverity::RenderOnly => self.render_changes += 1,
            ChangeSeverity::NoChange => self.no_changes += 1,
        }
    }
}

/// Concrete manager kinds
#[derive(Debug)]
pub enum ManagerKind {
    Default(DefaultManager),
    Extension(Box<dyn ManagerExtension>),
}

impl ManagerKind {
    /// Name persisted with the container
    pub fn kind_name(&self) -> &str {
        match self {
            ManagerKind::Default(_) => "default",
            ManagerKind::Extension(ext) => ext.kind_name(),
        }
    }
}

/// Manager of one container
///
/// The composite root is always held here, never by the customer object.
#[derive(Debug)]
pub struct ContainerManager {
    pub(crate) kind: ManagerKind,
    pub(crate) info: CustomerInfo,
    pub(crate) composite_root: Option<ContentId>,
    pub(crate) log: LogId,
    pub(crate) last_severity: Option<ChangeSeverity>,
}

impl ContainerManager {
    pub(crate) fn new(kind: ManagerKind, info: CustomerInfo, log: LogId) -> Self {
        Self {
            kind,
            info,
            composite_root: None,
            log,
            last_severity: None,
        }
    }

    pub fn kind(&self) -> &ManagerKind {
        &self.kind
    }

    pub fn as_default(&self) -> Option<&DefaultManager> {
        match &self.kind {
            ManagerKind::Default(manager) => Some(manager),
            ManagerKind::Extension(_) => None,
        }
    }

    pub fn as_extension(&self) -> Option<&dyn ManagerExtension> {
        match &self.kind {
            ManagerKind::Extension(ext) => Some(ext.as_ref()),
            ManagerKind::Default(_) => None,
        }
    }

    pub fn info(&self) -> &CustomerInfo {
        &self.info
    }

    pub fn has_composite_root(&self) -> bool {
        self.composite_root.is_some()
    }

    pub fn composite_root(&self) -> Option<ContentId> {
        self.composite_root
    }

    /// History log the container's content lives in
    pub fn log(&self) -> LogId {
        self.log
    }

    /// Severity reported by the most recent closed bracket
    pub fn last_severity(&self) -> Option<ChangeSeverity> {
        self.last_severity
    }

    pub(crate) fn set_composite_root(&mut self, root: ContentId) {
        self.composite_root = Some(root);
        self.info.has_composite_root = true;
    }

    pub(crate) fn notify(&mut self, severity: ChangeSeverity) {
        self.last_severity = Some(severity);
        match &mut self.kind {
            ManagerKind::Default(manager) => manager.record(severity),
            ManagerKind::Extension(ext) => ext.on_change(severity),
        }
    }
}
