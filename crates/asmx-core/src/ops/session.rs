use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use asmx_core_types::{
    ComponentId, ContainerId, ContentId, EdgeId, IdAllocator, LogId, PropertyId, ProxyId,
};

use crate::errors::{AsmError, Result};
use crate::history::HistoryLog;
use crate::lifecycle::use_count::{ContainerHandle, ReapQueue, UseCell};
use crate::manager::{ChangeSeverity, ContainerManager};
use crate::model::{ComponentPath, PropertyOwner, RigidTransform};
use crate::render::RenderBridge;

/// A container and everything the session records against it
#[derive(Debug)]
pub struct ContainerRecord {
    pub(crate) id: ContainerId,
    pub(crate) manager: ContainerManager,
    pub(crate) uses: Rc<UseCell>,
    /// Outgoing reference edges in sibling order
    pub(crate) edges: Vec<EdgeId>,
    /// Property owners recorded in this container
    pub(crate) owners: Vec<PropertyOwner>,
}

impl ContainerRecord {
    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn manager(&self) -> &ContainerManager {
        &self.manager
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn owners(&self) -> &[PropertyOwner] {
        &self.owners
    }

    pub fn use_count(&self) -> usize {
        self.uses.count()
    }

    pub(crate) fn owner(&self, target: &[EdgeId]) -> Option<&PropertyOwner> {
        self.owners.iter().find(|o| o.target == target)
    }
}

/// Directed, transform-carrying instancing link
///
/// The edge holds its target container for as long as it exists.
#[derive(Debug)]
pub struct ReferenceEdge {
    pub(crate) id: EdgeId,
    pub(crate) source: ContainerId,
    pub(crate) target: ContainerHandle,
    pub(crate) transform: RigidTransform,
}

impl ReferenceEdge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Container whose composite root owns the edge
    pub fn source(&self) -> ContainerId {
        self.source
    }

    pub fn target(&self) -> ContainerId {
        self.target.id()
    }

    pub fn transform(&self) -> &RigidTransform {
        &self.transform
    }
}

/// Canonical component proxy record
#[derive(Debug)]
pub struct ComponentRecord {
    pub(crate) id: ComponentId,
    pub(crate) path: ComponentPath,
    pub(crate) uses: Rc<UseCell>,
    /// Keeps the root container alive while the component exists
    pub(crate) root: ContainerHandle,
}

impl ComponentRecord {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    pub fn root(&self) -> ContainerId {
        self.root.id()
    }

    pub fn use_count(&self) -> usize {
        self.uses.count()
    }
}

/// Content proxy (entity handle) record
#[derive(Debug)]
pub struct ProxyRecord {
    pub(crate) id: ProxyId,
    pub(crate) container: ContainerId,
    pub(crate) content: ContentId,
    pub(crate) log: LogId,
    pub(crate) uses: Rc<UseCell>,
    /// Set once the owning container is torn down; never cleared
    pub(crate) released: bool,
}

impl ProxyRecord {
    pub fn id(&self) -> ProxyId {
        self.id
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn content(&self) -> ContentId {
        self.content
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn use_count(&self) -> usize {
        self.uses.count()
    }
}

/// One level of the nested activation stack
#[derive(Debug, Clone)]
pub(crate) struct ContextFrame {
    pub(crate) token: u64,
    pub(crate) container: ContainerId,
    pub(crate) log: LogId,
    pub(crate) severity: ChangeSeverity,
}

#[derive(Debug, Default)]
pub(crate) struct Allocators {
    pub(crate) container: IdAllocator,
    pub(crate) content: IdAllocator,
    pub(crate) edge: IdAllocator,
    pub(crate) component: IdAllocator,
    pub(crate) proxy: IdAllocator,
    pub(crate) property: IdAllocator,
    pub(crate) log: IdAllocator,
    pub(crate) token: IdAllocator,
}

/// In-memory state of the composition subsystem
///
/// Single-threaded by construction (`Rc` use counts). Every operation lives
/// in `ops`, `traversal`, `lifecycle` and `render` as free functions taking
/// the session; the session itself only offers lookups.
pub struct Session {
    pub(crate) containers: BTreeMap<ContainerId, ContainerRecord>,
    /// Containers that existed once and were swept
    pub(crate) released: BTreeSet<ContainerId>,
    pub(crate) logs: BTreeMap<LogId, HistoryLog>,
    pub(crate) edges: BTreeMap<EdgeId, ReferenceEdge>,
    pub(crate) components: BTreeMap<ComponentId, ComponentRecord>,
    pub(crate) memo: HashMap<ComponentPath, ComponentId>,
    pub(crate) proxies: BTreeMap<ProxyId, ProxyRecord>,
    pub(crate) proxy_index: HashMap<(ContainerId, ContentId), ProxyId>,
    pub(crate) property_index: HashMap<PropertyId, ContainerId>,
    pub(crate) context: Vec<ContextFrame>,
    pub(crate) reap_queue: ReapQueue,
    pub(crate) render: Option<Box<dyn RenderBridge>>,
    pub(crate) ids: Allocators,
}

impl Session {
    pub fn new() -> Self {
        Self {
            containers: BTreeMap::new(),
            released: BTreeSet::new(),
            logs: BTreeMap::new(),
            edges: BTreeMap::new(),
            components: BTreeMap::new(),
            memo: HashMap::new(),
            proxies: BTreeMap::new(),
            proxy_index: HashMap::new(),
            property_index: HashMap::new(),
            context: Vec::new(),
            reap_queue: Rc::new(RefCell::new(Vec::new())),
            render: None,
            ids: Allocators::default(),
        }
    }

    /// Get a container record
    ///
    /// # Errors
    /// * `StaleContainer` - The container existed but was swept
    /// * `ContainerNotFound` - The id was never allocated here
    pub fn container(&self, id: ContainerId) -> Result<&ContainerRecord> {
        match self.containers.get(&id) {
            Some(record) => Ok(record),
            None => Err(self.missing_container(id)),
        }
    }

    pub(crate) fn container_mut(&mut self, id: ContainerId) -> Result<&mut ContainerRecord> {
        if !self.containers.contains_key(&id) {
            return Err(self.missing_container(id));
        }
        self.containers
            .get_mut(&id)
            .ok_or(AsmError::ContainerNotFound { container_id: id })
    }

    fn missing_container(&self, id: ContainerId) -> AsmError {
        if self.released.contains(&id) {
            AsmError::StaleContainer { container_id: id }
        } else {
            AsmError::ContainerNotFound { container_id: id }
        }
    }

    pub fn manager(&self, id: ContainerId) -> Result<&ContainerManager> {
        Ok(&self.container(id)?.manager)
    }

    pub fn contains_container(&self, id: ContainerId) -> bool {
        self.containers.contains_key(&id)
    }

    pub fn is_released(&self, id: ContainerId) -> bool {
        self.released.contains(&id)
    }

    pub fn container_ids(&self) -> Vec<ContainerId> {
        self.containers.keys().copied().collect()
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    pub fn log(&self, id: LogId) -> Option<&HistoryLog> {
        self.logs.get(&id)
    }

    /// History log of a container
    pub fn log_of(&self, container: ContainerId) -> Result<&HistoryLog> {
        let log = self.container(container)?.manager.log;
        self.logs.get(&log).ok_or_else(|| AsmError::Internal {
            message: format!("{container} points at missing {log}"),
        })
    }

    pub(crate) fn log_of_mut(&mut self, container: ContainerId) -> Result<&mut HistoryLog> {
        let log = self.container(container)?.manager.log;
        self.logs.get_mut(&log).ok_or_else(|| AsmError::Internal {
            message: format!("{container} points at missing {log}"),
        })
    }

    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    pub fn edge(&self, id: EdgeId) -> Result<&ReferenceEdge> {
        self.edges
            .get(&id)
            .ok_or(AsmError::EdgeNotFound { edge_id: id })
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn component(&self, id: ComponentId) -> Result<&ComponentRecord> {
        self.components
            .get(&id)
            .ok_or(AsmError::ComponentNotFound { component_id: id })
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn proxy(&self, id: ProxyId) -> Result<&ProxyRecord> {
        self.proxies
            .get(&id)
            .ok_or(AsmError::ProxyNotFound { proxy_id: id })
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    /// Container whose log is currently active, if any
    pub fn active_container(&self) -> Option<ContainerId> {
        self.context.last().map(|f| f.container)
    }

    pub fn context_depth(&self) -> usize {
        self.context.len()
    }

    /// Attach the rendering bridge requests are forwarded to
    pub fn set_render_bridge(&mut self, bridge: Box<dyn RenderBridge>) {
        self.render = Some(bridge);
    }

    pub fn take_render_bridge(&mut self) -> Option<Box<dyn RenderBridge>> {
        self.render.take()
    }

    /// Fail unless `container`'s log is the active one
    pub(crate) fn require_active(&self, container: ContainerId) -> Result<()> {
        let log = self.container(container)?.manager.log;
        match self.context.last() {
            Some(frame) if frame.log == log => Ok(()),
            other => Err(AsmError::WrongContext {
                container_id: container,
                active: other.map(|f| f.container),
            }),
        }
    }

    /// Raise the severity reported when the innermost bracket closes
    pub(crate) fn note_change(&mut self, severity: ChangeSeverity) {
        if let Some(frame) = self.context.last_mut() {
            frame.severity = frame.severity.max(severity);
        }
    }

    /// True while any bracket is open on `container`
    pub(crate) fn in_any_context(&self, container: ContainerId) -> bool {
        self.context.iter().any(|f| f.container == container)
    }

    pub(crate) fn next_container_id(&mut self) -> ContainerId {
        ContainerId::from_raw(self.ids.container.next_raw())
    }

    pub(crate) fn next_content_id(&mut self) -> ContentId {
        ContentId::from_raw(self.ids.content.next_raw())
    }

    pub(crate) fn next_edge_id(&mut self) -> EdgeId {
        EdgeId::from_raw(self.ids.edge.next_raw())
    }

    pub(crate) fn next_component_id(&mut self) -> ComponentId {
        ComponentId::from_raw(self.ids.component.next_raw())
    }

    pub(crate) fn next_proxy_id(&mut self) -> ProxyId {
        ProxyId::from_raw(self.ids.proxy.next_raw())
    }

    pub(crate) fn next_property_id(&mut self) -> PropertyId {
        PropertyId::from_raw(self.ids.property.next_raw())
    }

    pub(crate) fn next_log_id(&mut self) -> LogId {
        LogId::from_raw(self.ids.log.next_raw())
    }

    pub(crate) fn next_token(&mut self) -> u64 {
        self.ids.token.next_raw()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("containers", &self.containers.len())
            .field("logs", &self.logs.len())
            .field("edges", &self.edges.len())
            .field("components", &self.components.len())
            .field("proxies", &self.proxies.len())
            .field("context_depth", &self.context.len())
            .finish()
    }
}
