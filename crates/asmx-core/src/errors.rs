use asmx_core_types::{ComponentId, ContainerId, ContentId, EdgeId, PropertyId, ProxyId};
use thiserror::Error;

/// Result type alias using AsmError
pub type Result<T> = std::result::Result<T, AsmError>;

// ========== Error Facility ==========

/// Coarse error category
///
/// Every kind belongs to exactly one category. Callers that only need to
/// know whether a failure was structural, a context violation, an ownership
/// violation or a plain absence can match on this instead of the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Structural,
    Context,
    Ownership,
    NotFound,
    Io,
    Internal,
}

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and external responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural
    InvalidInput,
    InvalidTransform,
    InvalidUnitScale,
    NotAnAssembly,
    UnreachablePath,
    NoCommonRoot,
    CycleDetected,
    RootComponentModification,
    ContainerNotOnPath,

    // Context
    WrongContext,
    NotInContext,
    StaleContainer,
    StaleComponent,

    // Ownership
    NotOwned,
    AlreadyExists,

    // Not found
    NotFound,
    NothingToUndo,
    NothingToRedo,
    FactoryMissing,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidTransform => "ERR_INVALID_TRANSFORM",
            ExErrorKind::InvalidUnitScale => "ERR_INVALID_UNIT_SCALE",
            ExErrorKind::NotAnAssembly => "ERR_NOT_AN_ASSEMBLY",
            ExErrorKind::UnreachablePath => "ERR_UNREACHABLE_PATH",
            ExErrorKind::NoCommonRoot => "ERR_NO_COMMON_ROOT",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::RootComponentModification => "ERR_ROOT_COMPONENT_MODIFICATION",
            ExErrorKind::ContainerNotOnPath => "ERR_CONTAINER_NOT_ON_PATH",
            ExErrorKind::WrongContext => "ERR_WRONG_CONTEXT",
            ExErrorKind::NotInContext => "ERR_NOT_IN_CONTEXT",
            ExErrorKind::StaleContainer => "ERR_STALE_CONTAINER",
            ExErrorKind::StaleComponent => "ERR_STALE_COMPONENT",
            ExErrorKind::NotOwned => "ERR_NOT_OWNED",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::NothingToUndo => "ERR_NOTHING_TO_UNDO",
            ExErrorKind::NothingToRedo => "ERR_NOTHING_TO_REDO",
            ExErrorKind::FactoryMissing => "ERR_FACTORY_MISSING",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Get the category this kind belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExErrorKind::InvalidInput
            | ExErrorKind::InvalidTransform
            | ExErrorKind::InvalidUnitScale
            | ExErrorKind::NotAnAssembly
            | ExErrorKind::UnreachablePath
            | ExErrorKind::NoCommonRoot
            | ExErrorKind::CycleDetected
            | ExErrorKind::RootComponentModification
            | ExErrorKind::ContainerNotOnPath => ErrorCategory::Structural,
            ExErrorKind::WrongContext
            | ExErrorKind::NotInContext
            | ExErrorKind::StaleContainer
            | ExErrorKind::StaleComponent => ErrorCategory::Context,
            ExErrorKind::NotOwned | ExErrorKind::AlreadyExists => ErrorCategory::Ownership,
            ExErrorKind::NotFound
            | ExErrorKind::NothingToUndo
            | ExErrorKind::NothingToRedo
            | ExErrorKind::FactoryMissing => ErrorCategory::NotFound,
            ExErrorKind::Io | ExErrorKind::Serialization | ExErrorKind::Persistence => {
                ErrorCategory::Io
            }
            ExErrorKind::Internal => ErrorCategory::Internal,
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling and context for
/// debugging. Boundary layers (apply, cleanup, persistence) report this type.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    container_id: Option<ContainerId>,
    component_id: Option<ComponentId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            container_id: None,
            component_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add container context
    pub fn with_container_id(mut self, id: ContainerId) -> Self {
        self.container_id = Some(id);
        self
    }

    /// Add component context
    pub fn with_component_id(mut self, id: ComponentId) -> Self {
        self.component_id = Some(id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn container_id(&self) -> Option<ContainerId> {
        self.container_id
    }

    pub fn component_id(&self) -> Option<ComponentId> {
        self.component_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(container_id) = self.container_id {
            write!(f, " ({})", container_id)?;
        }
        if let Some(component_id) = self.component_id {
            write!(f, " ({})", component_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for assembly kernel operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AsmError {
    // ===== Structural Errors =====
    /// Transform is not a pure rotation plus translation
    #[error("Invalid transform: {reason}")]
    InvalidTransform { reason: String },

    /// Unit scale is not a finite positive length
    #[error("Container '{name}' has invalid unit scale {mm_per_unit} mm per unit")]
    InvalidUnitScale { name: String, mm_per_unit: f64 },

    /// Operation needs a composite root the container does not have
    #[error("Container {container_id} has no composite root")]
    NotAnAssembly { container_id: ContainerId },

    /// Edge sequence does not chain from the stated root
    #[error("Path from {root} is not reachable at step {step}: {reason}")]
    UnreachablePath {
        root: ContainerId,
        step: usize,
        reason: String,
    },

    /// Components resolved under different roots
    #[error("Components {origin} and {target} do not share a root container")]
    NoCommonRoot {
        origin: ComponentId,
        target: ComponentId,
    },

    /// Reference would make the folded tree cyclic
    #[error("Cycle detected: {target} already reaches {source_container}")]
    CycleDetected {
        source_container: ContainerId,
        target: ContainerId,
    },

    /// Structural property on the root component of a part
    #[error("Cannot modify root component of non-assembly container {container_id}")]
    RootComponentModification { container_id: ContainerId },

    /// Recording container is not on the component's path
    #[error("Container {container_id} is not on the path of {component_id}")]
    ContainerNotOnPath {
        container_id: ContainerId,
        component_id: ComponentId,
    },

    /// Composite root already exists
    #[error("Container {container_id} already owns a composite root")]
    DuplicateCompositeRoot { container_id: ContainerId },

    // ===== Context Errors =====
    /// The container's log is not the active one
    #[error("Container {container_id} is not the active context (active: {active:?})")]
    WrongContext {
        container_id: ContainerId,
        active: Option<ContainerId>,
    },

    /// Deactivation does not match the innermost activation
    #[error("Activation token {token} is not the innermost context")]
    NotInContext { token: u64 },

    /// Container was already released
    #[error("Container was released: {container_id}")]
    StaleContainer { container_id: ContainerId },

    /// Component path references a removed edge
    #[error("Component {component_id} references removed edge {edge_id}")]
    StaleComponent {
        component_id: ComponentId,
        edge_id: EdgeId,
    },

    // ===== Ownership Errors =====
    /// Content object is not owned by the container
    #[error("Content {content_id} is not owned by container {container_id}")]
    NotOwned {
        container_id: ContainerId,
        content_id: ContentId,
    },

    // ===== Not Found =====
    #[error("Container not found: {container_id}")]
    ContainerNotFound { container_id: ContainerId },

    #[error("Content not found: {content_id}")]
    ContentNotFound { content_id: ContentId },

    #[error("Reference edge not found: {edge_id}")]
    EdgeNotFound { edge_id: EdgeId },

    #[error("Component not found: {component_id}")]
    ComponentNotFound { component_id: ComponentId },

    #[error("Content proxy not found: {proxy_id}")]
    ProxyNotFound { proxy_id: ProxyId },

    #[error("Property not found: {property_id}")]
    PropertyNotFound { property_id: PropertyId },

    /// No owner is recorded for the component in that container
    #[error("No property owner for {component_id} in container {container_id}")]
    PropertyOwnerNotFound {
        component_id: ComponentId,
        container_id: ContainerId,
    },

    #[error("Nothing to undo in history of container {container_id}")]
    NothingToUndo { container_id: ContainerId },

    #[error("Nothing to redo in history of container {container_id}")]
    NothingToRedo { container_id: ContainerId },

    /// No manager factory registered for restore
    #[error("No container manager factory is registered")]
    FactoryMissing,

    /// A persisted document is inconsistent or from an unknown version
    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    // ===== Generic Errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AsmError {
    /// Shorthand for the structured kind this error converts to
    pub fn kind(&self) -> ExErrorKind {
        ExError::from(self.clone()).kind()
    }
}

impl From<serde_json::Error> for AsmError {
    fn from(err: serde_json::Error) -> Self {
        AsmError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from AsmError to ExError
impl From<AsmError> for ExError {
    fn from(err: AsmError) -> Self {
        let message = err.to_string();
        match err {
            AsmError::InvalidTransform { .. } => {
                ExError::new(ExErrorKind::InvalidTransform).with_message(message)
            }
            AsmError::InvalidUnitScale { .. } => {
                ExError::new(ExErrorKind::InvalidUnitScale).with_message(message)
            }
            AsmError::NotAnAssembly { container_id } => ExError::new(ExErrorKind::NotAnAssembly)
                .with_container_id(container_id)
                .with_message(message),
            AsmError::UnreachablePath { root, .. } => ExError::new(ExErrorKind::UnreachablePath)
                .with_container_id(root)
                .with_message(message),
            AsmError::NoCommonRoot { origin, .. } => ExError::new(ExErrorKind::NoCommonRoot)
                .with_component_id(origin)
                .with_message(message),
            AsmError::CycleDetected {
                source_container, ..
            } => ExError::new(ExErrorKind::CycleDetected)
                .with_container_id(source_container)
                .with_message(message),
            AsmError::RootComponentModification { container_id } => {
                ExError::new(ExErrorKind::RootComponentModification)
                    .with_container_id(container_id)
                    .with_message(message)
            }
            AsmError::ContainerNotOnPath {
                container_id,
                component_id,
            } => ExError::new(ExErrorKind::ContainerNotOnPath)
                .with_container_id(container_id)
                .with_component_id(component_id)
                .with_message(message),
            AsmError::DuplicateCompositeRoot { container_id } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_container_id(container_id)
                    .with_message(message)
            }
            AsmError::WrongContext { container_id, .. } => ExError::new(ExErrorKind::WrongContext)
                .with_container_id(container_id)
                .with_message(message),
            AsmError::NotInContext { .. } => {
                ExError::new(ExErrorKind::NotInContext).with_message(message)
            }
            AsmError::StaleContainer { container_id } => ExError::new(ExErrorKind::StaleContainer)
                .with_container_id(container_id)
                .with_message(message),
            AsmError::StaleComponent { component_id, .. } => {
                ExError::new(ExErrorKind::StaleComponent)
                    .with_component_id(component_id)
                    .with_message(message)
            }
            AsmError::NotOwned { container_id, .. } => ExError::new(ExErrorKind::NotOwned)
                .with_container_id(container_id)
                .with_message(message),
            AsmError::ContainerNotFound { container_id } => ExError::new(ExErrorKind::NotFound)
                .with_container_id(container_id)
                .with_message(message),
            AsmError::ComponentNotFound { component_id } => ExError::new(ExErrorKind::NotFound)
                .with_component_id(component_id)
                .with_message(message),
            AsmError::PropertyOwnerNotFound {
                component_id,
                container_id,
            } => ExError::new(ExErrorKind::NotFound)
                .with_container_id(container_id)
                .with_component_id(component_id)
                .with_message(message),
            AsmError::ContentNotFound { .. }
            | AsmError::EdgeNotFound { .. }
            | AsmError::ProxyNotFound { .. }
            | AsmError::PropertyNotFound { .. } => {
                ExError::new(ExErrorKind::NotFound).with_message(message)
            }
            AsmError::NothingToUndo { container_id } => ExError::new(ExErrorKind::NothingToUndo)
                .with_container_id(container_id)
                .with_message(message),
            AsmError::NothingToRedo { container_id } => ExError::new(ExErrorKind::NothingToRedo)
                .with_container_id(container_id)
                .with_message(message),
            AsmError::FactoryMissing => {
                ExError::new(ExErrorKind::FactoryMissing).with_message(message)
            }
            AsmError::InvalidDocument { .. } => {
                ExError::new(ExErrorKind::Persistence).with_message(message)
            }
            AsmError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            AsmError::Internal { .. } => ExError::new(ExErrorKind::Internal).with_message(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExErrorKind::InvalidTransform.code(), "ERR_INVALID_TRANSFORM");
        assert_eq!(ExErrorKind::WrongContext.code(), "ERR_WRONG_CONTEXT");
        assert_eq!(ExErrorKind::NotOwned.code(), "ERR_NOT_OWNED");
    }

    #[test]
    fn test_categories_follow_taxonomy() {
        let err = AsmError::InvalidTransform {
            reason: "scale".to_string(),
        };
        assert_eq!(ExError::from(err).category(), ErrorCategory::Structural);

        let err = AsmError::WrongContext {
            container_id: ContainerId::from_raw(1),
            active: None,
        };
        assert_eq!(ExError::from(err).category(), ErrorCategory::Context);

        let err = AsmError::NotOwned {
            container_id: ContainerId::from_raw(1),
            content_id: ContentId::from_raw(2),
        };
        assert_eq!(ExError::from(err).category(), ErrorCategory::Ownership);

        let err = AsmError::PropertyNotFound {
            property_id: PropertyId::from_raw(9),
        };
        assert_eq!(ExError::from(err).category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_display_includes_code_and_context() {
        let err: ExError = AsmError::NotAnAssembly {
            container_id: ContainerId::from_raw(4),
        }
        .into();
        let text = err.with_op("add_reference").to_string();
        assert!(text.starts_with("[ERR_NOT_AN_ASSEMBLY]"));
        assert!(text.contains("add_reference"));
        assert!(text.contains("container-4"));
    }
}
