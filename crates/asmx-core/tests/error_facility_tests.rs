use asmx_core::errors::{AsmError, ErrorCategory, ExError, ExErrorKind};
use asmx_core_types::{ComponentId, ContainerId, ContentId, EdgeId};

#[test]
fn test_stale_container_distinct_from_not_found() {
    let stale: ExError = AsmError::StaleContainer {
        container_id: ContainerId::from_raw(3),
    }
    .into();
    let missing: ExError = AsmError::ContainerNotFound {
        container_id: ContainerId::from_raw(3),
    }
    .into();

    assert_eq!(stale.kind(), ExErrorKind::StaleContainer);
    assert_eq!(stale.category(), ErrorCategory::Context);
    assert_eq!(missing.kind(), ExErrorKind::NotFound);
    assert_eq!(missing.container_id(), Some(ContainerId::from_raw(3)));
}

#[test]
fn test_unreachable_path_keeps_root_context() {
    let err: ExError = AsmError::UnreachablePath {
        root: ContainerId::from_raw(1),
        step: 2,
        reason: "edge-9 leaves container-4".to_string(),
    }
    .into();

    assert_eq!(err.code(), "ERR_UNREACHABLE_PATH");
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(err.container_id(), Some(ContainerId::from_raw(1)));
    assert!(err.message().contains("edge-9"));
}

#[test]
fn test_ownership_and_not_found_categories() {
    let not_owned: ExError = AsmError::NotOwned {
        container_id: ContainerId::from_raw(1),
        content_id: ContentId::from_raw(5),
    }
    .into();
    let duplicate: ExError = AsmError::DuplicateCompositeRoot {
        container_id: ContainerId::from_raw(1),
    }
    .into();
    let edge: ExError = AsmError::EdgeNotFound {
        edge_id: EdgeId::from_raw(8),
    }
    .into();
    let stale_component: ExError = AsmError::StaleComponent {
        component_id: ComponentId::from_raw(2),
        edge_id: EdgeId::from_raw(8),
    }
    .into();

    assert_eq!(not_owned.category(), ErrorCategory::Ownership);
    assert_eq!(duplicate.category(), ErrorCategory::Ownership);
    assert_eq!(edge.category(), ErrorCategory::NotFound);
    assert_eq!(stale_component.component_id(), Some(ComponentId::from_raw(2)));
}

#[test]
fn test_invalid_unit_scale_is_structural() {
    let err: ExError = AsmError::InvalidUnitScale {
        name: "pin".to_string(),
        mm_per_unit: 0.0,
    }
    .into();

    assert_eq!(err.code(), "ERR_INVALID_UNIT_SCALE");
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert!(err.message().contains("pin"));
}

#[test]
fn test_document_errors_are_persistence() {
    let err = AsmError::InvalidDocument {
        reason: "bad".to_string(),
    };
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(ExError::from(err).category(), ErrorCategory::Io);
}

#[test]
fn test_error_kind_codes_are_unique() {
    let kinds = [
        ExErrorKind::InvalidInput,
        ExErrorKind::InvalidTransform,
        ExErrorKind::InvalidUnitScale,
        ExErrorKind::NotAnAssembly,
        ExErrorKind::UnreachablePath,
        ExErrorKind::NoCommonRoot,
        ExErrorKind::CycleDetected,
        ExErrorKind::RootComponentModification,
        ExErrorKind::ContainerNotOnPath,
        ExErrorKind::WrongContext,
        ExErrorKind::NotInContext,
        ExErrorKind::StaleContainer,
        ExErrorKind::StaleComponent,
        ExErrorKind::NotOwned,
        ExErrorKind::AlreadyExists,
        ExErrorKind::NotFound,
        ExErrorKind::NothingToUndo,
        ExErrorKind::NothingToRedo,
        ExErrorKind::FactoryMissing,
        ExErrorKind::Io,
        ExErrorKind::Serialization,
        ExErrorKind::Persistence,
        ExErrorKind::Internal,
    ];
    let codes: std::collections::BTreeSet<_> = kinds.iter().map(|k| k.code()).collect();
    assert_eq!(codes.len(), kinds.len());
    assert!(codes.iter().all(|c| c.starts_with("ERR_")));
}
