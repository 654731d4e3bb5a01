mod common;

use asmx_core::errors::AsmError;
use asmx_core::model::CustomerInfo;
use asmx_core::ops::{container_ops, content_ops, in_context, Session};
use common::part;

#[test]
fn test_proxy_survives_rollback_and_rollforward() {
    // GIVEN a proxy to a body created in a committed state
    let mut session = Session::new();
    let p = container_ops::create_container(&mut session, CustomerInfo::new("part")).unwrap();
    let body = in_context(&mut session, p.id(), |s| {
        container_ops::create_content(s, p.id(), "body", None)
    })
    .unwrap();
    let proxy = content_ops::get_or_create_proxy(&mut session, p.id(), body, true).unwrap();

    // WHEN the log is rolled back past the body's creation
    container_ops::roll_back(&mut session, p.id(), 1).unwrap();

    // THEN the proxy resolves to nothing
    assert!(content_ops::resolve(&session, &proxy).is_none());
    assert!(!content_ops::is_valid(&session, &proxy));

    // WHEN rolled forward again
    container_ops::roll_forward(&mut session, p.id(), 1).unwrap();

    // THEN the same proxy resolves to the body again
    let object = content_ops::resolve(&session, &proxy).unwrap();
    assert_eq!(object.id, body);
    let again = content_ops::get_or_create_proxy(&mut session, p.id(), body, true).unwrap();
    assert!(again.same_object(&proxy));
}

#[test]
fn test_proxy_for_foreign_content_is_rejected() {
    let mut session = Session::new();
    let a = part(&mut session, "a");
    let b = part(&mut session, "b");
    let body_of_a = container_ops::owned_content(&session, a.id()).unwrap()[0];

    let err = content_ops::get_or_create_proxy(&mut session, b.id(), body_of_a, true).unwrap_err();

    assert!(matches!(err, AsmError::NotOwned { .. }));
    assert_eq!(session.proxy_count(), 0);
}

#[test]
fn test_owned_subobject_validates_through_top_level_owner() {
    let mut session = Session::new();
    let p = part(&mut session, "p");
    let body = container_ops::owned_content(&session, p.id()).unwrap()[0];
    let face = in_context(&mut session, p.id(), |s| {
        container_ops::create_content(s, p.id(), "face", Some(body))
    })
    .unwrap();

    let proxy = content_ops::get_or_create_proxy(&mut session, p.id(), face, true).unwrap();

    assert_eq!(content_ops::resolve(&session, &proxy).unwrap().owner, Some(body));
}

#[test]
fn test_deleting_owner_deletes_owned_objects() {
    let mut session = Session::new();
    let p = part(&mut session, "p");
    let body = container_ops::owned_content(&session, p.id()).unwrap()[0];
    let face = in_context(&mut session, p.id(), |s| {
        container_ops::create_content(s, p.id(), "face", Some(body))
    })
    .unwrap();
    let face_proxy = content_ops::get_or_create_proxy(&mut session, p.id(), face, true).unwrap();

    let deleted = in_context(&mut session, p.id(), |s| {
        container_ops::delete_content(s, p.id(), body)
    })
    .unwrap();

    assert_eq!(deleted.len(), 2);
    assert!(content_ops::resolve(&session, &face_proxy).is_none());
}

#[test]
fn test_composite_root_cannot_be_deleted_or_rolled_away() {
    let mut session = Session::new();
    let asm = container_ops::create_container(&mut session, CustomerInfo::new("asm")).unwrap();
    let root = in_context(&mut session, asm.id(), |s| {
        container_ops::create_composite_root(s, asm.id())
    })
    .unwrap();

    let err = in_context(&mut session, asm.id(), |s| {
        container_ops::delete_content(s, asm.id(), root)
    })
    .unwrap_err();
    assert!(matches!(err, AsmError::NotOwned { .. }));

    let err = container_ops::roll_back(&mut session, asm.id(), 1).unwrap_err();
    assert!(matches!(err, AsmError::NothingToUndo { .. }));
    assert!(session.manager(asm.id()).unwrap().has_composite_root());
}

#[test]
fn test_duplicate_composite_root_is_rejected() {
    let mut session = Session::new();
    let asm = container_ops::create_container(&mut session, CustomerInfo::new("asm")).unwrap();
    in_context(&mut session, asm.id(), |s| container_ops::create_composite_root(s, asm.id())).unwrap();

    let err = in_context(&mut session, asm.id(), |s| container_ops::create_composite_root(s, asm.id()))
        .unwrap_err();

    assert!(matches!(err, AsmError::DuplicateCompositeRoot { .. }));
}
