mod common;

use asmx_core::factory::FactoryRegistry;
use asmx_core::ops::{reference_ops, Session};
use asmx_store::{restore_from_path, save_to_path, SaveOptions};
use common::bracket;
use tempfile::TempDir;

#[test]
fn test_save_to_path_round_trip() {
    // GIVEN an assembly saved to disk in binary form
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models").join("bracket.asmx");
    let mut session = Session::new();
    let fixture = bracket(&mut session);
    save_to_path(&session, &[fixture.asm.id()], SaveOptions::binary(), &path).unwrap();

    // WHEN read back
    let mut restored = Session::new();
    let roots = restore_from_path(&mut restored, &path, &FactoryRegistry::new()).unwrap();

    // THEN the assembly and its references are back
    assert_eq!(roots.len(), 1);
    assert_eq!(reference_ops::edges_of(&restored, roots[0].id()).unwrap().len(), 2);
}

#[test]
fn test_overwrite_leaves_no_temp_file() {
    // GIVEN a file saved twice
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bracket.asmx");
    let mut session = Session::new();
    let fixture = bracket(&mut session);
    save_to_path(&session, &[fixture.asm.id()], SaveOptions::default(), &path).unwrap();
    save_to_path(&session, &[fixture.part.id()], SaveOptions::default(), &path).unwrap();

    // THEN only the target remains and it holds the second save
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["bracket.asmx".to_string()]);
    let mut restored = Session::new();
    restore_from_path(&mut restored, &path, &FactoryRegistry::new()).unwrap();
    assert_eq!(restored.container_count(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::new();
    let err = restore_from_path(
        &mut session,
        &dir.path().join("absent.asmx"),
        &FactoryRegistry::new(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), asmx_core::errors::ExErrorKind::Io);
}
