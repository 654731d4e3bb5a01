mod common;

use approx::assert_relative_eq;
use asmx_core::apply::apply;
use asmx_core::commands::Command;
use asmx_core::errors::AsmError;
use asmx_core::model::CustomerInfo;
use asmx_core::ops::{component_ops, container_ops, in_context, reference_ops, Session};
use common::{assembly, instance, linkage, part, quarter_turn_then, translation};
use nalgebra::{Matrix4, Point3};

#[test]
fn test_zero_length_path_is_identity() {
    let mut session = Session::new();
    let l = linkage(&mut session);
    let top = component_ops::resolve_component(&mut session, l.top.id(), &[]).unwrap();

    let t = component_ops::get_transform(&session, top.id(), false).unwrap();

    assert_relative_eq!(t.to_homogeneous(), Matrix4::identity(), epsilon = 1e-12);
}

#[test]
fn test_one_edge_path_is_edge_transform() {
    let mut session = Session::new();
    let l = linkage(&mut session);
    let right = component_ops::resolve_component(&mut session, l.top.id(), &[l.right]).unwrap();

    let t = component_ops::get_transform(&session, right.id(), false).unwrap();

    let stored = session.edge(l.right).unwrap().transform().to_matrix();
    assert_relative_eq!(t.to_homogeneous(), stored, epsilon = 1e-12);
}

#[test]
fn test_two_edge_path_composes_outer_first() {
    // GIVEN T1 = quarter turn about Z then (10, 0, 0), T2 = (1, 0, 0)
    let mut session = Session::new();
    let top = assembly(&mut session, "top");
    let sub = assembly(&mut session, "sub");
    let pin = part(&mut session, "pin");
    let t1 = quarter_turn_then(10.0, 0.0, 0.0);
    let t2 = translation(1.0, 0.0, 0.0);
    let e1 = instance(&mut session, &top, &sub, t1);
    let e2 = instance(&mut session, &sub, &pin, t2);

    // WHEN the pin's transform is composed
    let c = component_ops::resolve_component(&mut session, top.id(), &[e1, e2]).unwrap();
    let t = component_ops::get_transform(&session, c.id(), false).unwrap();

    // THEN it equals T1 * T2 and maps the pin origin to (10, 1, 0)
    assert_relative_eq!(t.to_homogeneous(), t1 * t2, epsilon = 1e-12);
    let origin = t.transform_point(&Point3::origin());
    assert_relative_eq!(origin, Point3::new(10.0, 1.0, 0.0), epsilon = 1e-12);
}

#[test]
fn test_unusable_unit_scale_is_rejected_at_creation() {
    // GIVEN a session with one container
    let mut session = Session::new();
    let _top = assembly(&mut session, "top");

    for bad in [0.0, -25.4, f64::NAN, f64::INFINITY] {
        // WHEN a container is created with an unusable unit scale
        let err = container_ops::create_container(
            &mut session,
            CustomerInfo::new("broken").with_mm_per_unit(bad),
        )
        .unwrap_err();

        // THEN it is refused and nothing is added
        assert!(matches!(err, AsmError::InvalidUnitScale { .. }));
        assert_eq!(session.container_count(), 1);
    }
}

#[test]
fn test_unit_rescale_folds_length_ratio() {
    // GIVEN an mm assembly instancing an inch part 5 units along X
    let mut session = Session::new();
    let top = assembly(&mut session, "top");
    let inch = container_ops::create_container(
        &mut session,
        CustomerInfo::new("inch-part").with_mm_per_unit(25.4),
    )
    .unwrap();
    let edge = instance(&mut session, &top, &inch, translation(5.0, 0.0, 0.0));
    let c = component_ops::resolve_component(&mut session, top.id(), &[edge]).unwrap();

    // WHEN composed with and without rescaling
    let plain = component_ops::get_transform(&session, c.id(), false).unwrap();
    let scaled = component_ops::get_transform(&session, c.id(), true).unwrap();

    // THEN one inch in the part is 25.4 units in the assembly only when rescaled
    let tip = Point3::new(1.0, 0.0, 0.0);
    assert_relative_eq!(plain.transform_point(&tip), Point3::new(6.0, 0.0, 0.0), epsilon = 1e-12);
    assert_relative_eq!(
        scaled.transform_point(&tip),
        Point3::new(30.4, 0.0, 0.0),
        epsilon = 1e-9
    );
    assert_relative_eq!(scaled.scaling(), 25.4, epsilon = 1e-12);
}

#[test]
fn test_relative_transform_between_siblings() {
    // GIVEN the two pins of the linkage, 40 apart along X
    let mut session = Session::new();
    let l = linkage(&mut session);
    let left = component_ops::resolve_component(&mut session, l.top.id(), &[l.left, l.pin_edge]).unwrap();
    let right =
        component_ops::resolve_component(&mut session, l.top.id(), &[l.right, l.pin_edge]).unwrap();

    // WHEN expressing the left pin's frame in the right pin's frame
    let rel = component_ops::get_relative_transform(&session, left.id(), right.id(), false).unwrap();

    // THEN the left origin sits at x = -40 from the right
    assert_relative_eq!(
        rel.transform_point(&Point3::origin()),
        Point3::new(-40.0, 0.0, 0.0),
        epsilon = 1e-12
    );
}

#[test]
fn test_relative_transform_needs_common_root() {
    let mut session = Session::new();
    let l = linkage(&mut session);
    let top = component_ops::resolve_component(&mut session, l.top.id(), &[]).unwrap();
    let sub = component_ops::resolve_component(&mut session, l.sub.id(), &[]).unwrap();

    let err = component_ops::get_relative_transform(&session, top.id(), sub.id(), false).unwrap_err();

    assert!(matches!(err, AsmError::NoCommonRoot { .. }));
}

#[test]
fn test_nonuniform_scale_is_rejected_atomically() {
    // GIVEN an assembly with one existing instance
    let mut session = Session::new();
    let l = linkage(&mut session);
    let before = reference_ops::edges_of(&session, l.top.id()).unwrap();
    let pin_uses = l.pin.use_count();

    // WHEN adding a reference stretched along Y
    let mut stretched = translation(0.0, 0.0, 0.0);
    stretched[(1, 1)] = 3.0;
    let err = in_context(&mut session, l.top.id(), |s| {
        reference_ops::add_reference(s, l.top.id(), l.pin.id(), &stretched, true)
    })
    .unwrap_err();

    // THEN it fails and nothing about the assembly changed
    assert!(matches!(err, AsmError::InvalidTransform { .. }));
    assert_eq!(reference_ops::edges_of(&session, l.top.id()).unwrap(), before);
    assert_eq!(l.pin.use_count(), pin_uses);
}

#[test]
fn test_reflection_and_projective_terms_are_rejected() {
    let mut session = Session::new();
    let l = linkage(&mut session);

    let mut mirrored = Matrix4::identity();
    mirrored[(0, 0)] = -1.0;
    let mut projective = Matrix4::identity();
    projective[(3, 0)] = 0.1;

    for m in [mirrored, projective] {
        let err = apply(
            &mut session,
            l.top.id(),
            Command::AddReference {
                target: l.pin.id(),
                transform: m,
                pushback: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AsmError::InvalidTransform { .. }));
    }
    assert_eq!(reference_ops::edges_of(&session, l.top.id()).unwrap().len(), 2);
}
