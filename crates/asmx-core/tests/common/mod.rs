#![allow(dead_code)]

use asmx_core::model::CustomerInfo;
use asmx_core::ops::{container_ops, in_context, reference_ops, Session};
use asmx_core::ContainerHandle;
use asmx_core_types::EdgeId;
use nalgebra::{Matrix4, Rotation3, Vector3};

pub fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// Quarter turn about Z followed by a translation
pub fn quarter_turn_then(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    let mut m = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2)
        .to_homogeneous();
    m[(0, 3)] = x;
    m[(1, 3)] = y;
    m[(2, 3)] = z;
    m
}

/// A part container owning one body
pub fn part(session: &mut Session, name: &str) -> ContainerHandle {
    let part = container_ops::create_container(session, CustomerInfo::new(name)).unwrap();
    in_context(session, part.id(), |s| {
        container_ops::create_content(s, part.id(), "body", None)
    })
    .unwrap();
    part
}

/// An empty assembly container
pub fn assembly(session: &mut Session, name: &str) -> ContainerHandle {
    let asm = container_ops::create_container(session, CustomerInfo::new(name)).unwrap();
    in_context(session, asm.id(), |s| container_ops::create_composite_root(s, asm.id())).unwrap();
    asm
}

/// Instance `child` under `parent` at `m`, appended after existing siblings
pub fn instance(
    session: &mut Session,
    parent: &ContainerHandle,
    child: &ContainerHandle,
    m: Matrix4<f64>,
) -> EdgeId {
    in_context(session, parent.id(), |s| {
        reference_ops::add_reference(s, parent.id(), child.id(), &m, true)
    })
    .unwrap()
}

/// Two copies of a sub-assembly, each holding one pin
///
/// ```text
/// top ─left──▶ sub ─pin_edge──▶ pin
///     └right─▶ sub
/// ```
pub struct Linkage {
    pub top: ContainerHandle,
    pub sub: ContainerHandle,
    pub pin: ContainerHandle,
    pub left: EdgeId,
    pub right: EdgeId,
    pub pin_edge: EdgeId,
}

pub fn linkage(session: &mut Session) -> Linkage {
    let top = assembly(session, "top");
    let sub = assembly(session, "sub");
    let pin = part(session, "pin");
    let pin_edge = instance(session, &sub, &pin, translation(0.0, 0.0, 5.0));
    let left = instance(session, &top, &sub, translation(-20.0, 0.0, 0.0));
    let right = instance(session, &top, &sub, translation(20.0, 0.0, 0.0));
    Linkage {
        top,
        sub,
        pin,
        left,
        right,
        pin_edge,
    }
}
