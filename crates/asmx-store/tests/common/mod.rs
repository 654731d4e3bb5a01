use asmx_core::model::CustomerInfo;
use asmx_core::ops::{container_ops, in_context, reference_ops, Session};
use asmx_core::ContainerHandle;
use asmx_core_types::EdgeId;
use nalgebra::Matrix4;

/// Top assembly holding two instances of one part
#[allow(dead_code)]
pub struct Bracket {
    pub asm: ContainerHandle,
    pub part: ContainerHandle,
    pub left: EdgeId,
    pub right: EdgeId,
}

pub fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m[(0, 3)] = x;
    m[(1, 3)] = y;
    m[(2, 3)] = z;
    m
}

/// Build `asm -> {part @ x=-10, part @ x=+10}` with one body in the part
#[allow(dead_code)]
pub fn bracket(session: &mut Session) -> Bracket {
    let asm = container_ops::create_container(session, CustomerInfo::new("bracket")).unwrap();
    let part = container_ops::create_container(
        session,
        CustomerInfo::new("pin").with_mm_per_unit(25.4),
    )
    .unwrap();
    in_context(session, part.id(), |s| {
        container_ops::create_content(s, part.id(), "body", None)
    })
    .unwrap();
    let (left, right) = in_context(session, asm.id(), |s| {
        container_ops::create_composite_root(s, asm.id())?;
        let left =
            reference_ops::add_reference(s, asm.id(), part.id(), &translation(-10.0, 0.0, 0.0), true)?;
        let right =
            reference_ops::add_reference(s, asm.id(), part.id(), &translation(10.0, 0.0, 0.0), true)?;
        Ok((left, right))
    })
    .unwrap();
    Bracket {
        asm,
        part,
        left,
        right,
    }
}
