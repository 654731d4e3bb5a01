use nalgebra::{
    Isometry3, Matrix3, Matrix4, Rotation3, Similarity3, Translation3, UnitQuaternion, Vector3,
};

use crate::errors::{AsmError, Result};

/// Composed placement of a component
///
/// Rigid unless unit rescaling is folded in, in which case the uniform
/// scale carries the length-unit ratio.
pub type Transform = Similarity3<f64>;

/// Tolerance for the orthonormality checks on incoming matrices
pub const RIGID_TOLERANCE: f64 = 1e-9;

/// A validated rotation-plus-translation
///
/// Reflection, shear, scale and projective terms are rejected at
/// construction; nothing is ever silently corrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform(Isometry3<f64>);

impl RigidTransform {
    pub fn identity() -> Self {
        Self(Isometry3::identity())
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self(Isometry3::translation(x, y, z))
    }

    /// Rotation about `axis` by `angle` radians, followed by `translation`
    pub fn from_axis_angle(axis: Vector3<f64>, angle: f64, translation: Vector3<f64>) -> Self {
        let rotation = if axis.norm() == 0.0 {
            UnitQuaternion::identity()
        } else {
            UnitQuaternion::from_axis_angle(&nalgebra::Unit::new_normalize(axis), angle)
        };
        Self(Isometry3::from_parts(Translation3::from(translation), rotation))
    }

    pub fn from_isometry(isometry: Isometry3<f64>) -> Self {
        Self(isometry)
    }

    /// Validate and decompose a homogeneous matrix
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransform` when the matrix has non-finite entries,
    /// a projective row, scale (uniform or not), shear, or a reflection.
    pub fn from_matrix(m: &Matrix4<f64>) -> Result<Self> {
        if m.iter().any(|v| !v.is_finite()) {
            return Err(invalid("matrix has non-finite entries"));
        }

        let bottom_ok = m[(3, 0)].abs() <= RIGID_TOLERANCE
            && m[(3, 1)].abs() <= RIGID_TOLERANCE
            && m[(3, 2)].abs() <= RIGID_TOLERANCE
            && (m[(3, 3)] - 1.0).abs() <= RIGID_TOLERANCE;
        if !bottom_ok {
            return Err(invalid("matrix has a projective component"));
        }

        let r: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
        let norms = [
            r.column(0).norm(),
            r.column(1).norm(),
            r.column(2).norm(),
        ];
        if norms.iter().any(|n| (n - 1.0).abs() > RIGID_TOLERANCE) {
            let uniform = (norms[0] - norms[1]).abs() <= RIGID_TOLERANCE
                && (norms[1] - norms[2]).abs() <= RIGID_TOLERANCE;
            return Err(invalid(if uniform {
                "matrix carries a scale factor"
            } else {
                "matrix carries a non-uniform scale"
            }));
        }

        let pairs = [(0, 1), (0, 2), (1, 2)];
        if pairs
            .iter()
            .any(|&(a, b)| r.column(a).dot(&r.column(b)).abs() > RIGID_TOLERANCE)
        {
            return Err(invalid("matrix carries shear"));
        }

        if r.determinant() < 0.0 {
            return Err(invalid("matrix carries a reflection"));
        }

        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
        let translation = Translation3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
        Ok(Self(Isometry3::from_parts(translation, rotation)))
    }

    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.0
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        self.0.to_homogeneous()
    }

    /// Lift into the composed transform type with unit scale
    pub fn to_transform(&self) -> Transform {
        Similarity3::from_isometry(self.0, 1.0)
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

fn invalid(reason: &str) -> AsmError {
    AsmError::InvalidTransform {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_round_trips() {
        let rigid = RigidTransform::from_matrix(&Matrix4::identity()).unwrap();
        assert_relative_eq!(rigid.to_matrix(), Matrix4::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_and_translation_accepted() {
        let original =
            RigidTransform::from_axis_angle(Vector3::z(), FRAC_PI_2, Vector3::new(1.0, 2.0, 3.0));
        let decoded = RigidTransform::from_matrix(&original.to_matrix()).unwrap();
        assert_relative_eq!(decoded.to_matrix(), original.to_matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_non_uniform_scale_rejected() {
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 2.0, 1.0));
        let err = RigidTransform::from_matrix(&m).unwrap_err();
        assert!(matches!(err, AsmError::InvalidTransform { ref reason } if reason.contains("non-uniform")));
    }

    #[test]
    fn test_uniform_scale_rejected() {
        let m = Matrix4::new_scaling(2.0);
        assert!(RigidTransform::from_matrix(&m).is_err());
    }

    #[test]
    fn test_reflection_rejected() {
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0));
        let err = RigidTransform::from_matrix(&m).unwrap_err();
        assert!(matches!(err, AsmError::InvalidTransform { ref reason } if reason.contains("reflection")));
    }

    #[test]
    fn test_shear_rejected() {
        let mut m = Matrix4::identity();
        m[(0, 1)] = 0.5;
        assert!(RigidTransform::from_matrix(&m).is_err());
    }

    #[test]
    fn test_projective_row_rejected() {
        let mut m = Matrix4::identity();
        m[(3, 0)] = 0.1;
        assert!(RigidTransform::from_matrix(&m).is_err());
    }
}
