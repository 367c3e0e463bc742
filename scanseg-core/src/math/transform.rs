use anyhow::{ensure, Result};
use nalgebra::{Matrix4, Vector3, Vector4};

/// A rigid-body transform as a 4x4 homogeneous matrix: a 3x3 rotation block,
/// a 3x1 translation column and the homogeneous row `[0 0 0 1]`.
///
/// The rotation block is assumed orthonormal; it is not re-orthonormalized at
/// runtime. Points are transformed by pre-multiplication: `p' = R*p + t`.
///
/// ```
/// # use scanseg_core::math::RigidTransform;
/// # use scanseg_core::nalgebra::Vector3;
/// let t = RigidTransform::from_row_major(&[
///     1.0, 0.0, 0.0, 2.0,
///     0.0, 1.0, 0.0, 0.0,
///     0.0, 0.0, 1.0, 0.0,
///     0.0, 0.0, 0.0, 1.0,
/// ]).unwrap();
/// assert_eq!(t.transform_point(&Vector3::new(1.0, 1.0, 1.0)), Vector3::new(3.0, 1.0, 1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    matrix: Matrix4<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Builds a transform from 16 values interpreted row-major. Errors if the
    /// slice does not hold exactly 16 values.
    pub fn from_row_major(values: &[f64]) -> Result<Self> {
        ensure!(
            values.len() == 16,
            "a rigid transform takes exactly 16 values, got {}",
            values.len()
        );
        Ok(Self {
            matrix: Matrix4::from_row_slice(values),
        })
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// The translation column of the transform
    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Applies the transform to a point, ignoring color: `p' = R*p + t`
    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        let h = self.matrix * Vector4::new(point.x, point.y, point.z, 1.0);
        Vector3::new(h.x, h.y, h.z)
    }

    /// The inverse transform, computed from the rigid structure as
    /// `(R^T, -R^T*t)` rather than by general matrix inversion.
    pub fn inverse(&self) -> Self {
        let rotation = self.matrix.fixed_view::<3, 3>(0, 0).transpose();
        let translation = -rotation * self.translation();
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self { matrix }
    }
}
