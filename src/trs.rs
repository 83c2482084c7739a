//! Plain translation/rotation/scale values.
//!
//! [`Trs`] is the detached form of a node's local state: it carries no parent,
//! no cached axes and no hooks. Use it to seed nodes or to snapshot one.
//!
//! ```
//! use pivot::{Trs, Vec3, Quat};
//!
//! let trs = Trs::new()
//!     .position(Vec3::new(0.0, 2.0, -5.0))
//!     .rotation(Quat::from_rotation_y(0.5))
//!     .uniform_scale(2.0);
//!
//! let back = Trs::from_matrix(trs.to_matrix());
//! assert!(back.position.abs_diff_eq(trs.position, 1e-5));
//! ```

use glam::{Mat4, Quat, Vec3};

/// Position, rotation, and scale of a node relative to its parent.
///
/// Matrices are built in SRT order: scale first, then rotate, then translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trs {
    /// Translation relative to the parent (or world, for roots).
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Per-axis scale factors.
    pub scale: Vec3,
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Trs {
    /// Identity: origin, no rotation, unit scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity rotation and scale, placed at `position`.
    ///
    /// ```
    /// use pivot::{Trs, Vec3};
    ///
    /// let trs = Trs::from_position(Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(trs.position, Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(trs.scale, Vec3::ONE);
    /// ```
    pub fn from_position(position: impl Into<Vec3>) -> Self {
        Self {
            position: position.into(),
            ..Default::default()
        }
    }

    /// Splits an affine matrix into translation, rotation and scale.
    ///
    /// Shear cannot be represented and is lost. A negative determinant is folded
    /// into a negative X scale.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn position(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets non-uniform scale factors for each axis.
    pub fn scale(mut self, scale: impl Into<Vec3>) -> Self {
        self.scale = scale.into();
        self
    }

    /// Sets the same scale on all three axes.
    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Composes `Translate · Rotate · Scale` into one matrix.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl From<Mat4> for Trs {
    fn from(matrix: Mat4) -> Self {
        Self::from_matrix(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(Trs::default().to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_applies_scale_before_rotation() {
        let trs = Trs::new()
            .scale(Vec3::new(2.0, 1.0, 1.0))
            .rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));

        // Scaled along X first, then swung onto Y.
        let p = trs.to_matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn from_matrix_recovers_components() {
        let trs = Trs::new()
            .position(Vec3::new(4.0, -1.0, 2.5))
            .rotation(Quat::from_rotation_x(0.7))
            .scale(Vec3::new(1.0, 3.0, 0.5));

        let back = Trs::from_matrix(trs.to_matrix());
        assert!(back.position.abs_diff_eq(trs.position, 1e-5));
        assert!(back.rotation.abs_diff_eq(trs.rotation, 1e-5));
        assert!(back.scale.abs_diff_eq(trs.scale, 1e-5));
    }
}
