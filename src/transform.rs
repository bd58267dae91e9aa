//! Rigid transforms between link frames.
//!
//! Rotations are roll/pitch/yaw triples. The matrix convention is fixed:
//! roll about X is applied first, then pitch about Y, then yaw about Z, so
//! `R = Rz(yaw) · Ry(pitch) · Rx(roll)`. Pose composition in [`crate::body`]
//! relies on this order.

use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

/// Rotation matrix for a roll/pitch/yaw triple, `Rz · Ry · Rx`.
#[must_use]
pub fn rotation_matrix(roll: f64, pitch: f64, yaw: f64) -> Matrix3<f64> {
    *Rotation3::from_euler_angles(roll, pitch, yaw).matrix()
}

/// Rotate `point` by the roll/pitch/yaw triple `rotation`, then translate.
#[must_use]
pub fn transform_point(
    point: &Point3<f64>,
    rotation: &Vector3<f64>,
    translation: &Vector3<f64>,
) -> Point3<f64> {
    Point3::from(rotation_matrix(rotation.x, rotation.y, rotation.z) * point.coords + translation)
}

/// Placement of a link frame relative to its reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Roll, pitch, yaw in radians.
    pub rotation: Vector3<f64>,
    pub translation: Vector3<f64>,
}

impl Transform {
    #[must_use]
    pub fn new(rotation: Vector3<f64>, translation: Vector3<f64>) -> Self {
        Self { rotation, translation }
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    #[must_use]
    pub fn matrix(&self) -> Matrix3<f64> {
        rotation_matrix(self.rotation.x, self.rotation.y, self.rotation.z)
    }

    #[must_use]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        transform_point(point, &self.rotation, &self.translation)
    }

    /// Undo [`Transform::apply`]: `Rᵀ · (p − t)`.
    #[must_use]
    pub fn inverse_apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.matrix().transpose() * (point.coords - self.translation))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
