//! Body poses and the two accepted orientation encodings.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Orientation given either as Euler angles or as a quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    /// `[roll, pitch, yaw]` in radians.
    Euler([f32; 3]),
    /// `[x, y, z, w]`, normalized on conversion.
    Quaternion([f32; 4]),
}

impl Orientation {
    /// Unit quaternion for this orientation.
    ///
    /// A zero-length quaternion maps to the identity rotation.
    #[must_use]
    pub fn to_unit_quaternion(self) -> UnitQuaternion<f32> {
        match self {
            Self::Euler([roll, pitch, yaw]) => UnitQuaternion::from_euler_angles(roll, pitch, yaw),
            Self::Quaternion([x, y, z, w]) => {
                UnitQuaternion::try_new(Quaternion::new(w, x, y, z), f32::EPSILON)
                    .unwrap_or_else(UnitQuaternion::identity)
            }
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Quaternion([0.0, 0.0, 0.0, 1.0])
    }
}

impl From<[f32; 3]> for Orientation {
    fn from(euler: [f32; 3]) -> Self {
        Self::Euler(euler)
    }
}

impl From<[f32; 4]> for Orientation {
    fn from(quat: [f32; 4]) -> Self {
        Self::Quaternion(quat)
    }
}

impl From<UnitQuaternion<f32>> for Orientation {
    fn from(rotation: UnitQuaternion<f32>) -> Self {
        let q = rotation.quaternion();
        Self::Quaternion([q.i, q.j, q.k, q.w])
    }
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// World-frame position and orientation of a body base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Pose {
    #[must_use]
    pub fn new(position: Vector3<f32>, orientation: impl Into<Orientation>) -> Self {
        Self {
            position,
            orientation: orientation.into().to_unit_quaternion(),
        }
    }

    /// Pose at `position` with identity rotation.
    #[must_use]
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Orientation as `[x, y, z, w]`.
    #[must_use]
    pub fn quaternion_xyzw(&self) -> [f32; 4] {
        let q = self.orientation.quaternion();
        [q.i, q.j, q.k, q.w]
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_position(Vector3::zeros())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
