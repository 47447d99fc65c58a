//! Engine-agnostic simulation backend trait.
//!
//! Entities and the episode loop talk to the simulator only through
//! [`SimulationBackend`], so a physics engine, the kinematic reference
//! backend or a test double can be swapped without touching them.

use std::path::Path;

use nalgebra::{UnitQuaternion, Vector3};
use neuro_core::config::CameraConfig;
use neuro_core::error::SimError;
use neuro_core::types::BodyId;

use crate::pose::Pose;

/// World-frame state of one link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkState {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    /// Linear velocity, present only when requested.
    pub linear_velocity: Option<Vector3<f32>>,
}

/// Capabilities a simulator must provide.
///
/// Joints and links are addressed by index in description order. Link `i`
/// is the child of joint `i`.
pub trait SimulationBackend {
    /// Load a body description at `position`.
    fn load_body(
        &mut self,
        description: &Path,
        position: Vector3<f32>,
        fixed_base: bool,
    ) -> Result<BodyId, SimError>;

    fn body_pose(&self, body: BodyId) -> Result<Pose, SimError>;

    fn set_body_pose(&mut self, body: BodyId, pose: Pose) -> Result<(), SimError>;

    fn link_state(
        &self,
        body: BodyId,
        link: usize,
        want_velocity: bool,
    ) -> Result<LinkState, SimError>;

    fn joint_angle(&self, body: BodyId, joint: usize) -> Result<f32, SimError>;

    /// Teleport a joint to `angle`. Clears any motor target on it.
    fn set_joint_angle(&mut self, body: BodyId, joint: usize, angle: f32)
    -> Result<(), SimError>;

    /// Position-control command, one target per joint.
    fn set_joint_motor_targets(
        &mut self,
        body: BodyId,
        joints: &[usize],
        targets: &[f32],
    ) -> Result<(), SimError>;

    /// Joint angles placing `link` at `position`, one per actuated joint in
    /// index order. The result is a best effort.
    fn solve_inverse_kinematics(
        &self,
        body: BodyId,
        link: usize,
        position: Vector3<f32>,
        orientation: Option<UnitQuaternion<f32>>,
    ) -> Result<Vec<f32>, SimError>;

    fn set_link_friction(
        &mut self,
        body: BodyId,
        link: usize,
        lateral: f32,
        spinning: f32,
    ) -> Result<(), SimError>;

    /// Advance the simulation by one timestep.
    fn advance(&mut self) -> Result<(), SimError>;

    fn set_gravity(&mut self, gravity: Vector3<f32>) -> Result<(), SimError>;

    fn set_timestep(&mut self, timestep: f64) -> Result<(), SimError>;

    fn set_rendering(&mut self, enabled: bool) -> Result<(), SimError>;

    /// Remove every body and restart the clock.
    fn reset_simulation(&mut self) -> Result<(), SimError>;

    fn configure_debug_camera(&mut self, camera: &CameraConfig) -> Result<(), SimError>;

    /// Release the simulator. Every later call fails with
    /// [`SimError::Disconnected`].
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the trait is object-safe (can be used as `dyn SimulationBackend`).
    #[test]
    fn trait_is_object_safe() {
        fn _accepts_boxed(_: Box<dyn SimulationBackend>) {}
    }

    /// Backend that owns nothing and is always disconnected.
    struct DeadBackend;

    impl SimulationBackend for DeadBackend {
        fn load_body(&mut self, _: &Path, _: Vector3<f32>, _: bool) -> Result<BodyId, SimError> {
            Err(SimError::Disconnected)
        }
        fn body_pose(&self, body: BodyId) -> Result<Pose, SimError> {
            Err(SimError::UnknownBody(body))
        }
        fn set_body_pose(&mut self, body: BodyId, _: Pose) -> Result<(), SimError> {
            Err(SimError::UnknownBody(body))
        }
        fn link_state(&self, body: BodyId, _: usize, _: bool) -> Result<LinkState, SimError> {
            Err(SimError::UnknownBody(body))
        }
        fn joint_angle(&self, body: BodyId, _: usize) -> Result<f32, SimError> {
            Err(SimError::UnknownBody(body))
        }
        fn set_joint_angle(&mut self, body: BodyId, _: usize, _: f32) -> Result<(), SimError> {
            Err(SimError::UnknownBody(body))
        }
        fn set_joint_motor_targets(
            &mut self,
            body: BodyId,
            _: &[usize],
            _: &[f32],
        ) -> Result<(), SimError> {
            Err(SimError::UnknownBody(body))
        }
        fn solve_inverse_kinematics(
            &self,
            body: BodyId,
            _: usize,
            _: Vector3<f32>,
            _: Option<UnitQuaternion<f32>>,
        ) -> Result<Vec<f32>, SimError> {
            Err(SimError::UnknownBody(body))
        }
        fn set_link_friction(&mut self, body: BodyId, _: usize, _: f32, _: f32) -> Result<(), SimError> {
            Err(SimError::UnknownBody(body))
        }
        fn advance(&mut self) -> Result<(), SimError> {
            Err(SimError::Disconnected)
        }
        fn set_gravity(&mut self, _: Vector3<f32>) -> Result<(), SimError> {
            Err(SimError::Disconnected)
        }
        fn set_timestep(&mut self, _: f64) -> Result<(), SimError> {
            Err(SimError::Disconnected)
        }
        fn set_rendering(&mut self, _: bool) -> Result<(), SimError> {
            Err(SimError::Disconnected)
        }
        fn reset_simulation(&mut self) -> Result<(), SimError> {
            Err(SimError::Disconnected)
        }
        fn configure_debug_camera(&mut self, _: &CameraConfig) -> Result<(), SimError> {
            Err(SimError::Disconnected)
        }
        fn disconnect(&mut self) {}
        fn is_connected(&self) -> bool {
            false
        }
    }

    #[test]
    fn dead_backend_can_be_boxed() {
        let mut b: Box<dyn SimulationBackend> = Box::new(DeadBackend);
        assert!(!b.is_connected());
        assert!(matches!(b.advance(), Err(SimError::Disconnected)));
        assert!(matches!(
            b.body_pose(BodyId(4)),
            Err(SimError::UnknownBody(BodyId(4)))
        ));
    }
}
