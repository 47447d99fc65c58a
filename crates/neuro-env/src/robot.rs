//! Arm-and-gripper controller.
//!
//! Turns a normalized 4-component action (effector displacement plus
//! gripper opening) into position targets for every control joint, using
//! the backend's IK for the arm.

use nalgebra::{UnitQuaternion, Vector3};
use neuro_core::config::RobotConfig;
use neuro_core::error::EntityError;
use neuro_core::types::BodyId;
use neuro_sim::backend::SimulationBackend;
use neuro_sim::pose::Orientation;
use tracing::trace;

use crate::entity::{SimEntity, load_description};

/// Gripper pointing straight down, as `[x, y, z, w]`.
pub const DOWNWARD_ORIENTATION: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// Length of [`Robot::observation`].
pub const ROBOT_OBSERVATION_DIM: usize = 7;

#[derive(Debug, Clone)]
pub struct Robot {
    config: RobotConfig,
    body: Option<BodyId>,
}

impl Robot {
    pub const fn new(config: RobotConfig) -> Self {
        Self { config, body: None }
    }

    pub const fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Put every control joint at its neutral angle, then set gripper friction.
    pub fn reset<B: SimulationBackend + ?Sized>(&self, backend: &mut B) -> Result<(), EntityError> {
        let id = self.loaded_id()?;
        for (&joint, &angle) in self
            .config
            .control_joint_ids
            .iter()
            .zip(&self.config.control_joint_neutral_angles)
        {
            backend.set_joint_angle(id, joint, angle)?;
        }
        for link in self.config.effector_joint_ids {
            backend.set_link_friction(
                id,
                link,
                self.config.lateral_friction,
                self.config.spinning_friction,
            )?;
        }
        Ok(())
    }

    /// Command the joints for one already-clipped action.
    pub fn act<B: SimulationBackend + ?Sized>(
        &self,
        backend: &mut B,
        action: [f32; 4],
    ) -> Result<(), EntityError> {
        let id = self.loaded_id()?;

        let arm_targets = self.arm_targets(backend, id, [action[0], action[1], action[2]])?;
        let width = self.finger_width(backend)? + action[3] * self.config.effector_displacement_limit;
        let finger_target = width / 2.0;

        let mut targets = arm_targets;
        targets.extend([finger_target, finger_target]);
        trace!(?targets, "robot command");
        backend.set_joint_motor_targets(id, &self.config.control_joint_ids, &targets)?;
        Ok(())
    }

    /// IK targets for the arm joints after displacing the effector.
    fn arm_targets<B: SimulationBackend + ?Sized>(
        &self,
        backend: &B,
        id: BodyId,
        displacement: [f32; 3],
    ) -> Result<Vec<f32>, EntityError> {
        let mut target =
            self.effector_position(backend)? + Vector3::from(displacement) * self.config.ik_displacement_limit;
        target.z = target.z.max(0.0);

        let orientation: UnitQuaternion<f32> =
            Orientation::from(DOWNWARD_ORIENTATION).to_unit_quaternion();
        let mut angles =
            backend.solve_inverse_kinematics(id, self.config.effector_link_id, target, Some(orientation))?;
        angles.truncate(self.config.arm_joint_count());
        Ok(angles)
    }

    pub fn effector_position<B: SimulationBackend + ?Sized>(
        &self,
        backend: &B,
    ) -> Result<Vector3<f32>, EntityError> {
        let id = self.loaded_id()?;
        Ok(backend
            .link_state(id, self.config.effector_link_id, false)?
            .position)
    }

    pub fn effector_velocity<B: SimulationBackend + ?Sized>(
        &self,
        backend: &B,
    ) -> Result<Vector3<f32>, EntityError> {
        let id = self.loaded_id()?;
        let state = backend.link_state(id, self.config.effector_link_id, true)?;
        Ok(state.linear_velocity.unwrap_or_else(Vector3::zeros))
    }

    /// Sum of both finger joint positions.
    pub fn finger_width<B: SimulationBackend + ?Sized>(&self, backend: &B) -> Result<f32, EntityError> {
        let id = self.loaded_id()?;
        let [left, right] = self.config.effector_joint_ids;
        Ok(backend.joint_angle(id, left)? + backend.joint_angle(id, right)?)
    }

    /// Effector position, effector velocity, finger width.
    pub fn observation<B: SimulationBackend + ?Sized>(
        &self,
        backend: &B,
    ) -> Result<[f32; ROBOT_OBSERVATION_DIM], EntityError> {
        let p = self.effector_position(backend)?;
        let v = self.effector_velocity(backend)?;
        let width = self.finger_width(backend)?;
        Ok([p.x, p.y, p.z, v.x, v.y, v.z, width])
    }
}

impl SimEntity for Robot {
    fn name(&self) -> &'static str {
        "Robot"
    }

    fn body_id(&self) -> Option<BodyId> {
        self.body
    }

    fn load<B: SimulationBackend + ?Sized>(&mut self, backend: &mut B) -> Result<BodyId, EntityError> {
        let id = load_description(
            backend,
            self.name(),
            &self.config.description,
            self.config.init_position,
            true,
        )?;
        self.body = Some(id);
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
