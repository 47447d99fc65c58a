use std::path::Path;

use nalgebra::{UnitQuaternion, Vector3};
use neuro_core::config::CameraConfig;
use neuro_core::error::SimError;
use neuro_core::types::BodyId;
use neuro_ik::{DlsSolver, IkTarget};
use tracing::{debug, info};

use super::body::{BodyState, FrictionCoefficients};
use crate::backend::{LinkState, SimulationBackend};
use crate::pose::Pose;

/// Default simulator timestep before `set_timestep` is called.
const DEFAULT_TIMESTEP: f64 = 1.0 / 240.0;

// ---------------------------------------------------------------------------
// KinematicBackend
// ---------------------------------------------------------------------------

/// All simulator state in one struct; [`BodyId`]s index `bodies`.
#[derive(Debug)]
pub struct KinematicBackend {
    bodies: Vec<BodyState>,
    timestep: f64,
    gravity: Vector3<f32>,
    rendering: bool,
    connected: bool,
    camera: Option<CameraConfig>,
    steps: u64,
    solver: DlsSolver,
}

impl KinematicBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::with_solver(DlsSolver::default())
    }

    /// Backend using a custom IK solver.
    #[must_use]
    pub fn with_solver(solver: DlsSolver) -> Self {
        Self {
            bodies: Vec::new(),
            timestep: DEFAULT_TIMESTEP,
            gravity: Vector3::zeros(),
            rendering: true,
            connected: true,
            camera: None,
            steps: 0,
            solver,
        }
    }

    pub const fn rendering_enabled(&self) -> bool {
        self.rendering
    }

    pub const fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    pub const fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Number of `advance` calls since creation or the last reset.
    pub const fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub const fn debug_camera(&self) -> Option<&CameraConfig> {
        self.camera.as_ref()
    }

    pub fn link_friction(&self, body: BodyId, link: usize) -> Option<FrictionCoefficients> {
        self.body(body).ok()?.friction.get(&link).copied()
    }

    /// Pending position-control target of a joint.
    pub fn motor_target(&self, body: BodyId, joint: usize) -> Option<f32> {
        self.body(body).ok()?.motor_targets.get(joint).copied().flatten()
    }

    fn ensure_connected(&self) -> Result<(), SimError> {
        if self.connected {
            Ok(())
        } else {
            Err(SimError::Disconnected)
        }
    }

    fn body(&self, id: BodyId) -> Result<&BodyState, SimError> {
        self.ensure_connected()?;
        self.bodies
            .get(id.0 as usize)
            .ok_or(SimError::UnknownBody(id))
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut BodyState, SimError> {
        self.ensure_connected()?;
        self.bodies
            .get_mut(id.0 as usize)
            .ok_or(SimError::UnknownBody(id))
    }
}

impl Default for KinematicBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBackend for KinematicBackend {
    fn load_body(
        &mut self,
        description: &Path,
        position: Vector3<f32>,
        fixed_base: bool,
    ) -> Result<BodyId, SimError> {
        self.ensure_connected()?;
        let body = BodyState::load(description, position, fixed_base)?;
        let id = BodyId(u32::try_from(self.bodies.len()).map_err(|_| SimError::LoadFailed {
            path: description.to_path_buf(),
            reason: "body limit reached".into(),
        })?);
        info!(
            body = %id,
            name = %body.model.name,
            joints = body.joint_count(),
            "loaded body"
        );
        self.bodies.push(body);
        Ok(id)
    }

    fn body_pose(&self, body: BodyId) -> Result<Pose, SimError> {
        Ok(self.body(body)?.pose())
    }

    fn set_body_pose(&mut self, body: BodyId, pose: Pose) -> Result<(), SimError> {
        self.body_mut(body)?.set_pose(pose);
        Ok(())
    }

    fn link_state(
        &self,
        body: BodyId,
        link: usize,
        want_velocity: bool,
    ) -> Result<LinkState, SimError> {
        self.body(body)?.link_state(body, link, want_velocity)
    }

    fn joint_angle(&self, body: BodyId, joint: usize) -> Result<f32, SimError> {
        let state = self.body(body)?;
        state.joint(body, joint)?;
        Ok(state.q[joint])
    }

    fn set_joint_angle(
        &mut self,
        body: BodyId,
        joint: usize,
        angle: f32,
    ) -> Result<(), SimError> {
        let state = self.body_mut(body)?;
        state.actuated_joint(body, joint)?;
        state.q[joint] = angle;
        state.qdot[joint] = 0.0;
        state.motor_targets[joint] = None;
        Ok(())
    }

    fn set_joint_motor_targets(
        &mut self,
        body: BodyId,
        joints: &[usize],
        targets: &[f32],
    ) -> Result<(), SimError> {
        if joints.len() != targets.len() {
            return Err(SimError::MotorCommandMismatch {
                joints: joints.len(),
                targets: targets.len(),
            });
        }
        let state = self.body_mut(body)?;
        // Validate the whole command before applying any of it.
        let clamped = joints
            .iter()
            .zip(targets)
            .map(|(&joint, &target)| {
                state
                    .actuated_joint(body, joint)
                    .map(|data| (joint, data.limits.clamp(target)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (joint, target) in clamped {
            state.motor_targets[joint] = Some(target);
        }
        Ok(())
    }

    fn solve_inverse_kinematics(
        &self,
        body: BodyId,
        link: usize,
        position: Vector3<f32>,
        orientation: Option<UnitQuaternion<f32>>,
    ) -> Result<Vec<f32>, SimError> {
        let state = self.body(body)?;
        let chain = state.chain(body, link)?;

        let local_position = state.base.inverse_transform_point(&position.into()).coords;
        let local_orientation = orientation.map(|o| state.base.rotation.inverse() * o);
        let target = IkTarget::new(local_position, local_orientation);

        let result = self.solver.solve(chain, &target, &chain.gather(&state.q));
        if !result.converged {
            debug!(
                body = %body,
                link,
                iterations = result.iterations,
                position_error = result.position_error,
                orientation_error = result.orientation_error,
                "IK did not converge"
            );
        }

        let mut q = state.q.clone();
        for (joint, value) in chain.joints().iter().zip(&result.joint_positions) {
            q[joint.index] = *value;
        }
        Ok(state.model.actuated_joints().map(|(i, _)| q[i]).collect())
    }

    fn set_link_friction(
        &mut self,
        body: BodyId,
        link: usize,
        lateral: f32,
        spinning: f32,
    ) -> Result<(), SimError> {
        let state = self.body_mut(body)?;
        state.chain(body, link)?;
        state
            .friction
            .insert(link, FrictionCoefficients { lateral, spinning });
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn advance(&mut self) -> Result<(), SimError> {
        self.ensure_connected()?;
        let dt = self.timestep as f32;
        for body in &mut self.bodies {
            body.integrate(dt);
        }
        self.steps += 1;
        Ok(())
    }

    fn set_gravity(&mut self, gravity: Vector3<f32>) -> Result<(), SimError> {
        self.ensure_connected()?;
        self.gravity = gravity;
        Ok(())
    }

    fn set_timestep(&mut self, timestep: f64) -> Result<(), SimError> {
        self.ensure_connected()?;
        self.timestep = timestep;
        Ok(())
    }

    fn set_rendering(&mut self, enabled: bool) -> Result<(), SimError> {
        self.ensure_connected()?;
        self.rendering = enabled;
        Ok(())
    }

    fn reset_simulation(&mut self) -> Result<(), SimError> {
        self.ensure_connected()?;
        self.bodies.clear();
        self.steps = 0;
        Ok(())
    }

    fn configure_debug_camera(&mut self, camera: &CameraConfig) -> Result<(), SimError> {
        self.ensure_connected()?;
        self.camera = Some(camera.clone());
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connected {
            info!(bodies = self.bodies.len(), steps = self.steps, "backend disconnected");
        }
        self.connected = false;
        self.bodies.clear();
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
