//! Recording simulation backend for unit tests.
//!
//! [`RecordingBackend`] keeps just enough state to answer queries (body
//! poses, joint angles, scripted link states) and logs every mutating call
//! so tests can assert on the exact command sequence.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use nalgebra::{UnitQuaternion, Vector3};
use neuro_core::config::CameraConfig;
use neuro_core::error::SimError;
use neuro_core::types::BodyId;
use neuro_sim::backend::{LinkState, SimulationBackend};
use neuro_sim::pose::Pose;

// ---------------------------------------------------------------------------
// BackendCall
// ---------------------------------------------------------------------------

/// One mutating call received by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    LoadBody {
        path: PathBuf,
        position: Vector3<f32>,
        fixed_base: bool,
    },
    SetBodyPose {
        body: BodyId,
        pose: Pose,
    },
    SetJointAngle {
        body: BodyId,
        joint: usize,
        angle: f32,
    },
    SetMotorTargets {
        body: BodyId,
        joints: Vec<usize>,
        targets: Vec<f32>,
    },
    SetLinkFriction {
        body: BodyId,
        link: usize,
        lateral: f32,
        spinning: f32,
    },
    Advance,
    SetGravity(Vector3<f32>),
    SetTimestep(f64),
    SetRendering(bool),
    ResetSimulation,
    ConfigureCamera(CameraConfig),
    Disconnect,
}

/// Operation made to fail by [`RecordingBackend::fail_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Load,
    JointWrite,
    Advance,
}

/// IK request as `(link, position, orientation)`.
pub type IkRequest = (usize, Vector3<f32>, Option<UnitQuaternion<f32>>);

// ---------------------------------------------------------------------------
// RecordingBackend
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    bodies: Vec<Pose>,
    joints: BTreeMap<usize, f32>,
    link_positions: HashMap<usize, Vector3<f32>>,
    link_velocities: HashMap<usize, Vector3<f32>>,
    ik_solution: Option<Vec<f32>>,
    ik_requests: RefCell<Vec<IkRequest>>,
    fail_at: Option<FailPoint>,
    rendering: bool,
    connected: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            bodies: Vec::new(),
            joints: BTreeMap::new(),
            link_positions: HashMap::new(),
            link_velocities: HashMap::new(),
            ik_solution: None,
            ik_requests: RefCell::new(Vec::new()),
            fail_at: None,
            rendering: true,
            connected: true,
        }
    }

    // -- Scripting --

    /// Fixed position reported for `link` on every body.
    pub fn set_link_position(&mut self, link: usize, position: Vector3<f32>) {
        self.link_positions.insert(link, position);
    }

    pub fn set_link_velocity(&mut self, link: usize, velocity: Vector3<f32>) {
        self.link_velocities.insert(link, velocity);
    }

    /// Write a joint angle without recording a call.
    pub fn set_joint(&mut self, joint: usize, angle: f32) {
        self.joints.insert(joint, angle);
    }

    /// Answer every IK request with `solution`. Without one, IK returns the
    /// current angles of every joint written so far, in index order.
    pub fn set_ik_solution(&mut self, solution: Vec<f32>) {
        self.ik_solution = Some(solution);
    }

    pub const fn fail_at(&mut self, point: FailPoint) {
        self.fail_at = Some(point);
    }

    pub const fn clear_failure(&mut self) {
        self.fail_at = None;
    }

    // -- Inspection --

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count_calls(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn last_ik_request(&self) -> Option<IkRequest> {
        self.ik_requests.borrow().last().copied()
    }

    pub const fn rendering_enabled(&self) -> bool {
        self.rendering
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn check(&self, point: FailPoint) -> Result<(), SimError> {
        if !self.connected {
            return Err(SimError::Disconnected);
        }
        if self.fail_at == Some(point) {
            return Err(SimError::Disconnected);
        }
        Ok(())
    }

    fn connected(&self) -> Result<(), SimError> {
        if self.connected {
            Ok(())
        } else {
            Err(SimError::Disconnected)
        }
    }

    fn body_index(&self, body: BodyId) -> Result<usize, SimError> {
        self.connected()?;
        let index = body.0 as usize;
        if index < self.bodies.len() {
            Ok(index)
        } else {
            Err(SimError::UnknownBody(body))
        }
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBackend for RecordingBackend {
    fn load_body(
        &mut self,
        description: &Path,
        position: Vector3<f32>,
        fixed_base: bool,
    ) -> Result<BodyId, SimError> {
        self.connected()?;
        if self.fail_at == Some(FailPoint::Load) {
            return Err(SimError::LoadFailed {
                path: description.to_path_buf(),
                reason: "injected failure".into(),
            });
        }
        self.calls.push(BackendCall::LoadBody {
            path: description.to_path_buf(),
            position,
            fixed_base,
        });
        let id = BodyId(u32::try_from(self.bodies.len()).unwrap_or(u32::MAX));
        self.bodies.push(Pose::from_position(position));
        Ok(id)
    }

    fn body_pose(&self, body: BodyId) -> Result<Pose, SimError> {
        Ok(self.bodies[self.body_index(body)?])
    }

    fn set_body_pose(&mut self, body: BodyId, pose: Pose) -> Result<(), SimError> {
        let index = self.body_index(body)?;
        self.bodies[index] = pose;
        self.calls.push(BackendCall::SetBodyPose { body, pose });
        Ok(())
    }

    fn link_state(
        &self,
        body: BodyId,
        link: usize,
        want_velocity: bool,
    ) -> Result<LinkState, SimError> {
        self.body_index(body)?;
        Ok(LinkState {
            position: self.link_positions.get(&link).copied().unwrap_or_else(Vector3::zeros),
            orientation: UnitQuaternion::identity(),
            linear_velocity: want_velocity
                .then(|| self.link_velocities.get(&link).copied().unwrap_or_else(Vector3::zeros)),
        })
    }

    fn joint_angle(&self, body: BodyId, joint: usize) -> Result<f32, SimError> {
        self.body_index(body)?;
        Ok(self.joints.get(&joint).copied().unwrap_or(0.0))
    }

    fn set_joint_angle(&mut self, body: BodyId, joint: usize, angle: f32) -> Result<(), SimError> {
        self.body_index(body)?;
        if self.fail_at == Some(FailPoint::JointWrite) {
            return Err(SimError::UnknownJoint { body, joint });
        }
        self.joints.insert(joint, angle);
        self.calls.push(BackendCall::SetJointAngle { body, joint, angle });
        Ok(())
    }

    fn set_joint_motor_targets(
        &mut self,
        body: BodyId,
        joints: &[usize],
        targets: &[f32],
    ) -> Result<(), SimError> {
        self.body_index(body)?;
        if joints.len() != targets.len() {
            return Err(SimError::MotorCommandMismatch {
                joints: joints.len(),
                targets: targets.len(),
            });
        }
        self.calls.push(BackendCall::SetMotorTargets {
            body,
            joints: joints.to_vec(),
            targets: targets.to_vec(),
        });
        Ok(())
    }

    fn solve_inverse_kinematics(
        &self,
        body: BodyId,
        link: usize,
        position: Vector3<f32>,
        orientation: Option<UnitQuaternion<f32>>,
    ) -> Result<Vec<f32>, SimError> {
        self.body_index(body)?;
        self.ik_requests
            .borrow_mut()
            .push((link, position, orientation));
        Ok(self
            .ik_solution
            .clone()
            .unwrap_or_else(|| self.joints.values().copied().collect()))
    }

    fn set_link_friction(
        &mut self,
        body: BodyId,
        link: usize,
        lateral: f32,
        spinning: f32,
    ) -> Result<(), SimError> {
        self.body_index(body)?;
        self.calls.push(BackendCall::SetLinkFriction {
            body,
            link,
            lateral,
            spinning,
        });
        Ok(())
    }

    fn advance(&mut self) -> Result<(), SimError> {
        self.check(FailPoint::Advance)?;
        self.calls.push(BackendCall::Advance);
        Ok(())
    }

    fn set_gravity(&mut self, gravity: Vector3<f32>) -> Result<(), SimError> {
        self.connected()?;
        self.calls.push(BackendCall::SetGravity(gravity));
        Ok(())
    }

    fn set_timestep(&mut self, timestep: f64) -> Result<(), SimError> {
        self.connected()?;
        self.calls.push(BackendCall::SetTimestep(timestep));
        Ok(())
    }

    fn set_rendering(&mut self, enabled: bool) -> Result<(), SimError> {
        self.connected()?;
        self.rendering = enabled;
        self.calls.push(BackendCall::SetRendering(enabled));
        Ok(())
    }

    fn reset_simulation(&mut self) -> Result<(), SimError> {
        self.connected()?;
        self.bodies.clear();
        self.joints.clear();
        self.calls.push(BackendCall::ResetSimulation);
        Ok(())
    }

    fn configure_debug_camera(&mut self, camera: &CameraConfig) -> Result<(), SimError> {
        self.connected()?;
        self.calls.push(BackendCall::ConfigureCamera(camera.clone()));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.calls.push(BackendCall::Disconnect);
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let mut backend = RecordingBackend::new();
        let id = backend
            .load_body(Path::new("a.urdf"), Vector3::zeros(), true)
            .unwrap();
        backend.set_joint_angle(id, 3, 0.5).unwrap();
        backend.advance().unwrap();
        assert_eq!(backend.calls().len(), 3);
        assert!(matches!(backend.calls()[1], BackendCall::SetJointAngle { joint: 3, .. }));
        assert_eq!(backend.count_calls(|c| matches!(c, BackendCall::Advance)), 1);
    }

    #[test]
    fn poses_are_stored() {
        let mut backend = RecordingBackend::new();
        let id = backend
            .load_body(Path::new("a.urdf"), Vector3::new(1.0, 2.0, 3.0), false)
            .unwrap();
        assert_eq!(backend.body_pose(id).unwrap().position, Vector3::new(1.0, 2.0, 3.0));
        assert!(matches!(
            backend.body_pose(BodyId(9)),
            Err(SimError::UnknownBody(BodyId(9)))
        ));
    }

    #[test]
    fn default_ik_echoes_joint_angles() {
        let mut backend = RecordingBackend::new();
        let id = backend.load_body(Path::new("a.urdf"), Vector3::zeros(), true).unwrap();
        backend.set_joint(1, 0.2);
        backend.set_joint(0, 0.1);
        let q = backend
            .solve_inverse_kinematics(id, 11, Vector3::x(), None)
            .unwrap();
        assert_eq!(q, vec![0.1, 0.2]);
        assert_eq!(backend.last_ik_request().unwrap().0, 11);
    }

    #[test]
    fn injected_failures() {
        let mut backend = RecordingBackend::new();
        backend.fail_at(FailPoint::Load);
        assert!(backend.load_body(Path::new("a.urdf"), Vector3::zeros(), true).is_err());
        backend.clear_failure();
        let id = backend.load_body(Path::new("a.urdf"), Vector3::zeros(), true).unwrap();
        backend.fail_at(FailPoint::JointWrite);
        assert!(backend.set_joint_angle(id, 0, 0.0).is_err());
        backend.fail_at(FailPoint::Advance);
        assert!(backend.advance().is_err());
    }

    #[test]
    fn disconnect_rejects_calls() {
        let mut backend = RecordingBackend::new();
        backend.disconnect();
        assert!(!backend.is_connected());
        assert!(matches!(backend.set_rendering(false), Err(SimError::Disconnected)));
    }
}
