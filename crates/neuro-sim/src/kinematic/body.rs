//! Per-body state held by the kinematic backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use neuro_core::error::SimError;
use neuro_core::types::BodyId;
use neuro_ik::KinematicChain;
use neuro_urdf::{JointData, RobotModel};

use crate::backend::LinkState;
use crate::pose::Pose;

// ---------------------------------------------------------------------------
// FrictionCoefficients
// ---------------------------------------------------------------------------

/// Contact friction recorded for a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionCoefficients {
    pub lateral: f32,
    pub spinning: f32,
}

// ---------------------------------------------------------------------------
// BodyState
// ---------------------------------------------------------------------------

/// A loaded body: its model, base pose, joint state and motor targets.
///
/// All joint-indexed vectors have one slot per model joint, fixed joints
/// included, so indices match the description file.
#[derive(Debug, Clone)]
pub struct BodyState {
    pub description: PathBuf,
    pub model: RobotModel,
    pub fixed_base: bool,
    pub base: Isometry3<f32>,
    pub q: Vec<f32>,
    pub qdot: Vec<f32>,
    pub motor_targets: Vec<Option<f32>>,
    pub friction: HashMap<usize, FrictionCoefficients>,
    /// Chain from the root to each link, indexed like the joints.
    link_chains: Vec<KinematicChain>,
}

impl BodyState {
    pub fn load(description: &Path, position: Vector3<f32>, fixed_base: bool) -> Result<Self, SimError> {
        let load_failed = |reason: String| SimError::LoadFailed {
            path: description.to_path_buf(),
            reason,
        };
        let model = neuro_urdf::parse_file(description).map_err(|e| load_failed(e.to_string()))?;
        let link_chains = (0..model.joints.len())
            .map(|joint| KinematicChain::ending_at_joint(&model, joint))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| load_failed(e.to_string()))?;

        let n = model.joints.len();
        Ok(Self {
            description: description.to_path_buf(),
            model,
            fixed_base,
            base: Isometry3::from_parts(Translation3::from(position), UnitQuaternion::identity()),
            q: vec![0.0; n],
            qdot: vec![0.0; n],
            motor_targets: vec![None; n],
            friction: HashMap::new(),
            link_chains,
        })
    }

    pub fn joint_count(&self) -> usize {
        self.q.len()
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.base.translation.vector,
            orientation: self.base.rotation,
        }
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.base = Isometry3::from_parts(Translation3::from(pose.position), pose.orientation);
    }

    pub fn joint(&self, id: BodyId, joint: usize) -> Result<&JointData, SimError> {
        self.model
            .joints
            .get(joint)
            .ok_or(SimError::UnknownJoint { body: id, joint })
    }

    pub fn actuated_joint(&self, id: BodyId, joint: usize) -> Result<&JointData, SimError> {
        let data = self.joint(id, joint)?;
        if data.joint_type.is_actuated() {
            Ok(data)
        } else {
            Err(SimError::JointNotActuated { body: id, joint })
        }
    }

    pub fn chain(&self, id: BodyId, link: usize) -> Result<&KinematicChain, SimError> {
        self.link_chains
            .get(link)
            .ok_or(SimError::UnknownLink { body: id, link })
    }

    /// World-frame state of `link`.
    pub fn link_state(&self, id: BodyId, link: usize, want_velocity: bool) -> Result<LinkState, SimError> {
        let chain = self.chain(id, link)?;
        let q = chain.gather(&self.q);
        let tip = self.base * chain.forward_kinematics(&q);
        let linear_velocity = want_velocity.then(|| {
            let qdot = chain.gather(&self.qdot);
            self.base.rotation * chain.tip_linear_velocity(&q, &qdot)
        });
        Ok(LinkState {
            position: tip.translation.vector,
            orientation: tip.rotation,
            linear_velocity,
        })
    }

    /// Move every commanded joint toward its target for `dt` seconds.
    ///
    /// Joints travel at most their velocity limit; a zero limit reaches the
    /// target in one step. Uncommanded joints hold still.
    pub fn integrate(&mut self, dt: f32) {
        for (index, joint) in self.model.joints.iter().enumerate() {
            let Some(target) = self.motor_targets[index] else {
                self.qdot[index] = 0.0;
                continue;
            };
            let error = target - self.q[index];
            let max_step = if joint.limits.velocity > 0.0 {
                joint.limits.velocity * dt
            } else {
                f32::INFINITY
            };
            let delta = error.clamp(-max_step, max_step);
            self.q[index] += delta;
            self.qdot[index] = if dt > 0.0 { delta / dt } else { 0.0 };
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn panda() -> BodyState {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/urdf/panda.urdf"));
        BodyState::load(path, Vector3::zeros(), true).unwrap()
    }

    #[test]
    fn load_allocates_one_slot_per_joint() {
        let body = panda();
        assert_eq!(body.joint_count(), 12);
        assert_eq!(body.motor_targets.len(), 12);
        assert!(body.motor_targets.iter().all(Option::is_none));
    }

    #[test]
    fn load_missing_file_fails() {
        let err = BodyState::load(Path::new("/nonexistent/robot.urdf"), Vector3::zeros(), true)
            .unwrap_err();
        assert!(matches!(err, SimError::LoadFailed { .. }));
    }

    #[test]
    fn fixed_joint_is_not_actuated() {
        let body = panda();
        let err = body.actuated_joint(BodyId(0), 7).unwrap_err();
        assert!(matches!(err, SimError::JointNotActuated { joint: 7, .. }));
        assert!(body.actuated_joint(BodyId(0), 9).is_ok());
        assert!(matches!(
            body.joint(BodyId(0), 12).unwrap_err(),
            SimError::UnknownJoint { joint: 12, .. }
        ));
    }

    #[test]
    fn integrate_respects_velocity_limit() {
        let mut body = panda();
        body.motor_targets[0] = Some(1.0);
        body.integrate(0.1);
        assert_relative_eq!(body.q[0], 0.2175, epsilon = 1e-6);
        assert_relative_eq!(body.qdot[0], 2.175, epsilon = 1e-4);
        assert_relative_eq!(body.qdot[1], 0.0);
    }

    #[test]
    fn integrate_settles_on_target() {
        let mut body = panda();
        body.motor_targets[9] = Some(0.01);
        for _ in 0..10 {
            body.integrate(0.04);
        }
        assert_relative_eq!(body.q[9], 0.01, epsilon = 1e-6);
        assert_relative_eq!(body.qdot[9], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn base_offset_moves_links() {
        let mut body = panda();
        let at_origin = body.link_state(BodyId(0), 0, false).unwrap().position;
        body.set_pose(Pose::from_position(Vector3::new(1.0, 0.0, 0.0)));
        let shifted = body.link_state(BodyId(0), 0, false).unwrap().position;
        assert_relative_eq!(shifted - at_origin, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(at_origin, Vector3::new(0.0, 0.0, 0.333), epsilon = 1e-6);
    }
}
