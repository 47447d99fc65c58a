//! Scene composition, observation assembly and task scoring.

use nalgebra::Vector3;
use neuro_core::config::{CameraConfig, SceneConfig};
use neuro_core::error::EntityError;
use neuro_core::types::{GoalObservation, Observation, StepInfo};
use neuro_sim::backend::SimulationBackend;
use tracing::info;

use crate::bodies::StaticBody;
use crate::entity::SimEntity;
use crate::goal::Goal;
use crate::robot::{ROBOT_OBSERVATION_DIM, Robot};

/// Length of the flat observation vector: robot state plus achieved goal.
pub const OBSERVATION_DIM: usize = ROBOT_OBSERVATION_DIM + GOAL_DIM;

/// Length of the achieved and desired goal vectors.
pub const GOAL_DIM: usize = 3;

/// Robot, goal and scenery for the reach task.
#[derive(Debug)]
pub struct World {
    robot: Robot,
    goal: Goal,
    plane: StaticBody,
    table: StaticBody,
    tray: Option<StaticBody>,
    camera: CameraConfig,
    distance_threshold: f32,
}

impl World {
    /// Load every body in order (robot, goal, plane, table, tray), then
    /// place the debug camera.
    pub fn build<B: SimulationBackend + ?Sized>(
        backend: &mut B,
        config: &SceneConfig,
    ) -> Result<Self, EntityError> {
        let mut world = Self {
            robot: Robot::new(config.robot.clone()),
            goal: Goal::new(config.goal.clone()),
            plane: StaticBody::plane(config.plane.clone()),
            table: StaticBody::table(config.table.clone()),
            tray: config.tray.clone().map(StaticBody::tray),
            camera: config.camera.clone(),
            distance_threshold: config.episode.distance_threshold,
        };
        world.robot.load(backend)?;
        world.goal.load(backend)?;
        world.plane.load(backend)?;
        world.table.load(backend)?;
        if let Some(tray) = world.tray.as_mut() {
            tray.load(backend)?;
        }
        backend.configure_debug_camera(&world.camera)?;
        info!(tray = world.tray.is_some(), "world built");
        Ok(world)
    }

    pub const fn robot(&self) -> &Robot {
        &self.robot
    }

    pub const fn goal(&self) -> &Goal {
        &self.goal
    }

    pub const fn goal_mut(&mut self) -> &mut Goal {
        &mut self.goal
    }

    pub const fn tray(&self) -> Option<&StaticBody> {
        self.tray.as_ref()
    }

    pub const fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    /// Neutral robot, goal body back at its start.
    pub fn reset<B: SimulationBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), EntityError> {
        self.robot.reset(backend)?;
        self.goal.reset(backend, false)
    }

    /// Fails with [`EntityError::GoalNotSampled`] before the first reset.
    pub fn observe<B: SimulationBackend + ?Sized>(&self, backend: &B) -> Result<GoalObservation, EntityError> {
        let desired = self.goal.desired_goal().ok_or(EntityError::GoalNotSampled)?;
        let robot = self.robot.observation(backend)?;
        let achieved_goal = self.goal.observation(backend)?;

        let mut data = Vec::with_capacity(OBSERVATION_DIM);
        data.extend_from_slice(&robot);
        data.extend_from_slice(&achieved_goal);
        Ok(GoalObservation {
            observation: Observation::new(data),
            achieved_goal,
            desired_goal: [desired.x, desired.y, desired.z],
        })
    }

    /// Sparse reward: `0` inside the success radius, `-1` outside.
    pub fn reward(&self, achieved: &[f32; 3], desired: &[f32; 3]) -> f32 {
        if self.is_success(achieved, desired) {
            0.0
        } else {
            -1.0
        }
    }

    pub fn is_success(&self, achieved: &[f32; 3], desired: &[f32; 3]) -> bool {
        distance(achieved, desired) < self.distance_threshold
    }

    pub const fn done(&self, info: &StepInfo) -> bool {
        info.is_success
    }
}

/// Euclidean distance between two points.
pub fn distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    (Vector3::from(*a) - Vector3::from(*b)).norm()
}

/// Elementwise `|a - b| <= atol + rtol * |b|`.
pub fn all_close(a: &[f32; 3], b: &[f32; 3], rtol: f32, atol: f32) -> bool {
    a.iter()
        .zip(b)
        .all(|(x, y)| (x - y).abs() <= rtol.mul_add(y.abs(), atol))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use neuro_core::error::SimError;
    use neuro_test_utils::{BackendCall, FailPoint, RecordingBackend, scene, seeded_rng};

    fn built(backend: &mut RecordingBackend) -> World {
        let mut world = World::build(backend, &scene::panda_scene()).unwrap();
        world.goal_mut().set_rng(seeded_rng(0));
        world
    }

    // -- Build --

    #[test]
    fn build_loads_in_order_then_camera() {
        let mut backend = RecordingBackend::new();
        let world = built(&mut backend);
        let loaded: Vec<String> = backend
            .calls()
            .iter()
            .filter_map(|call| match call {
                BackendCall::LoadBody { path, .. } => {
                    Some(path.file_name()?.to_string_lossy().into_owned())
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            loaded,
            vec!["panda.urdf", "goal.urdf", "plane.urdf", "table.urdf", "tray.urdf"]
        );
        assert!(matches!(
            backend.calls().last(),
            Some(BackendCall::ConfigureCamera(_))
        ));
        assert!(world.tray().is_some());
        assert_eq!(world.robot().body_id(), Some(neuro_core::types::BodyId(0)));
    }

    #[test]
    fn build_without_tray() {
        let mut backend = RecordingBackend::new();
        let mut config = scene::panda_scene();
        config.tray = None;
        let world = World::build(&mut backend, &config).unwrap();
        assert!(world.tray().is_none());
        assert_eq!(backend.body_count(), 4);
    }

    #[test]
    fn build_surfaces_load_failure() {
        let mut backend = RecordingBackend::new();
        backend.fail_at(FailPoint::Load);
        let err = World::build(&mut backend, &scene::panda_scene()).unwrap_err();
        assert!(matches!(err, EntityError::Sim(SimError::LoadFailed { .. })));
    }

    // -- Observation --

    #[test]
    fn observation_concatenates_robot_and_goal() {
        let mut backend = RecordingBackend::new();
        backend.set_link_position(11, Vector3::new(0.3, 0.1, 0.2));
        let mut world = built(&mut backend);
        world.reset(&mut backend).unwrap();

        let obs = world.observe(&backend).unwrap();
        assert_eq!(obs.observation.len(), OBSERVATION_DIM);
        assert_relative_eq!(obs.observation[0], 0.3);
        assert_eq!(&obs.observation.as_slice()[7..], &obs.achieved_goal);
        assert_eq!(obs.achieved_goal, [0.6, 0.0, 0.02]);
        let desired = world.goal().desired_goal().unwrap();
        assert_eq!(obs.desired_goal, [desired.x, desired.y, desired.z]);
    }

    #[test]
    fn observation_before_reset_fails() {
        let mut backend = RecordingBackend::new();
        let world = built(&mut backend);
        let err = world.observe(&backend).unwrap_err();
        assert!(matches!(err, EntityError::GoalNotSampled));
    }

    // -- Scoring --

    #[test]
    fn reward_and_success_agree() {
        let mut backend = RecordingBackend::new();
        let world = built(&mut backend);
        let goal = [0.5, 0.0, 0.1];
        let cases = [
            ([0.5, 0.0, 0.1], true),
            ([0.5, 0.049, 0.1], true),
            ([0.5, 0.051, 0.1], false),
            ([0.0, 0.0, 0.0], false),
        ];
        for (achieved, success) in cases {
            assert_eq!(world.is_success(&achieved, &goal), success);
            let expected = if success { 0.0 } else { -1.0 };
            assert_relative_eq!(world.reward(&achieved, &goal), expected);
        }

        // Exactly on the threshold is outside the success radius.
        let (origin, edge) = ([0.0, 0.0, 0.0], [0.05, 0.0, 0.0]);
        assert!(!world.is_success(&origin, &edge));
        assert_relative_eq!(world.reward(&origin, &edge), -1.0);
    }

    #[test]
    fn done_follows_success() {
        let mut backend = RecordingBackend::new();
        let world = built(&mut backend);
        let mut info = StepInfo::default();
        assert!(!world.done(&info));
        info.is_success = true;
        assert!(world.done(&info));
    }

    #[test]
    fn all_close_tolerances() {
        assert!(all_close(&[0.6, 0.0, 0.02], &[0.6, 0.04, 0.02], 0.1, 0.05));
        assert!(!all_close(&[0.6, 0.0, 0.02], &[0.6, 0.06, 0.02], 0.1, 0.05));
        // Relative term scales with the second argument.
        assert!(all_close(&[1.0, 0.0, 0.0], &[1.14, 0.0, 0.0], 0.1, 0.05));
    }

    #[test]
    fn distance_is_euclidean() {
        assert_relative_eq!(distance(&[0.0, 3.0, 0.0], &[4.0, 0.0, 0.0]), 5.0);
    }
}
