//! Episode lifecycle against the recording backend.

use nalgebra::Vector3;
use neuro_core::error::{EntityError, EpisodeError, ValidationError};
use neuro_core::types::Action;
use neuro_env::entity::SimEntity;
use neuro_env::episode::EpisodeState;
use neuro_env::{NeuroRoboticsEnv, TimeLimit};
use neuro_sim::backend::SimulationBackend;
use neuro_sim::pose::Pose;
use neuro_test_utils::{BackendCall, FailPoint, RecordingBackend, scene};

fn env() -> NeuroRoboticsEnv<RecordingBackend> {
    NeuroRoboticsEnv::new(RecordingBackend::new(), scene::panda_scene()).unwrap()
}

fn running_env(seed: u64) -> NeuroRoboticsEnv<RecordingBackend> {
    let mut env = env();
    env.seed(Some(seed)).unwrap();
    env.reset().unwrap();
    env
}

fn advance_calls(env: &NeuroRoboticsEnv<RecordingBackend>) -> usize {
    env.backend()
        .count_calls(|c| matches!(c, BackendCall::Advance))
}

// ---------------------------------------------------------------------------
// Construction and seeding
// ---------------------------------------------------------------------------

#[test]
fn new_configures_simulator_before_loading() {
    let env = env();
    let calls = env.backend().calls();
    assert_eq!(calls[0], BackendCall::ResetSimulation);
    assert_eq!(calls[1], BackendCall::SetTimestep(0.002));
    assert!(matches!(calls[2], BackendCall::SetGravity(g) if (g.z + 9.81).abs() < 1e-6));
    assert!(matches!(calls[3], BackendCall::LoadBody { .. }));
    assert_eq!(env.state(), EpisodeState::Idle);
}

#[test]
fn reset_requires_seed() {
    let mut env = env();
    assert!(matches!(env.reset(), Err(EpisodeError::NotSeeded)));
}

#[test]
fn seed_returns_effective_seed() {
    let mut env = env();
    assert_eq!(env.seed(Some(42)).unwrap(), 42);
    assert_eq!(env.state(), EpisodeState::Ready);
}

#[test]
fn seed_falls_back_to_configured_seed() {
    let mut config = scene::panda_scene();
    config.episode.seed = Some(1234);
    let mut env = NeuroRoboticsEnv::new(RecordingBackend::new(), config).unwrap();
    assert_eq!(env.seed(None).unwrap(), 1234);
}

#[test]
fn step_before_reset_is_rejected() {
    let mut env = env();
    env.seed(Some(0)).unwrap();
    let err = env.step(&Action::zeros(4)).unwrap_err();
    assert!(matches!(err, EpisodeError::NotRunning { state: "ready" }));
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

#[test]
fn reset_pauses_and_restores_rendering() {
    let env = running_env(3);
    let toggles: Vec<bool> = env
        .backend()
        .calls()
        .iter()
        .filter_map(|c| match c {
            BackendCall::SetRendering(on) => Some(*on),
            _ => None,
        })
        .collect();
    assert_eq!(toggles, vec![false, true]);
    assert!(env.backend().rendering_enabled());
    assert_eq!(env.state(), EpisodeState::Running);
}

#[test]
fn failed_reset_reenables_rendering() {
    let mut env = env();
    env.seed(Some(3)).unwrap();
    env.backend_mut().fail_at(FailPoint::JointWrite);

    let err = env.reset().unwrap_err();
    assert!(matches!(
        err,
        EpisodeError::InitializationFailed(EntityError::Sim(_))
    ));
    assert!(env.backend().rendering_enabled());
    assert_eq!(env.state(), EpisodeState::Ready);

    env.backend_mut().clear_failure();
    assert!(env.reset().is_ok());
}

#[test]
fn reset_goal_is_not_trivially_solved() {
    for seed in 0..20 {
        let mut env = env();
        env.seed(Some(seed)).unwrap();
        let obs = env.reset().unwrap();
        let solved = obs
            .achieved_goal
            .iter()
            .zip(&obs.desired_goal)
            .all(|(a, d)| (a - d).abs() <= 0.05 + 0.1 * d.abs());
        assert!(!solved, "seed {seed}: {obs:?}");
        assert!(!env.world().is_success(&obs.achieved_goal, &obs.desired_goal));
    }
}

#[test]
fn resample_cap_is_enforced() {
    let mut config = scene::panda_scene();
    // Every desired goal lands on the goal body's start position.
    config.goal.goal_range_low = [0.6, 0.0, 0.0];
    config.goal.goal_range_high = [0.6, 0.0, 0.0];
    config.episode.max_reset_attempts = 5;
    let mut env = NeuroRoboticsEnv::new(RecordingBackend::new(), config).unwrap();
    env.seed(Some(0)).unwrap();

    let err = env.reset().unwrap_err();
    assert!(matches!(
        err,
        EpisodeError::ResampleLimitExceeded { attempts: 5 }
    ));
}

#[test]
fn reset_zeroes_step_counter() {
    let mut env = running_env(1);
    env.step(&Action::zeros(4)).unwrap();
    env.step(&Action::zeros(4)).unwrap();
    assert_eq!(env.episode().step_count, 2);
    env.reset().unwrap();
    assert_eq!(env.episode().step_count, 0);
    assert_eq!(env.episode().episode_number, 2);
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

#[test]
fn step_counts_and_advances_substeps() {
    let mut env = running_env(5);
    for expected in 1..=3 {
        let outcome = env.step(&Action::zeros(4)).unwrap();
        assert_eq!(outcome.info.episode_length, expected);
        assert_eq!(env.episode().step_count, expected);
    }
    assert_eq!(advance_calls(&env), 60);
}

#[test]
fn invalid_actions_are_rejected_without_counting() {
    let mut env = running_env(5);
    let err = env.step(&Action::zeros(3)).unwrap_err();
    assert!(matches!(
        err,
        EpisodeError::Validation(ValidationError::ActionDimMismatch {
            expected: 4,
            got: 3
        })
    ));
    let err = env
        .step(&Action::from([0.0, f32::NAN, 0.0, 0.0]))
        .unwrap_err();
    assert!(matches!(
        err,
        EpisodeError::Validation(ValidationError::ActionContainsNan)
    ));
    assert_eq!(env.episode().step_count, 0);
    assert_eq!(advance_calls(&env), 0);
}

#[test]
fn failure_reward_is_minus_one() {
    let mut env = running_env(8);
    let outcome = env.step(&Action::zeros(4)).unwrap();
    assert!(!outcome.info.is_success);
    assert!(!outcome.done);
    assert!((outcome.reward + 1.0).abs() < f32::EPSILON);
}

#[test]
fn reaching_the_goal_ends_the_episode() {
    let mut env = running_env(8);
    let desired = env.world().goal().desired_goal().unwrap();
    let goal_id = env.world().goal().body_id().unwrap();
    env.backend_mut()
        .set_body_pose(goal_id, Pose::from_position(desired + Vector3::new(0.01, 0.0, 0.0)))
        .unwrap();

    let outcome = env.step(&Action::zeros(4)).unwrap();
    assert!(outcome.info.is_success);
    assert!(outcome.done);
    assert!(outcome.reward.abs() < f32::EPSILON);
    assert_eq!(env.state(), EpisodeState::Success);

    let err = env.step(&Action::zeros(4)).unwrap_err();
    assert!(matches!(err, EpisodeError::NotRunning { state: "success" }));
}

#[test]
fn compute_reward_matches_threshold() {
    let env = env();
    assert!(env.compute_reward(&[0.0; 3], &[0.0, 0.0, 0.04]).abs() < f32::EPSILON);
    assert!((env.compute_reward(&[0.0; 3], &[0.0, 0.0, 0.06]) + 1.0).abs() < f32::EPSILON);
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

#[test]
fn spaces_and_dt() {
    let mut env = running_env(2);
    assert_eq!(env.action_space().shape(), vec![4]);
    let obs_space = env.observation_space().clone();
    assert_eq!(obs_space.get("observation").unwrap().shape(), vec![10]);
    assert_eq!(obs_space.get("desired_goal").unwrap().shape(), vec![3]);
    assert!((env.dt() - 0.04).abs() < 1e-12);

    let obs = env.reset().unwrap();
    assert!(obs_space.contains_goal_observation(&obs));
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

#[test]
fn close_disconnects_and_blocks_further_calls() {
    let mut env = running_env(4);
    env.close();
    assert!(!env.backend().is_connected());
    assert_eq!(env.state(), EpisodeState::Closed);
    assert!(matches!(env.reset(), Err(EpisodeError::Closed)));
    assert!(matches!(env.seed(Some(1)), Err(EpisodeError::Closed)));
    assert!(matches!(
        env.step(&Action::zeros(4)),
        Err(EpisodeError::Closed)
    ));
    // Closing twice is harmless.
    env.close();
    assert_eq!(
        env.backend()
            .count_calls(|c| matches!(c, BackendCall::Disconnect)),
        1
    );
}

// ---------------------------------------------------------------------------
// Time limit
// ---------------------------------------------------------------------------

#[test]
fn time_limit_truncates_at_budget() {
    let mut env = TimeLimit::new(env(), 3);
    env.seed(Some(6)).unwrap();
    env.reset().unwrap();

    for _ in 0..2 {
        let outcome = env.step(&Action::zeros(4)).unwrap();
        assert!(!outcome.info.truncated);
    }
    let outcome = env.step(&Action::zeros(4)).unwrap();
    assert!(outcome.info.truncated);
    assert!(!outcome.done);
    assert_eq!(env.env().state(), EpisodeState::Truncated);
    assert!(matches!(
        env.step(&Action::zeros(4)),
        Err(EpisodeError::NotRunning { state: "truncated" })
    ));

    env.reset().unwrap();
    assert_eq!(env.env().state(), EpisodeState::Running);
}

#[test]
fn time_limit_reads_configured_budget() {
    let env = TimeLimit::from_config(env());
    assert_eq!(env.max_episode_steps(), 50);
}
