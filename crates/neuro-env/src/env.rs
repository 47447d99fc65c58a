//! Seeded reset/step loop over a [`World`].

use nalgebra::Vector3;
use neuro_core::config::SceneConfig;
use neuro_core::error::{EpisodeError, NeuroError, SimError};
use neuro_core::seed::SeedHierarchy;
use neuro_core::types::{
    Action, ActionSpace, GoalObservation, ObservationSpace, StepInfo, StepOutcome,
};
use neuro_sim::backend::SimulationBackend;
use tracing::{debug, info, warn};

use crate::episode::{Episode, EpisodeState};
use crate::world::{GOAL_DIM, OBSERVATION_DIM, World, all_close};

/// Action layout: effector displacement (3) and gripper opening (1).
pub const ACTION_DIM: usize = 4;

/// Bound of every observation component.
pub const OBSERVATION_BOUND: f32 = 10.0;

/// Tolerances under which a fresh episode counts as already solved.
const TRIVIAL_RTOL: f32 = 0.1;
const TRIVIAL_ATOL: f32 = 0.05;

/// Name of the goal sampler's seed stream.
const GOAL_STREAM: &str = "goal";

// ---------------------------------------------------------------------------
// RenderingPaused
// ---------------------------------------------------------------------------

/// Disables rendering until dropped.
struct RenderingPaused<'a, B: SimulationBackend> {
    backend: &'a mut B,
}

impl<'a, B: SimulationBackend> RenderingPaused<'a, B> {
    fn new(backend: &'a mut B) -> Result<Self, SimError> {
        backend.set_rendering(false)?;
        Ok(Self { backend })
    }

    fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }
}

impl<B: SimulationBackend> Drop for RenderingPaused<'_, B> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.set_rendering(true) {
            warn!(error = %e, "failed to re-enable rendering");
        }
    }
}

// ---------------------------------------------------------------------------
// NeuroRoboticsEnv
// ---------------------------------------------------------------------------

/// Goal-conditioned reach environment with the seed/reset/step/close API.
pub struct NeuroRoboticsEnv<B: SimulationBackend> {
    backend: B,
    world: World,
    config: SceneConfig,
    episode: Episode,
    observation_space: ObservationSpace,
    action_space: ActionSpace,
}

impl<B: SimulationBackend> NeuroRoboticsEnv<B> {
    /// Validate `config`, configure the simulator and load the scene.
    pub fn new(mut backend: B, config: SceneConfig) -> Result<Self, NeuroError> {
        config.validate()?;

        backend.reset_simulation()?;
        backend.set_timestep(config.sim.timestep)?;
        backend.set_gravity(Vector3::from(config.sim.gravity))?;
        let world = World::build(&mut backend, &config)?;

        info!(
            timestep = config.sim.timestep,
            substeps = config.sim.substeps,
            "environment created"
        );
        Ok(Self {
            backend,
            world,
            config,
            episode: Episode::default(),
            observation_space: ObservationSpace::goal_conditioned(
                OBSERVATION_DIM,
                GOAL_DIM,
                OBSERVATION_BOUND,
            ),
            action_space: ActionSpace::normalized(ACTION_DIM),
        })
    }

    // -- Accessors --

    pub const fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    pub const fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    /// Seconds of simulated time per step.
    pub fn dt(&self) -> f64 {
        self.config.sim.control_dt()
    }

    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub const fn episode(&self) -> &Episode {
        &self.episode
    }

    pub const fn state(&self) -> EpisodeState {
        self.episode.state
    }

    pub const fn world(&self) -> &World {
        &self.world
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Direct backend access, e.g. to script body poses in tests.
    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // -- Lifecycle --

    /// Seed the goal sampler. `None` falls back to the configured seed,
    /// then to entropy. Returns the effective seed.
    pub fn seed(&mut self, seed: Option<u64>) -> Result<u64, EpisodeError> {
        self.ensure_open()?;
        let seeds = SeedHierarchy::from_optional(seed.or(self.config.episode.seed));
        self.world
            .goal_mut()
            .set_rng(seeds.subsystem_rng(GOAL_STREAM));
        self.episode.seeded(seeds.root());
        info!(seed = seeds.root(), "environment seeded");
        Ok(seeds.root())
    }

    /// Start a new episode and return its first observation.
    pub fn reset(&mut self) -> Result<GoalObservation, EpisodeError> {
        self.ensure_open()?;
        if self.episode.seed.is_none() {
            return Err(EpisodeError::NotSeeded);
        }
        self.episode.begin();
        match self.reset_world() {
            Ok(observation) => {
                debug!(
                    episode = self.episode.episode_number,
                    desired_goal = ?observation.desired_goal,
                    "episode started"
                );
                Ok(observation)
            }
            Err(e) => {
                self.episode.interrupt();
                Err(e)
            }
        }
    }

    fn reset_world(&mut self) -> Result<GoalObservation, EpisodeError> {
        {
            let mut paused = RenderingPaused::new(&mut self.backend)
                .map_err(|e| EpisodeError::InitializationFailed(e.into()))?;
            self.world
                .reset(paused.backend())
                .map_err(EpisodeError::InitializationFailed)?;
        }

        let mut observation = self.world.observe(&self.backend)?;
        let limit = self.config.episode.max_reset_attempts;
        let mut attempts = 0;
        while self.episode.step_count == 0 && self.trivially_solved(&observation) {
            if attempts == limit {
                return Err(EpisodeError::ResampleLimitExceeded { attempts });
            }
            let goal = self.world.goal_mut().sample_goal()?;
            observation.desired_goal = [goal.x, goal.y, goal.z];
            attempts += 1;
        }
        if attempts > 0 {
            debug!(attempts, "resampled desired goal");
        }
        Ok(observation)
    }

    fn trivially_solved(&self, observation: &GoalObservation) -> bool {
        let (achieved, desired) = (&observation.achieved_goal, &observation.desired_goal);
        all_close(achieved, desired, TRIVIAL_RTOL, TRIVIAL_ATOL)
            || self.world.is_success(achieved, desired)
    }

    /// Apply one action and advance the simulation by [`dt`](Self::dt).
    pub fn step(&mut self, action: &Action) -> Result<StepOutcome, EpisodeError> {
        self.ensure_open()?;
        if !self.episode.is_running() {
            return Err(EpisodeError::NotRunning {
                state: self.episode.state.label(),
            });
        }
        action.validate_clippable(ACTION_DIM)?;
        let mut action = action.clone();
        action.clip_normalized();

        let step = self.episode.advance();
        let a = action.as_slice();
        let command = [a[0], a[1], a[2], a[3]];
        self.world.robot().act(&mut self.backend, command)?;
        for _ in 0..self.config.sim.substeps {
            self.backend.advance()?;
        }

        let observation = self.world.observe(&self.backend)?;
        let (achieved, desired) = (&observation.achieved_goal, &observation.desired_goal);
        let info = StepInfo {
            is_success: self.world.is_success(achieved, desired),
            episode_length: step,
            truncated: false,
        };
        let reward = self.world.reward(achieved, desired);
        let done = self.world.done(&info);
        self.episode.record(reward, done);
        if done {
            info!(step, total_reward = self.episode.total_reward, "goal reached");
        }

        Ok(StepOutcome {
            observation,
            reward,
            done,
            info,
        })
    }

    /// Reward for an arbitrary achieved/desired pair, for goal relabelling.
    pub fn compute_reward(&self, achieved: &[f32; 3], desired: &[f32; 3]) -> f32 {
        self.world.reward(achieved, desired)
    }

    /// Truncate the running episode once `max_steps` steps were taken.
    /// Returns `true` when it was truncated.
    pub fn truncate_if_exhausted(&mut self, max_steps: u32) -> bool {
        self.episode.check_truncation(max_steps)
    }

    /// Release the backend. Later calls fail with [`EpisodeError::Closed`].
    pub fn close(&mut self) {
        if !self.episode.is_closed() {
            self.backend.disconnect();
            self.episode.close();
            info!("environment closed");
        }
    }

    const fn ensure_open(&self) -> Result<(), EpisodeError> {
        if self.episode.is_closed() {
            Err(EpisodeError::Closed)
        } else {
            Ok(())
        }
    }
}

impl<B: SimulationBackend> std::fmt::Debug for NeuroRoboticsEnv<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuroRoboticsEnv")
            .field("state", &self.episode.state)
            .field("step_count", &self.episode.step_count)
            .field("seed", &self.episode.seed)
            .finish_non_exhaustive()
    }
}
