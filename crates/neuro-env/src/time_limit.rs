//! Step-budget wrapper.

use neuro_core::error::EpisodeError;
use neuro_core::types::{Action, GoalObservation, StepOutcome};
use neuro_sim::backend::SimulationBackend;
use tracing::debug;

use crate::env::NeuroRoboticsEnv;

/// Budget used when the scene does not set `episode.max_episode_steps`.
pub const DEFAULT_MAX_EPISODE_STEPS: u32 = 50;

/// Truncates episodes that run `max_episode_steps` steps without success.
///
/// A truncated step keeps `done == false` and sets `info.truncated`.
#[derive(Debug)]
pub struct TimeLimit<B: SimulationBackend> {
    env: NeuroRoboticsEnv<B>,
    max_episode_steps: u32,
}

impl<B: SimulationBackend> TimeLimit<B> {
    pub const fn new(env: NeuroRoboticsEnv<B>, max_episode_steps: u32) -> Self {
        Self {
            env,
            max_episode_steps,
        }
    }

    /// Wrap using the env's configured budget.
    pub fn from_config(env: NeuroRoboticsEnv<B>) -> Self {
        let max = env
            .config()
            .episode
            .max_episode_steps
            .unwrap_or(DEFAULT_MAX_EPISODE_STEPS);
        Self::new(env, max)
    }

    pub const fn max_episode_steps(&self) -> u32 {
        self.max_episode_steps
    }

    pub const fn env(&self) -> &NeuroRoboticsEnv<B> {
        &self.env
    }

    pub fn into_inner(self) -> NeuroRoboticsEnv<B> {
        self.env
    }

    pub fn seed(&mut self, seed: Option<u64>) -> Result<u64, EpisodeError> {
        self.env.seed(seed)
    }

    pub fn reset(&mut self) -> Result<GoalObservation, EpisodeError> {
        self.env.reset()
    }

    pub fn step(&mut self, action: &Action) -> Result<StepOutcome, EpisodeError> {
        let mut outcome = self.env.step(action)?;
        if !outcome.done && self.env.truncate_if_exhausted(self.max_episode_steps) {
            debug!(steps = outcome.info.episode_length, "episode truncated");
            outcome.info.truncated = true;
        }
        Ok(outcome)
    }

    pub fn close(&mut self) {
        self.env.close();
    }
}
