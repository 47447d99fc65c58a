use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// BodyId
// ---------------------------------------------------------------------------

/// Opaque handle assigned by a simulation backend when a body is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f32 vector representing environment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f32>,
}

impl Observation {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl From<Vec<f32>> for Observation {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// Goal-conditioned observation returned by `reset` and `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalObservation {
    /// Robot proprioception (effector position, velocity, finger width)
    /// followed by the achieved goal.
    pub observation: Observation,
    /// Current position of the goal body.
    pub achieved_goal: [f32; 3],
    /// Goal position for this episode.
    pub desired_goal: [f32; 3],
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Continuous control command, normalized to [-1, 1] per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: Vec<f32>,
}

impl Action {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Clip every component to [-1, 1].
    pub fn clip_normalized(&mut self) {
        for val in &mut self.data {
            *val = val.clamp(-1.0, 1.0);
        }
    }

    /// Reject NaN and infinite components.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for val in &self.data {
            if val.is_nan() {
                return Err(ValidationError::ActionContainsNan);
            }
            if val.is_infinite() {
                return Err(ValidationError::ActionContainsInf);
            }
        }
        Ok(())
    }

    /// Validate and check the component count in one go.
    pub fn validate_dim(&self, expected: usize) -> Result<(), ValidationError> {
        if self.data.len() != expected {
            return Err(ValidationError::ActionDimMismatch {
                expected,
                got: self.data.len(),
            });
        }
        self.validate()
    }

    /// Check the component count and reject NaN. Infinite components pass,
    /// since [`clip_normalized`](Self::clip_normalized) saturates them.
    pub fn validate_clippable(&self, expected: usize) -> Result<(), ValidationError> {
        if self.data.len() != expected {
            return Err(ValidationError::ActionDimMismatch {
                expected,
                got: self.data.len(),
            });
        }
        if self.data.iter().any(|v| v.is_nan()) {
            return Err(ValidationError::ActionContainsNan);
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Action {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

impl From<[f32; 4]> for Action {
    fn from(data: [f32; 4]) -> Self {
        Self::new(data.to_vec())
    }
}

// ---------------------------------------------------------------------------
// ObservationSpace
// ---------------------------------------------------------------------------

/// Shape and bounds of valid observations. Follows Gymnasium conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservationSpace {
    Box { low: Vec<f32>, high: Vec<f32> },
    Dict { spaces: BTreeMap<String, Self> },
}

impl ObservationSpace {
    /// Uniform box of `dim` components bounded by `[low, high]`.
    pub fn uniform_box(dim: usize, low: f32, high: f32) -> Self {
        Self::Box {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    /// Dict space for goal-conditioned observations.
    pub fn goal_conditioned(observation_dim: usize, goal_dim: usize, bound: f32) -> Self {
        let mut spaces = BTreeMap::new();
        spaces.insert(
            "observation".to_string(),
            Self::uniform_box(observation_dim, -bound, bound),
        );
        spaces.insert(
            "achieved_goal".to_string(),
            Self::uniform_box(goal_dim, -bound, bound),
        );
        spaces.insert(
            "desired_goal".to_string(),
            Self::uniform_box(goal_dim, -bound, bound),
        );
        Self::Dict { spaces }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Box { low, .. } => vec![low.len()],
            Self::Dict { .. } => vec![], // composite; query children
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Dict { spaces } => spaces.values().map(Self::size).sum(),
            Self::Box { .. } => self.shape().iter().product(),
        }
    }

    /// Look up a child of a `Dict` space.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict { spaces } => spaces.get(key),
            Self::Box { .. } => None,
        }
    }

    /// Whether `values` fits a `Box` space. Always false for `Dict`.
    pub fn contains(&self, values: &[f32]) -> bool {
        match self {
            Self::Box { low, high } => {
                values.len() == low.len()
                    && values
                        .iter()
                        .zip(low.iter().zip(high.iter()))
                        .all(|(v, (l, h))| v >= l && v <= h)
            }
            Self::Dict { .. } => false,
        }
    }

    /// Whether every part of a goal observation fits this `Dict` space.
    pub fn contains_goal_observation(&self, obs: &GoalObservation) -> bool {
        let fits = |key: &str, values: &[f32]| self.get(key).is_some_and(|s| s.contains(values));
        fits("observation", obs.observation.as_slice())
            && fits("achieved_goal", &obs.achieved_goal)
            && fits("desired_goal", &obs.desired_goal)
    }
}

// ---------------------------------------------------------------------------
// ActionSpace
// ---------------------------------------------------------------------------

/// Box-shaped action space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl ActionSpace {
    /// Normalized box `[-1, 1]^dim`.
    pub fn normalized(dim: usize) -> Self {
        Self {
            low: vec![-1.0; dim],
            high: vec![1.0; dim],
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub const fn size(&self) -> usize {
        self.low.len()
    }

    /// Sample a random action. Takes `&mut impl Rng` for determinism.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> Action {
        let data: Vec<f32> = self
            .low
            .iter()
            .zip(self.high.iter())
            .map(|(l, h)| rng.gen_range(*l..=*h))
            .collect();
        Action::new(data)
    }

    pub fn contains(&self, action: &Action) -> bool {
        action.len() == self.low.len()
            && action
                .as_slice()
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(val, (l, h))| val >= l && val <= h)
    }
}

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

/// Per-step diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub is_success: bool,
    /// Number of steps taken in the episode, including this one.
    pub episode_length: u32,
    /// Set by time-limit wrappers when the episode was cut short.
    pub truncated: bool,
}

/// Result of `env.step(action)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: GoalObservation,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
