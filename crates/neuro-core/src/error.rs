use std::path::PathBuf;

use thiserror::Error;

use crate::types::BodyId;

/// Top-level error type for neuro-core.
#[derive(Debug, Error)]
pub enum NeuroError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),

    #[error("Episode error: {0}")]
    Episode(#[from] EpisodeError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration errors. Always fatal and surfaced at build time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid timestep: {0} (must be > 0)")]
    InvalidTimestep(f64),

    #[error("substeps must be >= 1")]
    ZeroSubsteps,

    #[error("control joint ids ({ids}) and neutral positions ({neutral}) differ in length")]
    JointCountMismatch { ids: usize, neutral: usize },

    #[error("finger joints {fingers:?} must be the last two control joints")]
    FingersNotLast { fingers: [usize; 2] },

    #[error("Invalid range on axis {axis}: low={low} > high={high}")]
    InvalidRange { axis: usize, low: f32, high: f32 },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised by a simulation backend.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Failed to load {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("Unknown body: {0}")]
    UnknownBody(BodyId),

    #[error("Unknown link {link} on body {body}")]
    UnknownLink { body: BodyId, link: usize },

    #[error("Unknown joint {joint} on body {body}")]
    UnknownJoint { body: BodyId, joint: usize },

    #[error("Joint {joint} on body {body} is not actuated")]
    JointNotActuated { body: BodyId, joint: usize },

    #[error("Motor command mismatch: {joints} joints, {targets} targets")]
    MotorCommandMismatch { joints: usize, targets: usize },

    #[error("Backend is disconnected")]
    Disconnected,
}

/// Errors raised by simulated entities.
#[derive(Debug, Error)]
pub enum EntityError {
    /// A body operation was issued before `load` succeeded.
    #[error("{entity} used before it was loaded into the backend")]
    NotLoaded { entity: &'static str },

    #[error("Random source has not been injected")]
    RandomSourceMissing,

    #[error("No desired goal has been sampled yet")]
    GoalNotSampled,

    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Episode lifecycle errors.
#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error("Environment must be seeded before reset")]
    NotSeeded,

    #[error("Episode is not running (state: {state})")]
    NotRunning { state: &'static str },

    #[error("Environment has been closed")]
    Closed,

    #[error("Could not initialize simulator environment: {0}")]
    InitializationFailed(#[source] EntityError),

    #[error("Initial state still trivially solved after {attempts} goal resamples")]
    ResampleLimitExceeded { attempts: u32 },

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<SimError> for EpisodeError {
    fn from(err: SimError) -> Self {
        Self::Entity(EntityError::Sim(err))
    }
}

/// Action/observation validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action dimension mismatch: expected {expected}, got {got}")]
    ActionDimMismatch { expected: usize, got: usize },

    #[error("Action contains NaN")]
    ActionContainsNan,

    #[error("Action contains Inf")]
    ActionContainsInf,
}
