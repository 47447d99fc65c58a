// neuro-core: Types, config, seeding and errors for the neuro-robotics environment.

pub mod config;
pub mod error;
pub mod seed;
pub mod types;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        config::{
            CameraConfig, EpisodeConfig, GoalConfig, RobotConfig, SceneConfig, SimConfig,
            StaticBodyConfig,
        },
        error::{
            ConfigError, EntityError, EpisodeError, NeuroError, SimError, ValidationError,
        },
        seed::{SeedHierarchy, derive_seed},
        types::{
            Action, ActionSpace, BodyId, GoalObservation, Observation, ObservationSpace,
            StepInfo, StepOutcome,
        },
    };
}
