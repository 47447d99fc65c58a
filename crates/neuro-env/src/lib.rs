//! Goal-conditioned Panda reach environment.
//!
//! This crate composes simulated entities into a scene and exposes the
//! episodic `seed` / `reset` / `step` / `close` interface:
//!
//! ```text
//! NeuroRoboticsEnv ──► World ──► Robot / Goal / StaticBody ──► SimulationBackend
//! ```

pub mod bodies;
pub mod entity;
pub mod env;
pub mod episode;
pub mod goal;
pub mod robot;
pub mod time_limit;
pub mod world;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        bodies::{StaticBody, StaticKind},
        entity::SimEntity,
        env::{ACTION_DIM, NeuroRoboticsEnv},
        episode::{Episode, EpisodeState},
        goal::Goal,
        robot::Robot,
        time_limit::TimeLimit,
        world::{OBSERVATION_DIM, World},
    };
}

pub use env::NeuroRoboticsEnv;
pub use time_limit::TimeLimit;
