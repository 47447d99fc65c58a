// neuro-sim: Simulation backend abstraction for the neuro-robotics environment.
//
// Provides a `SimulationBackend` trait so the concrete simulator can be
// swapped without changing entities or the episode loop, plus a kinematic
// reference backend driven by URDF forward kinematics and DLS IK.

pub mod backend;
pub mod kinematic;
pub mod pose;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        backend::{LinkState, SimulationBackend},
        kinematic::{FrictionCoefficients, KinematicBackend},
        pose::{Orientation, Pose},
    };
}

pub use kinematic::KinematicBackend;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
