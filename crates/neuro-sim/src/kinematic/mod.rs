//! Kinematic reference backend.
//!
//! Bodies are URDF trees posed by forward kinematics. Joints follow
//! velocity-limited position motors; there are no contacts and gravity is
//! recorded but never integrated.

mod backend;
mod body;

pub use backend::KinematicBackend;
pub use body::{BodyState, FrictionCoefficients};
