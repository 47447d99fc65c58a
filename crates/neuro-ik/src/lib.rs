//! Kinematics for index-ordered URDF robots.
//!
//! Provides forward kinematics, geometric Jacobians and Damped Least
//! Squares (Levenberg-Marquardt) IK for chains extracted from a
//! [`RobotModel`](neuro_urdf::RobotModel).
//!
//! ```text
//! RobotModel ──► KinematicChain ──► DlsSolver ──► joint positions
//! ```

pub mod chain;
pub mod solver;

pub use chain::{ChainError, ChainJoint, KinematicChain, origin_to_isometry};
pub use solver::{DlsConfig, DlsSolver, IkResult, IkTarget};
