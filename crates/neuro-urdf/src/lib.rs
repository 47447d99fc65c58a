//! URDF parsing and robot model representation for neuro-robotics.
//!
//! Parses URDF XML into a [`RobotModel`] whose joint order matches the
//! file, so simulation backends can address joints and links by index.

pub mod error;
pub mod parser;
pub mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::UrdfError;
pub use parser::{parse_file, parse_string};
pub use types::{JointData, JointLimits, JointType, LinkData, Origin, RobotModel};
