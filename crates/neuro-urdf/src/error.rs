//! Error types for URDF parsing.

use std::path::PathBuf;

/// Errors that can occur during URDF processing.
#[derive(Debug, thiserror::Error)]
pub enum UrdfError {
    /// Failed to read the URDF file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse URDF XML content.
    #[error("URDF parse error: {0}")]
    Parse(String),

    #[error("missing link: {0}")]
    MissingLink(String),

    #[error("missing joint: {0}")]
    MissingJoint(String),

    /// Joint types the kinematic model cannot represent (floating, planar, spherical).
    #[error("unsupported joint type {kind} on joint {joint}")]
    UnsupportedJointType { joint: String, kind: &'static str },

    /// The URDF has no root link (no link that is never a child).
    #[error("no root link found")]
    NoRootLink,

    #[error("kinematic loop through joint {0}")]
    Cycle(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
