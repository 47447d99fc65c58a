//! URDF XML parsing using `urdf-rs`.
//!
//! Converts `urdf_rs` types into the crate's canonical [`RobotModel`]
//! representation, keeping joint document order.

// All conversions from urdf-rs f64 → f32 are intentional truncations.
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashSet;
use std::path::Path;

use crate::error::UrdfError;
use crate::types::{JointData, JointLimits, JointType, LinkData, Origin, RobotModel};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a URDF file from disk into a [`RobotModel`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<RobotModel, UrdfError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| UrdfError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_string(&content)
}

/// Parse a URDF XML string into a [`RobotModel`].
pub fn parse_string(xml: &str) -> Result<RobotModel, UrdfError> {
    let robot = urdf_rs::read_from_string(xml).map_err(|e| UrdfError::Parse(e.to_string()))?;
    convert_robot(&robot)
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn convert_robot(robot: &urdf_rs::Robot) -> Result<RobotModel, UrdfError> {
    let links: Vec<LinkData> = robot.links.iter().map(convert_link).collect();
    let joints: Vec<JointData> = robot
        .joints
        .iter()
        .map(convert_joint)
        .collect::<Result<_, _>>()?;

    let known: HashSet<&str> = links.iter().map(|l| l.name.as_str()).collect();
    for joint in &joints {
        for link in [&joint.parent, &joint.child] {
            if !known.contains(link.as_str()) {
                return Err(UrdfError::MissingLink(link.clone()));
            }
        }
    }

    // Root link = the first link that is never a child of any joint.
    let child_links: HashSet<&str> = joints.iter().map(|j| j.child.as_str()).collect();
    let root_link = links
        .iter()
        .find(|l| !child_links.contains(l.name.as_str()))
        .ok_or(UrdfError::NoRootLink)?
        .name
        .clone();

    Ok(RobotModel {
        name: robot.name.clone(),
        links,
        joints,
        root_link,
    })
}

fn convert_link(link: &urdf_rs::Link) -> LinkData {
    let mass = link.inertial.mass.value as f32;
    LinkData {
        name: link.name.clone(),
        mass: (mass > 0.0).then_some(mass),
    }
}

fn convert_joint(joint: &urdf_rs::Joint) -> Result<JointData, UrdfError> {
    let joint_type = convert_joint_type(&joint.joint_type).map_err(|kind| {
        UrdfError::UnsupportedJointType {
            joint: joint.name.clone(),
            kind,
        }
    })?;

    let limits = if joint_type == JointType::Continuous {
        JointLimits {
            velocity: joint.limit.velocity as f32,
            ..JointLimits::default()
        }
    } else {
        convert_limits(&joint.limit)
    };

    Ok(JointData {
        name: joint.name.clone(),
        joint_type,
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        origin: convert_pose(&joint.origin),
        axis: vec3_to_f32(&joint.axis.xyz),
        limits,
    })
}

const fn convert_joint_type(jt: &urdf_rs::JointType) -> Result<JointType, &'static str> {
    match jt {
        urdf_rs::JointType::Revolute => Ok(JointType::Revolute),
        urdf_rs::JointType::Continuous => Ok(JointType::Continuous),
        urdf_rs::JointType::Prismatic => Ok(JointType::Prismatic),
        urdf_rs::JointType::Fixed => Ok(JointType::Fixed),
        urdf_rs::JointType::Floating => Err("floating"),
        urdf_rs::JointType::Planar => Err("planar"),
        urdf_rs::JointType::Spherical => Err("spherical"),
    }
}

fn convert_limits(limit: &urdf_rs::JointLimit) -> JointLimits {
    // urdf-rs defaults lower/upper to 0.0 when the limit tag is absent.
    let has_limits = (limit.lower - limit.upper).abs() > f64::EPSILON;
    JointLimits {
        lower: has_limits.then_some(limit.lower as f32),
        upper: has_limits.then_some(limit.upper as f32),
        velocity: limit.velocity as f32,
    }
}

fn convert_pose(pose: &urdf_rs::Pose) -> Origin {
    Origin {
        xyz: vec3_to_f32(&pose.xyz),
        rpy: vec3_to_f32(&pose.rpy),
    }
}

const fn vec3_to_f32(v: &[f64; 3]) -> [f32; 3] {
    [v[0] as f32, v[1] as f32, v[2] as f32]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
