//! In-memory robot model with stable joint and link indices.
//!
//! Joints keep the order in which they appear in the description file.
//! Joint `i` drives link `i` (its child link); the root link has no index
//! and is addressed through the body's base pose instead.

use crate::error::UrdfError;

// ---------------------------------------------------------------------------
// JointType
// ---------------------------------------------------------------------------

/// URDF joint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    /// Rotation about a single axis, with position limits.
    Revolute,
    /// Unlimited rotation about a single axis.
    Continuous,
    /// Translation along an axis, with position limits.
    Prismatic,
    /// No relative motion between parent and child.
    Fixed,
}

impl JointType {
    /// Whether this joint type has an actuatable degree of freedom.
    pub const fn is_actuated(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous | Self::Prismatic)
    }

    pub const fn is_prismatic(self) -> bool {
        matches!(self, Self::Prismatic)
    }
}

// ---------------------------------------------------------------------------
// JointLimits
// ---------------------------------------------------------------------------

/// Position and velocity limits of a joint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointLimits {
    /// Lower position limit (rad or m). `None` means unbounded.
    pub lower: Option<f32>,
    /// Upper position limit (rad or m). `None` means unbounded.
    pub upper: Option<f32>,
    /// Maximum velocity (rad/s or m/s). Zero means unspecified.
    pub velocity: f32,
}

impl JointLimits {
    /// Clamp a position into `[lower, upper]`, leaving open sides untouched.
    pub fn clamp(&self, value: f32) -> f32 {
        let value = self.lower.map_or(value, |lo| value.max(lo));
        self.upper.map_or(value, |hi| value.min(hi))
    }
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// A 3D pose specified as position + roll-pitch-yaw.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Origin {
    /// Translation `[x, y, z]` in meters.
    pub xyz: [f32; 3],
    /// Rotation `[roll, pitch, yaw]` in radians.
    pub rpy: [f32; 3],
}

// ---------------------------------------------------------------------------
// LinkData / JointData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LinkData {
    pub name: String,
    /// Mass in kilograms, when an inertial block is present.
    pub mass: Option<f32>,
}

impl LinkData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mass: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointData {
    pub name: String,
    pub joint_type: JointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Joint origin relative to the parent link frame.
    pub origin: Origin,
    /// Joint axis (unit vector, default `[1, 0, 0]` as in URDF).
    pub axis: [f32; 3],
    pub limits: JointLimits,
}

// ---------------------------------------------------------------------------
// RobotModel
// ---------------------------------------------------------------------------

/// Complete in-memory representation of a URDF robot.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotModel {
    pub name: String,
    /// Links in document order.
    pub links: Vec<LinkData>,
    /// Joints in document order. The position is the joint index.
    pub joints: Vec<JointData>,
    /// Name of the root link (the one never referenced as a child).
    pub root_link: String,
}

impl RobotModel {
    pub fn link(&self, name: &str) -> Result<&LinkData, UrdfError> {
        self.links
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| UrdfError::MissingLink(name.into()))
    }

    pub fn joint(&self, name: &str) -> Result<&JointData, UrdfError> {
        self.joints
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| UrdfError::MissingJoint(name.into()))
    }

    /// Index of a joint by name.
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Index of the joint whose child is `link`. `None` for the root link.
    pub fn link_index(&self, link: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.child == link)
    }

    /// Joint that has `link` as its child.
    pub fn parent_joint(&self, link: &str) -> Option<&JointData> {
        self.joints.iter().find(|j| j.child == link)
    }

    /// Iterate over actuatable joints with their indices, in index order.
    pub fn actuated_joints(&self) -> impl Iterator<Item = (usize, &JointData)> {
        self.joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.joint_type.is_actuated())
    }

    /// Number of actuatable degrees of freedom.
    pub fn dof(&self) -> usize {
        self.actuated_joints().count()
    }

    /// Names of actuated joints in index order.
    pub fn actuated_joint_names(&self) -> Vec<&str> {
        self.actuated_joints().map(|(_, j)| j.name.as_str()).collect()
    }

    /// Joint indices from the root down to and including `joint`.
    pub fn joint_path(&self, joint: usize) -> Result<Vec<usize>, UrdfError> {
        let mut path = Vec::new();
        let mut current = Some(joint);
        while let Some(idx) = current {
            let data = self
                .joints
                .get(idx)
                .ok_or_else(|| UrdfError::MissingJoint(format!("#{idx}")))?;
            if path.contains(&idx) {
                return Err(UrdfError::Cycle(data.name.clone()));
            }
            path.push(idx);
            current = self.link_index(&data.parent);
        }
        path.reverse();
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn joint(name: &str, joint_type: JointType, parent: &str, child: &str) -> JointData {
        JointData {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            origin: Origin::default(),
            axis: [0.0, 0.0, 1.0],
            limits: JointLimits {
                lower: Some(-1.57),
                upper: Some(1.57),
                velocity: 5.0,
            },
        }
    }

    fn sample_model() -> RobotModel {
        RobotModel {
            name: "test_robot".into(),
            links: vec![
                LinkData::new("base"),
                LinkData::new("link1"),
                LinkData::new("link2"),
                LinkData::new("tip"),
            ],
            joints: vec![
                joint("joint1", JointType::Revolute, "base", "link1"),
                joint("joint2", JointType::Fixed, "link1", "link2"),
                joint("joint3", JointType::Prismatic, "link2", "tip"),
            ],
            root_link: "base".into(),
        }
    }

    // -- JointType --

    #[test]
    fn joint_type_is_actuated() {
        assert!(JointType::Revolute.is_actuated());
        assert!(JointType::Continuous.is_actuated());
        assert!(JointType::Prismatic.is_actuated());
        assert!(!JointType::Fixed.is_actuated());
        assert!(JointType::Prismatic.is_prismatic());
        assert!(!JointType::Revolute.is_prismatic());
    }

    // -- JointLimits --

    #[test]
    fn joint_limits_clamp() {
        let lim = JointLimits {
            lower: Some(-1.0),
            upper: Some(2.0),
            velocity: 1.0,
        };
        assert!((lim.clamp(-5.0) - (-1.0)).abs() < f32::EPSILON);
        assert!((lim.clamp(5.0) - 2.0).abs() < f32::EPSILON);
        assert!((lim.clamp(0.5) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn joint_limits_open_sides_are_unbounded() {
        let lim = JointLimits::default();
        assert!((lim.clamp(100.0) - 100.0).abs() < f32::EPSILON);
        assert!((lim.clamp(-100.0) + 100.0).abs() < f32::EPSILON);
    }

    // -- RobotModel --

    #[test]
    fn model_lookup_by_name() {
        let model = sample_model();
        assert!(model.link("base").is_ok());
        assert!(model.link("missing").is_err());
        assert!(model.joint("joint3").is_ok());
        assert!(matches!(
            model.joint("missing").unwrap_err(),
            UrdfError::MissingJoint(_)
        ));
    }

    #[test]
    fn model_indices_follow_document_order() {
        let model = sample_model();
        assert_eq!(model.joint_index("joint2"), Some(1));
        assert_eq!(model.link_index("tip"), Some(2));
        assert_eq!(model.link_index("base"), None);
        assert_eq!(model.parent_joint("link1").unwrap().name, "joint1");
    }

    #[test]
    fn model_dof_skips_fixed() {
        let model = sample_model();
        assert_eq!(model.dof(), 2);
        assert_eq!(model.actuated_joint_names(), vec!["joint1", "joint3"]);
        let indices: Vec<usize> = model.actuated_joints().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn model_joint_path_root_to_tip() {
        let model = sample_model();
        assert_eq!(model.joint_path(2).unwrap(), vec![0, 1, 2]);
        assert_eq!(model.joint_path(0).unwrap(), vec![0]);
        assert!(model.joint_path(7).is_err());
    }

    #[test]
    fn model_joint_path_detects_cycle() {
        let mut model = sample_model();
        model.joints[0].parent = "tip".into();
        assert!(matches!(model.joint_path(2).unwrap_err(), UrdfError::Cycle(_)));
    }
}
