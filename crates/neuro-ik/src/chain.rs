//! Kinematic chain extracted from a URDF [`RobotModel`].
//!
//! A [`KinematicChain`] is the ordered list of actuated joints from the root
//! link to one target link. It stores the static transforms (origins) and
//! joint axes needed for forward kinematics and Jacobian computation, plus
//! each joint's index in the model so callers can map chain values back to
//! the robot's joint vector.

use nalgebra::{DMatrix, DVector, Isometry3, Matrix3, Translation3, UnitQuaternion, UnitVector3, Vector3};

use neuro_urdf::{JointType, Origin, RobotModel, UrdfError};

/// Errors raised while extracting a chain.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("link {0} is not part of the model")]
    UnknownLink(String),

    #[error(transparent)]
    Urdf(#[from] UrdfError),
}

/// A single joint in the kinematic chain.
#[derive(Debug, Clone)]
pub struct ChainJoint {
    /// Name of this joint (from URDF).
    pub name: String,
    /// Index of this joint in the model's joint list.
    pub index: usize,
    /// Static transform from parent link frame to this joint frame.
    pub origin: Isometry3<f32>,
    /// Joint axis in the joint's local frame.
    pub axis: UnitVector3<f32>,
    pub is_prismatic: bool,
    /// Lower position limit (rad or m).
    pub lower_limit: f32,
    /// Upper position limit (rad or m).
    pub upper_limit: f32,
}

/// An ordered kinematic chain from the root link to a target link.
///
/// Fixed joints have their transforms folded into the next actuated joint's
/// origin, or into the trailing offset when they sit after the last one.
#[derive(Debug, Clone)]
pub struct KinematicChain {
    joints: Vec<ChainJoint>,
    /// Transform from the last actuated joint to the target link frame.
    tip_offset: Isometry3<f32>,
}

impl KinematicChain {
    /// Build the chain ending at `tip_link`.
    pub fn from_model(model: &RobotModel, tip_link: &str) -> Result<Self, ChainError> {
        if tip_link == model.root_link {
            return Ok(Self {
                joints: Vec::new(),
                tip_offset: Isometry3::identity(),
            });
        }
        let tip_joint = model
            .link_index(tip_link)
            .ok_or_else(|| ChainError::UnknownLink(tip_link.to_string()))?;
        Self::ending_at_joint(model, tip_joint)
    }

    /// Build the chain ending at the child link of joint `tip_joint`.
    pub fn ending_at_joint(model: &RobotModel, tip_joint: usize) -> Result<Self, ChainError> {
        let path = model.joint_path(tip_joint)?;

        let mut joints = Vec::new();
        let mut accumulated_fixed = Isometry3::identity();

        for index in path {
            let joint = &model.joints[index];
            let joint_origin = origin_to_isometry(&joint.origin);

            if joint.joint_type.is_actuated() {
                let combined_origin = accumulated_fixed * joint_origin;
                accumulated_fixed = Isometry3::identity();

                let axis = Vector3::new(joint.axis[0], joint.axis[1], joint.axis[2]);
                let axis = UnitVector3::new_normalize(axis);

                let (lower, upper) = match joint.joint_type {
                    JointType::Continuous => (-std::f32::consts::PI, std::f32::consts::PI),
                    _ => (
                        joint.limits.lower.unwrap_or(-std::f32::consts::PI),
                        joint.limits.upper.unwrap_or(std::f32::consts::PI),
                    ),
                };

                joints.push(ChainJoint {
                    name: joint.name.clone(),
                    index,
                    origin: combined_origin,
                    axis,
                    is_prismatic: joint.joint_type.is_prismatic(),
                    lower_limit: lower,
                    upper_limit: upper,
                });
            } else {
                accumulated_fixed *= joint_origin;
            }
        }

        Ok(Self {
            joints,
            tip_offset: accumulated_fixed,
        })
    }

    /// Number of actuated degrees of freedom.
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    /// Model joint indices in chain order.
    pub fn joint_indices(&self) -> Vec<usize> {
        self.joints.iter().map(|j| j.index).collect()
    }

    pub fn joints(&self) -> &[ChainJoint] {
        &self.joints
    }

    /// Pick this chain's joint values out of a full model-indexed vector.
    pub fn gather(&self, model_q: &[f32]) -> Vec<f32> {
        self.joints.iter().map(|j| model_q[j.index]).collect()
    }

    /// Tip pose in the root frame.
    ///
    /// # Panics
    ///
    /// Panics if `q.len() != self.dof()`.
    pub fn forward_kinematics(&self, q: &[f32]) -> Isometry3<f32> {
        assert_eq!(q.len(), self.dof(), "q.len() must equal chain DOF");

        let mut transform = Isometry3::identity();
        for (joint, &position) in self.joints.iter().zip(q.iter()) {
            transform *= joint.origin;
            transform *= joint_transform(&joint.axis, joint.is_prismatic, position);
        }
        transform * self.tip_offset
    }

    /// Joint origins and axes in the root frame, plus the tip position.
    pub fn joint_frames(&self, q: &[f32]) -> (Vec<Vector3<f32>>, Vec<Vector3<f32>>, Vector3<f32>) {
        assert_eq!(q.len(), self.dof());

        let mut transform = Isometry3::identity();
        let mut origins = Vec::with_capacity(self.dof());
        let mut axes = Vec::with_capacity(self.dof());

        for (joint, &position) in self.joints.iter().zip(q.iter()) {
            transform *= joint.origin;
            // Recorded before the joint's own motion.
            origins.push(transform.translation.vector);
            axes.push(transform.rotation * joint.axis.into_inner());
            transform *= joint_transform(&joint.axis, joint.is_prismatic, position);
        }

        let tip = (transform * self.tip_offset).translation.vector;
        (origins, axes, tip)
    }

    /// Geometric Jacobian at `q`: 3xN (linear) or 6xN (linear + angular).
    pub fn jacobian(&self, q: &[f32], with_orientation: bool) -> DMatrix<f32> {
        let n = self.dof();
        let (origins, axes, tip) = self.joint_frames(q);
        let rows = if with_orientation { 6 } else { 3 };
        let mut jacobian = DMatrix::zeros(rows, n);

        for (i, joint) in self.joints.iter().enumerate() {
            let z_i = &axes[i];
            let linear = if joint.is_prismatic {
                *z_i
            } else {
                z_i.cross(&(tip - origins[i]))
            };
            jacobian[(0, i)] = linear.x;
            jacobian[(1, i)] = linear.y;
            jacobian[(2, i)] = linear.z;

            if with_orientation && !joint.is_prismatic {
                jacobian[(3, i)] = z_i.x;
                jacobian[(4, i)] = z_i.y;
                jacobian[(5, i)] = z_i.z;
            }
        }

        jacobian
    }

    /// Linear velocity of the tip in the root frame for joint rates `qdot`.
    pub fn tip_linear_velocity(&self, q: &[f32], qdot: &[f32]) -> Vector3<f32> {
        assert_eq!(qdot.len(), self.dof());
        if self.dof() == 0 {
            return Vector3::zeros();
        }
        let v = self.jacobian(q, false) * DVector::from_column_slice(qdot);
        Vector3::new(v[0], v[1], v[2])
    }

    /// Clamp joint positions to their limits.
    pub fn clamp_joints(&self, q: &mut [f32]) {
        for (value, joint) in q.iter_mut().zip(&self.joints) {
            *value = value.clamp(joint.lower_limit, joint.upper_limit);
        }
    }
}

/// Convert a URDF [`Origin`] (xyz + rpy) to an [`Isometry3`].
pub fn origin_to_isometry(origin: &Origin) -> Isometry3<f32> {
    let translation = Translation3::new(origin.xyz[0], origin.xyz[1], origin.xyz[2]);
    let rotation = UnitQuaternion::from_matrix(&rotation_matrix_from_rpy(
        origin.rpy[0],
        origin.rpy[1],
        origin.rpy[2],
    ));
    Isometry3::from_parts(translation, rotation)
}

/// Rotation matrix from roll-pitch-yaw (intrinsic XYZ / extrinsic ZYX).
fn rotation_matrix_from_rpy(roll: f32, pitch: f32, yaw: f32) -> Matrix3<f32> {
    let (sr, cr) = roll.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();

    Matrix3::new(
        cy * cp,
        cy * sp * sr - sy * cr,
        cy * sp * cr + sy * sr,
        sy * cp,
        sy * sp * sr + cy * cr,
        sy * sp * cr - cy * sr,
        -sp,
        cp * sr,
        cp * cr,
    )
}

fn joint_transform(axis: &UnitVector3<f32>, is_prismatic: bool, position: f32) -> Isometry3<f32> {
    if is_prismatic {
        Isometry3::from_parts(
            Translation3::from(axis.into_inner() * position),
            UnitQuaternion::identity(),
        )
    } else {
        Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(axis, position),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
