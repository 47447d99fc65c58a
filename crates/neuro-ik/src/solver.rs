//! Damped Least Squares (Levenberg-Marquardt) IK solver.
//!
//! Iteratively solves for joint positions that place the chain tip at a
//! target pose, using the geometric Jacobian and DLS pseudoinverse.

use nalgebra::{DMatrix, DVector, Isometry3, UnitQuaternion, Vector3};

use crate::chain::KinematicChain;

/// What the solver should target.
#[derive(Debug, Clone)]
pub enum IkTarget {
    /// Target position only (3-DOF constraint).
    Position(Vector3<f32>),
    /// Target full pose: position + orientation (6-DOF constraint).
    Pose(Isometry3<f32>),
}

impl IkTarget {
    /// Pose target when an orientation is given, position target otherwise.
    pub fn new(position: Vector3<f32>, orientation: Option<UnitQuaternion<f32>>) -> Self {
        match orientation {
            Some(rotation) => Self::Pose(Isometry3::from_parts(position.into(), rotation)),
            None => Self::Position(position),
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        match self {
            Self::Position(p) => *p,
            Self::Pose(pose) => pose.translation.vector,
        }
    }

    const fn constrains_orientation(&self) -> bool {
        matches!(self, Self::Pose(_))
    }
}

/// Configuration for the DLS solver.
#[derive(Debug, Clone)]
pub struct DlsConfig {
    pub max_iterations: u32,
    /// Position error tolerance (meters).
    pub position_tolerance: f32,
    /// Orientation error tolerance (radians).
    pub angle_tolerance: f32,
    /// Damping factor (lambda). Higher is more robust near singularities
    /// and slower to converge.
    pub damping: f32,
}

impl Default for DlsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            position_tolerance: 1e-4,
            angle_tolerance: 1e-3,
            damping: 0.01,
        }
    }
}

/// Result of an IK solve.
#[derive(Debug, Clone)]
pub struct IkResult {
    /// Solved joint positions, in chain order.
    pub joint_positions: Vec<f32>,
    pub converged: bool,
    pub iterations: u32,
    /// Final position error (meters).
    pub position_error: f32,
    /// Final orientation error (radians). Zero for position-only targets.
    pub orientation_error: f32,
}

/// Damped Least Squares IK solver.
#[derive(Debug, Clone, Default)]
pub struct DlsSolver {
    config: DlsConfig,
}

impl DlsSolver {
    pub const fn new(config: DlsConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &DlsConfig {
        &self.config
    }

    /// Solve IK for `chain`, warm-starting from `q_init`.
    ///
    /// Never fails: when the target is unreachable the best effort is
    /// returned with `converged == false`.
    pub fn solve(&self, chain: &KinematicChain, target: &IkTarget, q_init: &[f32]) -> IkResult {
        assert_eq!(q_init.len(), chain.dof());

        let mut q: Vec<f32> = q_init.to_vec();
        let lambda_sq = self.config.damping * self.config.damping;
        let mut iterations = 0;

        let (pos_err, ori_err) = loop {
            let tip = chain.forward_kinematics(&q);
            let (pos_err, ori_err, error_vec) = compute_error(&tip, target);

            let converged = pos_err < self.config.position_tolerance
                && (!target.constrains_orientation() || ori_err < self.config.angle_tolerance);
            if converged {
                return IkResult {
                    joint_positions: q,
                    converged: true,
                    iterations,
                    position_error: pos_err,
                    orientation_error: ori_err,
                };
            }
            if iterations == self.config.max_iterations || chain.dof() == 0 {
                break (pos_err, ori_err);
            }

            // dq = J^T (J J^T + lambda^2 I)^-1 e
            let jacobian = chain.jacobian(&q, target.constrains_orientation());
            let m = jacobian.nrows();
            let damped = &jacobian * jacobian.transpose() + DMatrix::identity(m, m) * lambda_sq;
            let Some(damped_inv) = damped.try_inverse() else {
                break (pos_err, ori_err);
            };
            let dq = jacobian.transpose() * damped_inv * error_vec;

            for (value, delta) in q.iter_mut().zip(dq.iter()) {
                *value += delta;
            }
            chain.clamp_joints(&mut q);
            iterations += 1;
        };

        IkResult {
            joint_positions: q,
            converged: false,
            iterations,
            position_error: pos_err,
            orientation_error: ori_err,
        }
    }
}

/// Returns (position error norm, orientation error norm, stacked error vector).
fn compute_error(tip: &Isometry3<f32>, target: &IkTarget) -> (f32, f32, DVector<f32>) {
    let pos_err = target.position() - tip.translation.vector;
    match target {
        IkTarget::Position(_) => (
            pos_err.norm(),
            0.0,
            DVector::from_column_slice(pos_err.as_slice()),
        ),
        IkTarget::Pose(pose) => {
            let ori_err = orientation_error(&(pose.rotation * tip.rotation.inverse()));
            let error = DVector::from_iterator(6, pos_err.iter().chain(ori_err.iter()).copied());
            (pos_err.norm(), ori_err.norm(), error)
        }
    }
}

/// Orientation error as a 3-vector (axis * angle).
fn orientation_error(q: &UnitQuaternion<f32>) -> Vector3<f32> {
    q.axis()
        .map_or_else(Vector3::zeros, |axis| axis.into_inner() * q.angle())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
