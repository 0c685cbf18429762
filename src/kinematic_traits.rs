//! Types and the kinematics contract shared by the solvers and the robot wrapper

extern crate nalgebra as na;

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use na::{Isometry3, SMatrix, SVector};

use crate::jacobian::compute_jacobian;
use crate::se3;

/// Number of revolute joints of the arm. Fingers are not counted.
pub const DOF: usize = 7;

/// Joint angles in radians, one per revolute joint.
pub type Joints = [f64; DOF];

/// Finger (gripper) positions in meters.
pub type Fingers = [f64; 2];

/// Pose is used as a pose of the end effector. It contains both Cartesian position and rotation quaternion
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(0.3, 0.0, 0.5);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(0.0, 1.0, 0.0, 0.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Pose as a flat array `[x, y, z, w, i, j, k]`, the form targets arrive from the callers.
pub type PosQuat = [f64; 7];

/// 6 x DOF matrix mapping joint velocities to the end effector twist. The first three rows
/// are the linear part, the last three the angular part.
pub type JacobianMatrix = SMatrix<f64, 6, DOF>;

/// Joint vector in nalgebra form, for linear algebra on joint space.
pub type JointVector = SVector<f64, DOF>;

pub const J1: usize = 0;
pub const J2: usize = 1;
pub const J3: usize = 2;
pub const J4: usize = 3;
pub const J5: usize = 4;
pub const J6: usize = 5;
pub const J7: usize = 6;

pub const JOINTS_AT_ZERO: Joints = [0.0; DOF];

/// The usual "ready" configuration of the Panda, gripper pointing down in front of the robot.
pub const JOINTS_READY: Joints = [0.0, -FRAC_PI_4, 0.0, -3.0 * FRAC_PI_4, 0.0, FRAC_PI_2, FRAC_PI_4];

/// Step used when the Jacobian has to be obtained by numerical differentiation.
pub const JACOBIAN_EPSILON: f64 = 1e-7;

/// Kinematics provider. Solvers only depend on this contract. The implementation must be
/// shareable between threads as batch elements may be solved in parallel.
pub trait Kinematics: Send + Sync {
    /// End effector pose for the given joint angles.
    fn forward(&self, qs: &Joints) -> Pose;

    /// Jacobian in the world (space) frame: `d(exp(twist) * pose)` per joint.
    /// Defaults to numerical differentiation of [Kinematics::forward].
    fn spatial_jacobian(&self, qs: &Joints) -> JacobianMatrix {
        compute_jacobian(self, qs, JACOBIAN_EPSILON)
    }

    /// Jacobian in the end effector (body) frame: `d(pose * exp(twist))` per joint.
    fn body_jacobian(&self, qs: &Joints) -> JacobianMatrix {
        let pose = self.forward(qs);
        se3::adjoint(&pose.inverse()) * self.spatial_jacobian(qs)
    }
}

pub(crate) fn to_vector(qs: &Joints) -> JointVector {
    JointVector::from_column_slice(qs)
}

pub(crate) fn from_vector(v: &JointVector) -> Joints {
    std::array::from_fn(|i| v[i])
}
