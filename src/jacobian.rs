extern crate nalgebra as na;
use na::{SMatrix, Vector6};
use rayon::prelude::*;
use crate::kinematic_traits::{from_vector, JacobianMatrix, Joints, Kinematics, DOF};
use crate::se3;

/// Struct representing the Jacobian matrix
pub struct Jacobian {
    /// A 6x7 matrix representing the Jacobian
    ///
    /// The Jacobian matrix maps the joint velocities to the end-effector twist.
    /// Each column corresponds to a joint, first three rows are the linear and the last
    /// three the angular velocity of the end-effector.
    matrix: JacobianMatrix,

    /// Singular values below this are treated as zero when inverting
    epsilon: f64,
}

impl Jacobian {
    /// Constructs a new Jacobian struct by numerically differentiating the forward kinematics
    /// of the given robot at the joint configuration
    ///
    /// # Arguments
    ///
    /// * `robot` - A reference to the robot implementing the Kinematics trait
    /// * `qs` - A reference to the joint configuration
    /// * `epsilon` - A small value used both for numerical differentiation and as
    ///   the pseudo-inverse threshold
    ///
    /// # Returns
    ///
    /// A new instance of `Jacobian`
    pub fn new(robot: &(impl Kinematics + ?Sized), qs: &Joints, epsilon: f64) -> Self {
        let matrix = compute_jacobian(robot, qs, epsilon);
        Self { matrix, epsilon }
    }

    /// The spatial Jacobian as provided by the robot itself (analytical if the robot
    /// supports it).
    pub fn spatial(robot: &(impl Kinematics + ?Sized), qs: &Joints, epsilon: f64) -> Self {
        Self { matrix: robot.spatial_jacobian(qs), epsilon }
    }

    /// Moore-Penrose pseudo-inverse, computed via SVD.
    pub fn pseudo_inverse(&self) -> Result<SMatrix<f64, DOF, 6>, &'static str> {
        self.matrix.pseudo_inverse(self.epsilon)
    }

    /// Computes the joint velocities required to achieve a desired end-effector twist
    ///
    /// # Arguments
    ///
    /// * `desired_end_effector_velocity` - A 6D vector representing the desired linear and angular velocity of the end-effector
    ///
    /// # Returns
    ///
    /// `Result<Joints, &'static str>` - Joint positions, with values representing joint velocities rather than angles,
    /// or an error message if the computation fails.
    ///
    /// The arm is redundant (seven joints for six degrees of freedom) so the Jacobian is never
    /// square and the pseudo-inverse is always used. The result is the minimal norm solution.
    pub fn velocities_from_vector(&self, desired_end_effector_velocity: &Vector6<f64>) -> Result<Joints, &'static str> {
        let jacobian_pseudoinverse = self.pseudo_inverse()?;
        Ok(from_vector(&(jacobian_pseudoinverse * desired_end_effector_velocity)))
    }
}

/// Function to compute the spatial Jacobian matrix for a given robot and joint configuration
/// by numerical differentiation.
///
/// # Arguments
///
/// * `robot` - A reference to the robot implementing the Kinematics trait
/// * `joints` - A reference to the joint configuration
/// * `epsilon` - A small value used for numerical differentiation
///
/// # Returns
///
/// A 6x7 matrix representing the Jacobian
///
/// Column `i` is the twist `log(T(q + ε·eᵢ) · T(q)⁻¹) / ε`, the motion of the end effector
/// expressed in the world frame when the joint `i` moves.
pub fn compute_jacobian<K: Kinematics + ?Sized>(robot: &K, joints: &Joints, epsilon: f64) -> JacobianMatrix {
    let mut jacobian = JacobianMatrix::zeros();
    let current_pose = robot.forward(joints);
    let current_inverse = current_pose.inverse();

    // Parallelize the loop using rayon
    let jacobian_columns: Vec<_> = (0..DOF).into_par_iter().map(|i| {
        let mut perturbed_qs = *joints;
        perturbed_qs[i] += epsilon;
        let perturbed_pose = robot.forward(&perturbed_qs);
        se3::log(&(perturbed_pose * current_inverse)) / epsilon
    }).collect();

    for (i, column) in jacobian_columns.into_iter().enumerate() {
        jacobian.fixed_view_mut::<6, 1>(0, i).copy_from(&column);
    }

    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::Pose;
    use na::{Isometry3, Translation3, UnitQuaternion};

    const EPSILON: f64 = 1e-6;

    /// Example implementation of the Kinematics trait for a single rotary joint robot
    /// When the first joint rotates, it affects the Y-position and the Z-orientation of the end-effector.
    /// In the world frame, the end effector twist of the joint about the origin has no linear part,
    /// only the angular velocity around Z equal to 1.
    /// No other joint affects the end-effector in this simple robot model.
    pub struct SingleRotaryJointRobot;

    impl Kinematics for SingleRotaryJointRobot {
        fn forward(&self, qs: &Joints) -> Pose {
            // Forward kinematics for a single rotary joint robot
            let angle = qs[0];
            let rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, angle);
            let translation = Translation3::new(angle.cos(), angle.sin(), 0.0);
            Isometry3::from_parts(translation, rotation)
        }
    }

    fn assert_matrix_approx_eq(left: &JacobianMatrix, right: &JacobianMatrix, epsilon: f64) {
        for i in 0..6 {
            for j in 0..DOF {
                assert!((left[(i, j)] - right[(i, j)]).abs() < epsilon, "left[{0},{1}] = {2} is not approximately equal to right[{0},{1}] = {3}", i, j, left[(i, j)], right[(i, j)]);
            }
        }
    }

    #[test]
    fn test_compute_jacobian() {
        let robot = SingleRotaryJointRobot;
        let joints: Joints = [0.0; DOF];
        let jacobian = compute_jacobian(&robot, &joints, EPSILON);
        let mut expected_jacobian = JacobianMatrix::zeros();
        expected_jacobian[(5, 0)] = 1.0; // Z orientation is affected by the first joint

        assert_matrix_approx_eq(&jacobian, &expected_jacobian, 1e-5);
    }

    #[test]
    fn test_body_jacobian_of_single_joint() {
        // In the end effector frame, the tip moves along its own Y axis with 1 m/s
        let robot = SingleRotaryJointRobot;
        let joints: Joints = [0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let jacobian = robot.body_jacobian(&joints);
        let mut expected_jacobian = JacobianMatrix::zeros();
        expected_jacobian[(1, 0)] = 1.0;
        expected_jacobian[(5, 0)] = 1.0;

        assert_matrix_approx_eq(&jacobian, &expected_jacobian, 1e-5);
    }

    #[test]
    fn test_velocities_from_vector() {
        let robot = SingleRotaryJointRobot;
        let initial_qs = [0.0; DOF];
        let jacobian = Jacobian::new(&robot, &initial_qs, EPSILON);

        // Rotation around Z with 1 rad/s needs the only joint to rotate with the same speed
        let desired_velocity = Vector6::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let result = jacobian.velocities_from_vector(&desired_velocity);

        assert!(result.is_ok());
        let joint_velocities = result.unwrap();
        println!("Computed joint velocities: {:?}", joint_velocities);

        assert!((joint_velocities[0] - 1.0).abs() < 1e-5);
        for velocity in &joint_velocities[1..] {
            assert!(velocity.abs() < 1e-9);
        }
    }
}
