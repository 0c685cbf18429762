//! Numerical CPU solver: damped least squares on the body Jacobian mapped through the
//! derivative of the SE(3) logarithm, joints clipped to their limits after every update.

extern crate nalgebra as na;

use na::Matrix6;
use tracing::debug;

use crate::constraints::JointLimits;
use crate::ik_solver::{Convergence, IkStrategy};
use crate::kinematic_traits::{Joints, Kinematics, Pose, DOF};
use crate::se3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampedLeastSquares {
    pub max_iterations: usize,

    /// Integration step applied to the joint velocity.
    pub step_size: f64,

    /// Added to the diagonal of `J·Jᵀ` before inverting.
    pub damping: f64,

    /// Converged when the norm of the local pose error is below.
    pub tolerance: f64,

    /// The joints are kept inside these after every update.
    pub limits: JointLimits,
}

impl Default for DampedLeastSquares {
    fn default() -> Self {
        DampedLeastSquares {
            max_iterations: 1000,
            step_size: 1e-1,
            damping: 1e-12,
            tolerance: 5e-4,
            limits: JointLimits::panda(),
        }
    }
}

impl IkStrategy for DampedLeastSquares {
    fn solve_one(&self, robot: &dyn Kinematics, target: &Pose, guess: &Joints) -> Convergence {
        let mut qs = *guess;
        let mut iterations = 0;
        loop {
            let local = robot.forward(&qs).inverse() * target;
            let error = se3::log(&local);
            let error_norm = error.norm();
            if error_norm < self.tolerance {
                debug!("Damped least squares: converged after {} iterations", iterations);
                return Convergence { joints: qs, iterations, error: error_norm, converged: true };
            }
            if iterations >= self.max_iterations {
                debug!("Damped least squares: no convergence, error {:.3e}", error_norm);
                return Convergence { joints: qs, iterations, error: error_norm, converged: false };
            }

            // Derivative of the error with respect to the joints
            let jacobian = -(se3::log_jacobian(&local.inverse()) * robot.body_jacobian(&qs));
            let jt = jacobian.transpose();
            let h = jacobian * jt + Matrix6::identity() * self.damping;
            let Some(g) = h.lu().solve(&error) else {
                debug!("Damped least squares: singular system at iteration {}", iterations);
                return Convergence { joints: qs, iterations, error: error_norm, converged: false };
            };
            let velocity = -(jt * g);
            for i in 0..DOF {
                qs[i] += self.step_size * velocity[i];
            }
            self.limits.clip(&mut qs);
            iterations += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::JOINTS_READY;
    use crate::kinematics_impl::PandaKinematics;

    #[test]
    fn test_nearby_target_converges() {
        let robot = PandaKinematics::default();
        let target = robot.forward(&[0.1, -0.7, 0.1, -2.2, 0.1, 1.6, 0.9]);
        let result = DampedLeastSquares::default().solve_one(&robot, &target, &JOINTS_READY);
        assert!(result.converged);
        assert!(result.error < 5e-4);
        assert!(JointLimits::panda().compliant(&result.joints));
    }

    #[test]
    fn test_result_is_clipped_even_when_unreachable() {
        // Far outside of the reach of the arm
        let robot = PandaKinematics::default();
        let target = Pose::translation(3.0, 0.0, 0.5);
        let solver = DampedLeastSquares { max_iterations: 50, ..DampedLeastSquares::default() };
        let result = solver.solve_one(&robot, &target, &JOINTS_READY);
        assert!(!result.converged);
        assert_eq!(result.iterations, 50);
        assert!(JointLimits::panda().compliant(&result.joints));
        assert!(result.joints.iter().all(|q| q.is_finite()));
    }
}
