//! Gradient optimization: Levenberg-Marquardt over the SE(3) pose residual.

extern crate nalgebra as na;

use na::{SMatrix, SVector, Vector6};
use rayon::prelude::*;
use tracing::debug;

use crate::ik_solver::{Convergence, IkStrategy};
use crate::kinematic_traits::{to_vector, from_vector, Joints, Kinematics, Pose, DOF};
use crate::se3;

/// Damped Gauss-Newton minimization of `|log(FK(θ)⁻¹ · target)|²`, seeded with the guess.
///
/// The Jacobian of the residual is obtained by forward differences, so any [Kinematics]
/// works without providing an analytical Jacobian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardt {
    pub max_iterations: usize,

    /// Fraction of the computed update actually applied.
    pub step_size: f64,

    /// Added to the diagonal of `JᵀJ`.
    pub damping: f64,

    /// Stop when the squared residual norm falls under this value.
    pub abs_err_tolerance: f64,

    /// Stop when the squared residual norm decreases relatively less than this.
    pub rel_err_tolerance: f64,

    /// Joint perturbation for the finite differences.
    pub epsilon: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        LevenbergMarquardt {
            max_iterations: 20,
            step_size: 0.5,
            damping: 1e-3,
            abs_err_tolerance: 1e-10,
            rel_err_tolerance: 1e-8,
            epsilon: 1e-7,
        }
    }
}

/// Pose error in the local coordinates of the current end effector frame.
fn residual(robot: &dyn Kinematics, qs: &Joints, target: &Pose) -> Vector6<f64> {
    se3::log(&(robot.forward(qs).inverse() * target))
}

impl LevenbergMarquardt {
    fn residual_jacobian(&self, robot: &dyn Kinematics, qs: &Joints, r: &Vector6<f64>, target: &Pose)
                         -> SMatrix<f64, 6, DOF> {
        let mut jacobian = SMatrix::<f64, 6, DOF>::zeros();
        for i in 0..DOF {
            let mut perturbed = *qs;
            perturbed[i] += self.epsilon;
            let column = (residual(robot, &perturbed, target) - r) / self.epsilon;
            jacobian.set_column(i, &column);
        }
        jacobian
    }

    /// Solves the damped normal equations `(JᵀJ + λI)·δ = -Jᵀr`.
    fn update(&self, jacobian: &SMatrix<f64, 6, DOF>, r: &Vector6<f64>) -> Option<SVector<f64, DOF>> {
        let jt = jacobian.transpose();
        let a = jt * jacobian + SMatrix::<f64, DOF, DOF>::identity() * self.damping;
        let b = -(jt * r);
        match a.cholesky() {
            Some(cholesky) => Some(cholesky.solve(&b)),
            None => a.lu().solve(&b),
        }
    }
}

impl IkStrategy for LevenbergMarquardt {
    fn solve_one(&self, robot: &dyn Kinematics, target: &Pose, guess: &Joints) -> Convergence {
        let mut qs = to_vector(guess);
        let mut r = residual(robot, guess, target);
        let mut err = r.norm_squared();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            if err < self.abs_err_tolerance {
                converged = true;
                break;
            }
            let current = from_vector(&qs);
            let jacobian = self.residual_jacobian(robot, &current, &r, target);
            let Some(delta) = self.update(&jacobian, &r) else {
                debug!("Levenberg-Marquardt: singular normal equations at iteration {}", iterations);
                break;
            };
            qs += delta * self.step_size;
            iterations += 1;

            r = residual(robot, &from_vector(&qs), target);
            let new_err = r.norm_squared();
            let relative_decrease = (err - new_err).abs() / err;
            err = new_err;
            if relative_decrease < self.rel_err_tolerance {
                converged = err < self.abs_err_tolerance;
                break;
            }
        }
        if err < self.abs_err_tolerance {
            converged = true;
        }

        debug!("Levenberg-Marquardt: {} iterations, squared error {:.3e}", iterations, err);
        Convergence { joints: from_vector(&qs), iterations, error: err.sqrt(), converged }
    }

    fn solve(&self, robot: &dyn Kinematics, targets: &[Pose], guesses: &[Joints]) -> Vec<Joints> {
        targets
            .par_iter()
            .zip(guesses.par_iter())
            .map(|(target, guess)| self.solve_one(robot, target, guess).joints)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::JOINTS_READY;
    use crate::kinematics_impl::PandaKinematics;

    #[test]
    fn test_guess_at_solution_is_kept() {
        let robot = PandaKinematics::default();
        let target = robot.forward(&JOINTS_READY);
        let result = LevenbergMarquardt::default().solve_one(&robot, &target, &JOINTS_READY);
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.joints, JOINTS_READY);
    }

    #[test]
    fn test_nearby_target() {
        let robot = PandaKinematics::default();
        let goal = [0.1, -0.7, 0.1, -2.2, 0.1, 1.6, 0.9];
        let target = robot.forward(&goal);
        let result = LevenbergMarquardt::default().solve_one(&robot, &target, &JOINTS_READY);
        assert!(result.iterations <= 20);
        assert!(result.error < 1e-4, "error {}", result.error);
        let reached = robot.forward(&result.joints);
        assert!((reached.translation.vector - target.translation.vector).norm() < 1e-4);
    }
}
