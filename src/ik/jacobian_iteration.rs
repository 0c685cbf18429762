//! Manual Jacobian iteration: fixed fraction steps along the pseudo-inverse of the spatial
//! Jacobian.

use rayon::prelude::*;
use tracing::debug;

use crate::ik_solver::{Convergence, IkStrategy};
use crate::jacobian::Jacobian;
use crate::kinematic_traits::{Joints, Kinematics, Pose, DOF};
use crate::se3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobianIteration {
    pub max_iterations: usize,

    /// Fraction of the pseudo-inverse step applied per iteration.
    pub step_size: f64,

    /// Iteration stops when the norm of the spatial pose error is below.
    pub tolerance: f64,

    /// Singular values below this are ignored by the pseudo-inverse.
    pub pinv_epsilon: f64,
}

impl Default for JacobianIteration {
    fn default() -> Self {
        JacobianIteration {
            max_iterations: 50,
            step_size: 0.2,
            tolerance: 1e-4,
            pinv_epsilon: 1e-10,
        }
    }
}

impl IkStrategy for JacobianIteration {
    fn solve_one(&self, robot: &dyn Kinematics, target: &Pose, guess: &Joints) -> Convergence {
        let mut qs = *guess;
        let mut iterations = 0;
        let mut converged = false;

        // Spatial error: the twist that moves the current pose onto the target.
        let spatial_error = |qs: &Joints| se3::log(&(target * robot.forward(qs).inverse()));

        while iterations < self.max_iterations {
            let error = spatial_error(&qs);
            if error.norm() < self.tolerance {
                converged = true;
                break;
            }
            let jacobian = Jacobian::spatial(robot, &qs, self.pinv_epsilon);
            let delta = match jacobian.velocities_from_vector(&error) {
                Ok(delta) => delta,
                Err(msg) => {
                    debug!("Jacobian iteration stopped: {}", msg);
                    break;
                }
            };
            for i in 0..DOF {
                qs[i] += self.step_size * delta[i];
            }
            iterations += 1;
        }

        let error = spatial_error(&qs).norm();
        if error < self.tolerance {
            converged = true;
        }
        debug!("Jacobian iteration: {} iterations, error {:.3e}", iterations, error);
        Convergence { joints: qs, iterations, error, converged }
    }

    fn solve(&self, robot: &dyn Kinematics, targets: &[Pose], guesses: &[Joints]) -> Vec<Joints> {
        targets
            .par_iter()
            .zip(guesses.par_iter())
            .map(|(target, guess)| self.solve_one(robot, target, guess).joints)
            .collect()
    }
}
