//! Solver dispatch: selects the strategy, times it and verifies its output independently of
//! what the strategy itself believes.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::PandaConfig;
use crate::damped_least_squares::DampedLeastSquares;
use crate::error::PandaError;
use crate::ik_solver::{IkSolver, IkStrategy};
use crate::jacobian_iteration::JacobianIteration;
use crate::kinematic_traits::{Joints, Kinematics, PosQuat};
use crate::levenberg_marquardt::LevenbergMarquardt;
use crate::pos_quat::{
    align_quaternion, all_close, normalize_quat_in_pos_quat, pos_quat_to_pose, pose_to_pos_quat,
    quaternion_of, spherical_distance_quat,
};

pub struct InverseKinematics {
    robot: Arc<dyn Kinematics>,
    levenberg_marquardt: LevenbergMarquardt,
    jacobian: JacobianIteration,
    pinocchio_cpu: DampedLeastSquares,
    default_solver: IkSolver,
    rtol: f64,
    atol: f64,
    verbose: bool,
}

impl InverseKinematics {
    pub fn new(robot: Arc<dyn Kinematics>, config: &PandaConfig) -> Self {
        InverseKinematics {
            robot,
            levenberg_marquardt: config.levenberg_marquardt,
            jacobian: config.jacobian,
            pinocchio_cpu: DampedLeastSquares { limits: config.joint_limits, ..config.pinocchio_cpu },
            default_solver: config.default_solver,
            rtol: config.rtol,
            atol: config.atol,
            verbose: config.verbose,
        }
    }

    pub fn robot(&self) -> &Arc<dyn Kinematics> {
        &self.robot
    }

    pub fn default_solver(&self) -> IkSolver {
        self.default_solver
    }

    /// Solver for the name, the configured default if the name is not known.
    pub fn resolve(&self, name: &str) -> IkSolver {
        IkSolver::resolve(name, self.default_solver)
    }

    pub fn strategy(&self, solver: IkSolver) -> &dyn IkStrategy {
        match solver {
            IkSolver::LevenbergMarquardt => &self.levenberg_marquardt,
            IkSolver::Jacobian => &self.jacobian,
            IkSolver::PinocchioCpu => &self.pinocchio_cpu,
        }
    }

    /// End effector poses for the joint configurations.
    pub fn forward_kinematics(&self, joints: &[Joints]) -> Vec<PosQuat> {
        joints.iter().map(|qs| pose_to_pos_quat(&self.robot.forward(qs))).collect()
    }

    /// Solves the batch of targets with the given solver, starting from the guesses (one per
    /// target). Returns the configurations and, per element, whether forward kinematics of the
    /// configuration is close to the target: `|computed - target| <= atol + rtol * |target|`
    /// for every one of the seven pose components.
    ///
    /// Unreachable targets are not errors, they are reported as unsuccessful. The only error
    /// is the batch size mismatch.
    pub fn inverse_kinematics(
        &self,
        targets: &[PosQuat],
        guesses: &[Joints],
        solver: IkSolver,
        rtol: f64,
        atol: f64,
    ) -> Result<(Vec<Joints>, Vec<bool>), PandaError> {
        if targets.len() != guesses.len() {
            return Err(PandaError::BatchMismatch { targets: targets.len(), guesses: guesses.len() });
        }
        let poses: Vec<_> = targets.iter().map(pos_quat_to_pose).collect();

        let start = Instant::now();
        let computed = self.strategy(solver).solve(self.robot.as_ref(), &poses, guesses);
        let ms_elapsed = start.elapsed().as_secs_f64() * 1000.0;
        if self.verbose {
            info!("Franka IK: {} took {:.3} ms", solver, ms_elapsed);
        } else {
            debug!("Franka IK: {} took {:.3} ms for {} targets", solver, ms_elapsed, targets.len());
        }

        let success = self.verify(targets, &computed, rtol, atol);
        Ok((computed, success))
    }

    /// [InverseKinematics::inverse_kinematics] with the solver given by name and the
    /// configured tolerances.
    pub fn inverse_kinematics_named(&self, targets: &[PosQuat], guesses: &[Joints], name: &str)
                                    -> Result<(Vec<Joints>, Vec<bool>), PandaError> {
        self.inverse_kinematics(targets, guesses, self.resolve(name), self.rtol, self.atol)
    }

    /// [InverseKinematics::inverse_kinematics] with the configured tolerances.
    pub fn solve(&self, targets: &[PosQuat], guesses: &[Joints], solver: IkSolver)
                 -> Result<(Vec<Joints>, Vec<bool>), PandaError> {
        self.inverse_kinematics(targets, guesses, solver, self.rtol, self.atol)
    }

    /// Recomputes forward kinematics for every configuration and compares it with the target.
    /// The quaternion is compared in the hemisphere of the target as `q` and `-q` are the
    /// same rotation.
    pub fn verify(&self, targets: &[PosQuat], joints: &[Joints], rtol: f64, atol: f64) -> Vec<bool> {
        let computed = self.forward_kinematics(joints);
        let mut position_error = 0.0;
        let mut rotation_error = 0.0;

        let success: Vec<bool> = targets
            .iter()
            .zip(&computed)
            .map(|(target, computed)| {
                let target = normalize_quat_in_pos_quat(target);
                let computed = align_quaternion(computed, &target);
                position_error += (0..3).map(|i| (computed[i] - target[i]).abs()).sum::<f64>();
                rotation_error += spherical_distance_quat(&quaternion_of(&computed), &quaternion_of(&target)).abs();
                all_close(&computed, &target, rtol, atol)
            })
            .collect();

        if !success.is_empty() {
            let n = success.len() as f64;
            debug!(
                "Mean err pos: {:.6}, rot: {:.6}",
                position_error / (3.0 * n),
                rotation_error / n
            );
        }
        success
    }
}
