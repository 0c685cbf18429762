//! Tunables of the solvers, the dispatcher and the controller.

use crate::constraints::{CartesianLimits, JointLimits};
use crate::damped_least_squares::DampedLeastSquares;
use crate::ik_solver::IkSolver;
use crate::jacobian_iteration::JacobianIteration;
use crate::levenberg_marquardt::LevenbergMarquardt;

/// Everything configurable about the robot wrapper. Defaults are the Franka Panda values.
#[derive(Debug, Clone, PartialEq)]
pub struct PandaConfig {
    /// Solver used when the requested name is not known.
    pub default_solver: IkSolver,

    /// Relative tolerance of the success check.
    pub rtol: f64,

    /// Absolute tolerance of the success check, per pose component.
    pub atol: f64,

    /// Physics steps the controller waits for the joints to settle.
    pub max_steps: usize,

    pub levenberg_marquardt: LevenbergMarquardt,
    pub jacobian: JacobianIteration,

    /// Limits used for clipping by this solver are overwritten with `joint_limits`.
    pub pinocchio_cpu: DampedLeastSquares,

    pub joint_limits: JointLimits,
    pub cartesian_limits: CartesianLimits,

    /// Print solver timing as info rather than debug.
    pub verbose: bool,
}

impl Default for PandaConfig {
    fn default() -> Self {
        PandaConfig {
            default_solver: IkSolver::PinocchioCpu,
            rtol: 0.0,
            atol: 1e-4,
            max_steps: 200,
            levenberg_marquardt: LevenbergMarquardt::default(),
            jacobian: JacobianIteration::default(),
            pinocchio_cpu: DampedLeastSquares::default(),
            joint_limits: JointLimits::panda(),
            cartesian_limits: CartesianLimits::panda(),
            verbose: false,
        }
    }
}
