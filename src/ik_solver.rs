//! Solver identity and the contract every IK strategy implements.

use std::fmt;

use tracing::warn;

use crate::kinematic_traits::{Joints, Kinematics, Pose};

/// Available inverse kinematics strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IkSolver {
    /// Nonlinear least squares over the SE(3) residual (gradient optimization).
    LevenbergMarquardt,

    /// Fixed step iteration along the pseudo-inverse of the spatial Jacobian.
    Jacobian,

    /// Damped least squares on the body Jacobian with joint clipping (numerical CPU solver).
    PinocchioCpu,
}

/// Names accepted by [IkSolver::resolve]. Short aliases are kept for the command line.
pub const SOLVER_NAMES: [(&str, IkSolver); 5] = [
    ("cpu", IkSolver::PinocchioCpu),
    ("gpu", IkSolver::LevenbergMarquardt),
    ("levenberg_marquardt", IkSolver::LevenbergMarquardt),
    ("jacobian", IkSolver::Jacobian),
    ("pinocchio_cpu", IkSolver::PinocchioCpu),
];

/// Name the unknown solver names resolve to unless configured otherwise.
pub const DEFAULT_SOLVER_NAME: &str = "cpu";

impl IkSolver {
    /// Canonical name of the solver.
    pub fn name(&self) -> &'static str {
        match self {
            IkSolver::LevenbergMarquardt => "levenberg_marquardt",
            IkSolver::Jacobian => "jacobian",
            IkSolver::PinocchioCpu => "pinocchio_cpu",
        }
    }

    /// Exact lookup in [SOLVER_NAMES].
    pub fn from_name(name: &str) -> Option<IkSolver> {
        SOLVER_NAMES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, solver)| *solver)
    }

    /// Looks the name up, falling back to `default` with a warning if the name is not known.
    /// Never fails.
    pub fn resolve(name: &str, default: IkSolver) -> IkSolver {
        match Self::from_name(name) {
            Some(solver) => solver,
            None => {
                let available: Vec<&str> = SOLVER_NAMES.iter().map(|(known, _)| *known).collect();
                warn!(
                    "Unknown IK Solver of name: {}. Available solvers: {:?}. Defaulting to \"{}\".",
                    name,
                    available,
                    default.name()
                );
                default
            }
        }
    }
}

impl Default for IkSolver {
    fn default() -> Self {
        IkSolver::PinocchioCpu
    }
}

impl fmt::Display for IkSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of solving a single batch element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// The last iterate, returned even if the solver did not converge.
    pub joints: Joints,

    /// Iterations actually performed.
    pub iterations: usize,

    /// Solver specific error measure at `joints`.
    pub error: f64,

    /// True if the solver stopped because its own tolerance was reached.
    pub converged: bool,
}

/// Batched inverse kinematics strategy.
///
/// Elements are independent: the output at index `i` only depends on `targets[i]` and
/// `guesses[i]`, and the output has the same length and order as the input. Unreachable
/// targets never fail, the best effort configuration is returned instead and the caller
/// verifies it.
pub trait IkStrategy: Send + Sync {
    /// Solves a single element.
    fn solve_one(&self, robot: &dyn Kinematics, target: &Pose, guess: &Joints) -> Convergence;

    /// Solves all elements. `targets` and `guesses` must have the same length, this is checked
    /// by the caller.
    fn solve(&self, robot: &dyn Kinematics, targets: &[Pose], guesses: &[Joints]) -> Vec<Joints> {
        targets
            .iter()
            .zip(guesses)
            .map(|(target, guess)| self.solve_one(robot, target, guess).joints)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(IkSolver::from_name("cpu"), Some(IkSolver::PinocchioCpu));
        assert_eq!(IkSolver::from_name("gpu"), Some(IkSolver::LevenbergMarquardt));
        assert_eq!(IkSolver::from_name("jacobian"), Some(IkSolver::Jacobian));
        assert_eq!(IkSolver::from_name("quantum"), None);
    }

    #[test]
    fn test_canonical_names_resolve_to_themselves() {
        for solver in [IkSolver::LevenbergMarquardt, IkSolver::Jacobian, IkSolver::PinocchioCpu] {
            assert_eq!(IkSolver::resolve(&solver.to_string(), IkSolver::Jacobian), solver);
        }
    }

    #[test]
    fn test_unknown_name_falls_back() {
        assert_eq!(IkSolver::resolve("quantum", IkSolver::PinocchioCpu), IkSolver::PinocchioCpu);
        assert_eq!(IkSolver::resolve("", IkSolver::Jacobian), IkSolver::Jacobian);
        assert_eq!(IkSolver::from_name(DEFAULT_SOLVER_NAME), Some(IkSolver::default()));
    }
}
