//! The robot wrapper: solves for the joints, checks the limits and servos the articulation
//! until the joints settle.

use std::sync::Arc;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use tracing::{debug, warn};

use crate::articulation::Articulation;
use crate::config::PandaConfig;
use crate::constraints::{CartesianLimits, JointLimits};
use crate::error::PandaError;
use crate::ik::InverseKinematics;
use crate::ik_solver::IkSolver;
use crate::kinematic_traits::{JacobianMatrix, Joints, Kinematics, PosQuat, DOF};
use crate::kinematics_impl::PandaKinematics;
use crate::pos_quat::all_close;

/// Finger effort that opens the gripper.
pub const OPEN_GRIPPER_EFFORT: f64 = 4.0;

/// Finger effort that closes the gripper.
pub const CLOSE_GRIPPER_EFFORT: f64 = -20.0;

/// Tolerances of the "joints are at the target" check while polling.
pub const POLL_RTOL: f64 = 1e-5;
pub const POLL_ATOL: f64 = 1e-8;

/// Where the controller is in reaching its current goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalState {
    /// No goal in progress: none requested yet, or the last one was rejected.
    Idle,
    Solving,
    Actuating,
    Polling,
    Converged,
    TimedOut,
}

/// How the goal ended. `steps` is the number of physics steps taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    Converged { steps: usize },
    TimedOut { steps: usize },
}

impl GoalOutcome {
    pub fn converged(&self) -> bool {
        matches!(self, GoalOutcome::Converged { .. })
    }

    pub fn steps(&self) -> usize {
        match *self {
            GoalOutcome::Converged { steps } | GoalOutcome::TimedOut { steps } => steps,
        }
    }
}

/// Franka Panda arm driven through an [Articulation]. All poses are `[x, y, z, w, i, j, k]`,
/// one per environment.
///
/// Limit violations are only reported (logged as warnings), the motion proceeds anyway.
pub struct FrankaPanda<A: Articulation> {
    articulation: A,
    ik: InverseKinematics,
    joint_limits: JointLimits,
    cartesian_limits: CartesianLimits,
    rtol: f64,
    atol: f64,
    max_steps: usize,
    state: GoalState,
}

impl<A: Articulation> FrankaPanda<A> {
    pub fn new(articulation: A, robot: Arc<dyn Kinematics>, config: &PandaConfig) -> Self {
        FrankaPanda {
            articulation,
            ik: InverseKinematics::new(robot, config),
            joint_limits: config.joint_limits,
            cartesian_limits: config.cartesian_limits,
            rtol: config.rtol,
            atol: config.atol,
            max_steps: config.max_steps,
            state: GoalState::Idle,
        }
    }

    /// Panda kinematics with the hand, default configuration.
    pub fn with_articulation(articulation: A) -> Self {
        Self::new(articulation, Arc::new(PandaKinematics::default()), &PandaConfig::default())
    }

    pub fn state(&self) -> GoalState {
        self.state
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn joint_limits(&self) -> &JointLimits {
        &self.joint_limits
    }

    pub fn cartesian_limits(&self) -> &CartesianLimits {
        &self.cartesian_limits
    }

    pub fn ik(&self) -> &InverseKinematics {
        &self.ik
    }

    pub fn articulation(&self) -> &A {
        &self.articulation
    }

    pub fn articulation_mut(&mut self) -> &mut A {
        &mut self.articulation
    }

    /// Puts every environment back to the default joint state and runs one physics step.
    pub fn reset(&mut self) {
        let (positions, velocities) = self.articulation.default_joint_state();
        self.articulation.write_joint_state_to_sim(&positions, &velocities);
        self.articulation.reset();
        self.articulation.write_data_to_sim();
        self.articulation.step();
        self.state = GoalState::Idle;
    }

    pub fn joint_position(&self) -> Vec<Joints> {
        self.articulation.joint_positions()
    }

    /// End effector pose of the current joint positions.
    pub fn ee_pos_quat(&self) -> Vec<PosQuat> {
        self.ik.forward_kinematics(&self.joint_position())
    }

    pub fn forward_kinematics(&self, joints: &[Joints]) -> Vec<PosQuat> {
        self.ik.forward_kinematics(joints)
    }

    pub fn spatial_jacobian(&self, joints: &Joints) -> JacobianMatrix {
        self.ik.robot().spatial_jacobian(joints)
    }

    pub fn body_jacobian(&self, joints: &Joints) -> JacobianMatrix {
        self.ik.robot().body_jacobian(joints)
    }

    /// Random joint values in `[0, 1)`, `batch` entries or one per environment.
    pub fn random_theta<R: Rng + ?Sized>(&self, rng: &mut R, batch: Option<usize>) -> Vec<Joints> {
        let batch = batch.unwrap_or_else(|| self.articulation.num_envs());
        (0..batch).map(|_| std::array::from_fn(|_| rng.gen_range(0.0..1.0))).collect()
    }

    /// Random targets in front of the robot (`x` in `[0.4, 0.6]`, `y` in `[-0.1, 0.1]`,
    /// `z` in `[0.3, 0.7]`) with uniformly distributed orientation.
    pub fn random_ee_pos_quat<R: Rng + ?Sized>(&self, rng: &mut R, batch: Option<usize>) -> Vec<PosQuat> {
        let batch = batch.unwrap_or_else(|| self.articulation.num_envs());
        let x = Uniform::new_inclusive(0.4, 0.6);
        let y = Uniform::new_inclusive(-0.1, 0.1);
        let z = Uniform::new_inclusive(0.3, 0.7);
        (0..batch)
            .map(|_| {
                let [w, i, j, k] = random_quaternion(rng);
                [x.sample(rng), y.sample(rng), z.sample(rng), w, i, j, k]
            })
            .collect()
    }

    /// Solves for the targets starting from `guesses`, or from the current joint positions
    /// if no guesses are given.
    pub fn inverse_kinematics(&self, targets: &[PosQuat], guesses: Option<&[Joints]>, solver: IkSolver)
                              -> Result<(Vec<Joints>, Vec<bool>), PandaError> {
        match guesses {
            Some(guesses) => self.ik.inverse_kinematics(targets, guesses, solver, self.rtol, self.atol),
            None => {
                let current = self.joint_position();
                self.ik.inverse_kinematics(targets, &current, solver, self.rtol, self.atol)
            }
        }
    }

    pub fn within_joint_limits(&self, joints: &[Joints]) -> Vec<bool> {
        self.joint_limits.within_joint_limits(joints)
    }

    pub fn within_cartesian_limits(&self, targets: &[PosQuat]) -> Vec<bool> {
        self.cartesian_limits.within_cartesian_limits(targets)
    }

    /// Commands the joint position targets and polls until the joints are at the targets,
    /// at most `max_steps` physics steps. Never fails: not settling in time is reported as
    /// [GoalOutcome::TimedOut].
    pub fn goto_joint_position(&mut self, targets: &[Joints], max_steps: usize) -> GoalOutcome {
        self.transition(GoalState::Actuating);
        self.warn_joint_limits(targets, "Trying to goto out of limits joint position");
        self.articulation.set_joint_position_target(targets);
        self.articulation.set_joint_velocity_target(&vec![[0.0; DOF]; targets.len()]);

        self.transition(GoalState::Polling);
        let wanted = targets.as_flattened();
        for step in 0..max_steps {
            let current = self.articulation.joint_positions();
            if all_close(wanted, current.as_flattened(), POLL_RTOL, POLL_ATOL) {
                self.transition(GoalState::Converged);
                return GoalOutcome::Converged { steps: step };
            }
            self.articulation.write_data_to_sim();
            self.articulation.step();
        }
        self.transition(GoalState::TimedOut);
        GoalOutcome::TimedOut { steps: max_steps }
    }

    /// Teleports the joints to the given positions, makes them the targets and runs one step.
    pub fn set_joint_position(&mut self, joints: &[Joints]) {
        self.warn_joint_limits(joints, "Trying to set out of limits joint position");
        let velocities = vec![[0.0; DOF]; joints.len()];
        self.articulation.write_joint_state_to_sim(joints, &velocities);
        self.articulation.set_joint_position_target(joints);
        self.articulation.write_data_to_sim();
        self.let_run(1);
    }

    /// Solves for the end effector targets (from the current joints) and moves there.
    /// Returns per environment IK success and how the motion ended.
    pub fn goto_ee_pos_quat(&mut self, targets: &[PosQuat], max_steps: usize, solver: IkSolver)
                            -> Result<(Vec<bool>, GoalOutcome), PandaError> {
        self.warn_cartesian_limits(targets);
        let (joints, success) = self.solve_goal(targets, solver)?;
        let outcome = self.goto_joint_position(&joints, max_steps);
        Ok((success, outcome))
    }

    /// Solves for the end effector targets and teleports the joints there.
    pub fn set_ee_pos_quat(&mut self, targets: &[PosQuat], solver: IkSolver) -> Result<Vec<bool>, PandaError> {
        let (joints, success) = self.solve_goal(targets, solver)?;
        self.set_joint_position(&joints);
        Ok(success)
    }

    pub fn open_gripper(&mut self) {
        self.articulation.set_finger_effort_target(OPEN_GRIPPER_EFFORT);
        self.articulation.write_data_to_sim();
    }

    pub fn close_gripper(&mut self) {
        self.articulation.set_finger_effort_target(CLOSE_GRIPPER_EFFORT);
        self.articulation.write_data_to_sim();
    }

    /// Holds the current joint positions for the given number of physics steps.
    pub fn let_run(&mut self, steps: usize) {
        for _ in 0..steps {
            let current = self.articulation.joint_positions();
            self.articulation.set_joint_position_target(&current);
            self.articulation.set_joint_velocity_target(&vec![[0.0; DOF]; current.len()]);
            self.articulation.write_data_to_sim();
            self.articulation.step();
        }
    }

    /// Solving state of a new goal. A rejected request leaves the controller idle.
    fn solve_goal(&mut self, targets: &[PosQuat], solver: IkSolver)
                  -> Result<(Vec<Joints>, Vec<bool>), PandaError> {
        self.transition(GoalState::Solving);
        let solution = self.inverse_kinematics(targets, None, solver);
        if let Err(e) = &solution {
            warn!("Goal rejected: {}", e);
            self.transition(GoalState::Idle);
        }
        solution
    }

    fn transition(&mut self, state: GoalState) {
        debug!("Goal state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn warn_joint_limits(&self, joints: &[Joints], message: &str) {
        let outside = self.within_joint_limits(joints).iter().filter(|ok| !**ok).count();
        if outside > 0 {
            warn!("{} ({} of {} environments)", message, outside, joints.len());
        }
    }

    fn warn_cartesian_limits(&self, targets: &[PosQuat]) {
        let outside = self.within_cartesian_limits(targets).iter().filter(|ok| !**ok).count();
        if outside > 0 {
            warn!(
                "Desired end effector position is out of limits ({} of {} environments)",
                outside,
                targets.len()
            );
        }
    }
}

/// Uniformly distributed unit quaternion `[w, i, j, k]` (K. Shoemake, Graphics Gems III).
fn random_quaternion<R: Rng + ?Sized>(rng: &mut R) -> [f64; 4] {
    let u1: f64 = rng.gen_range(0.0..1.0);
    let u2: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let u3: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    [b * u3.cos(), a * u2.sin(), a * u2.cos(), b * u3.sin()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{KinematicSimulation, DEFAULT_JOINTS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reset_restores_default_joints() {
        let mut robot = FrankaPanda::with_articulation(KinematicSimulation::new(3));
        robot.set_joint_position(&[[0.1, -0.5, 0.1, -2.0, 0.1, 1.5, 0.5]; 3]);
        robot.reset();
        assert_eq!(robot.joint_position(), vec![DEFAULT_JOINTS; 3]);
        assert_eq!(robot.state(), GoalState::Idle);
    }

    #[test]
    fn test_already_at_target_converges_without_steps() {
        let mut robot = FrankaPanda::with_articulation(KinematicSimulation::new(2));
        let outcome = robot.goto_joint_position(&[DEFAULT_JOINTS; 2], 10);
        assert_eq!(outcome, GoalOutcome::Converged { steps: 0 });
        assert_eq!(robot.articulation().steps(), 0);
    }

    #[test]
    fn test_set_joint_position_teleports() {
        let mut robot = FrankaPanda::with_articulation(KinematicSimulation::new(1));
        let joints = [0.2, -0.3, 0.2, -1.8, 0.1, 1.7, 0.3];
        robot.set_joint_position(&[joints]);
        assert_eq!(robot.joint_position(), vec![joints]);
        assert_eq!(robot.articulation().steps(), 1);
    }

    #[test]
    fn test_gripper_commands() {
        let mut robot = FrankaPanda::with_articulation(KinematicSimulation::new(1));
        robot.close_gripper();
        robot.let_run(20);
        assert_eq!(robot.articulation().finger_positions(), vec![[0.0, 0.0]]);
        robot.open_gripper();
        robot.let_run(20);
        assert_eq!(robot.articulation().finger_positions(), vec![[0.04, 0.04]]);
    }

    #[test]
    fn test_let_run_holds_position() {
        let mut robot = FrankaPanda::with_articulation(KinematicSimulation::new(2));
        robot.let_run(5);
        assert_eq!(robot.joint_position(), vec![DEFAULT_JOINTS; 2]);
        assert_eq!(robot.articulation().steps(), 5);
    }

    #[test]
    fn test_random_targets_are_in_the_box() {
        let robot = FrankaPanda::with_articulation(KinematicSimulation::new(4));
        let mut rng = StdRng::seed_from_u64(42);
        let targets = robot.random_ee_pos_quat(&mut rng, None);
        assert_eq!(targets.len(), 4);
        for target in targets {
            assert!((0.4..=0.6).contains(&target[0]));
            assert!((-0.1..=0.1).contains(&target[1]));
            assert!((0.3..=0.7).contains(&target[2]));
            let norm = target[3..].iter().map(|c| c * c).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
        let theta = robot.random_theta(&mut rng, Some(10));
        assert_eq!(theta.len(), 10);
        assert!(theta.iter().flatten().all(|q| (0.0..1.0).contains(q)));
    }

    #[test]
    fn test_jacobian_passthrough() {
        let robot = FrankaPanda::with_articulation(KinematicSimulation::new(1));
        let spatial = robot.spatial_jacobian(&DEFAULT_JOINTS);
        let body = robot.body_jacobian(&DEFAULT_JOINTS);
        // The base joint rotates around the world Z axis
        assert!((spatial[(5, 0)] - 1.0).abs() < 1e-12);
        for i in 0..DOF {
            assert!((body.fixed_view::<3, 1>(3, i).norm() - 1.0).abs() < 1e-9);
        }
    }
}
