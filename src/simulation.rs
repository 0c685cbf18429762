//! Kinematic stand-in for the physics engine.

use crate::articulation::Articulation;
use crate::constraints::JointLimits;
use crate::kinematic_traits::{Fingers, Joints, DOF};

/// Default joint positions of the Panda in the simulator.
pub const DEFAULT_JOINTS: Joints = [0.0, -0.569, 0.0, -2.810, 0.0, 3.037, 0.741];

/// Finger position when fully open, meters.
pub const FINGERS_OPEN: f64 = 0.04;

pub const PHYSICS_DT: f64 = 1.0 / 60.0;

/// Finger speed, meters per second.
const FINGER_SPEED: f64 = 0.2;

/// Articulation without dynamics: on every step each joint moves towards its position target
/// with the largest displacement the velocity limit allows, landing exactly on the target
/// once it is within reach. Fingers move to open or closed depending on the sign of the
/// effort.
#[derive(Debug, Clone)]
pub struct KinematicSimulation {
    dt: f64,
    limits: JointLimits,
    default_joints: Joints,

    positions: Vec<Joints>,
    velocities: Vec<Joints>,
    fingers: Vec<Fingers>,

    // Buffered until write_data_to_sim
    pending_position_targets: Option<Vec<Joints>>,
    pending_velocity_targets: Option<Vec<Joints>>,
    pending_finger_effort: Option<f64>,

    position_targets: Vec<Joints>,
    finger_effort: f64,
    steps: usize,
}

impl KinematicSimulation {
    pub fn new(num_envs: usize) -> Self {
        Self::with_limits(num_envs, JointLimits::panda(), PHYSICS_DT)
    }

    pub fn with_limits(num_envs: usize, limits: JointLimits, dt: f64) -> Self {
        KinematicSimulation {
            dt,
            limits,
            default_joints: DEFAULT_JOINTS,
            positions: vec![DEFAULT_JOINTS; num_envs],
            velocities: vec![[0.0; DOF]; num_envs],
            fingers: vec![[FINGERS_OPEN; 2]; num_envs],
            pending_position_targets: None,
            pending_velocity_targets: None,
            pending_finger_effort: None,
            position_targets: vec![DEFAULT_JOINTS; num_envs],
            finger_effort: 0.0,
            steps: 0,
        }
    }

    /// Physics steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Position targets the simulation currently tracks.
    pub fn position_targets(&self) -> &[Joints] {
        &self.position_targets
    }
}

impl Articulation for KinematicSimulation {
    fn num_envs(&self) -> usize {
        self.positions.len()
    }

    fn physics_dt(&self) -> f64 {
        self.dt
    }

    fn joint_positions(&self) -> Vec<Joints> {
        self.positions.clone()
    }

    fn finger_positions(&self) -> Vec<Fingers> {
        self.fingers.clone()
    }

    fn default_joint_state(&self) -> (Vec<Joints>, Vec<Joints>) {
        let n = self.num_envs();
        (vec![self.default_joints; n], vec![[0.0; DOF]; n])
    }

    fn write_joint_state_to_sim(&mut self, positions: &[Joints], velocities: &[Joints]) {
        self.positions = positions.to_vec();
        self.velocities = velocities.to_vec();
    }

    fn set_joint_position_target(&mut self, targets: &[Joints]) {
        self.pending_position_targets = Some(targets.to_vec());
    }

    fn set_joint_velocity_target(&mut self, targets: &[Joints]) {
        self.pending_velocity_targets = Some(targets.to_vec());
    }

    fn set_finger_effort_target(&mut self, effort: f64) {
        self.pending_finger_effort = Some(effort);
    }

    fn reset(&mut self) {
        self.pending_position_targets = None;
        self.pending_velocity_targets = None;
        self.pending_finger_effort = None;
        self.position_targets = self.positions.clone();
        self.finger_effort = 0.0;
    }

    fn write_data_to_sim(&mut self) {
        if let Some(targets) = self.pending_position_targets.take() {
            self.position_targets = targets;
        }
        // Velocity targets only damp the motion of a real drive, nothing to track here
        self.pending_velocity_targets = None;
        if let Some(effort) = self.pending_finger_effort.take() {
            self.finger_effort = effort;
        }
    }

    fn step(&mut self) {
        let max_step = self.limits.max_step(self.dt);
        for (positions, targets) in self.positions.iter_mut().zip(&self.position_targets) {
            for i in 0..DOF {
                let delta = targets[i] - positions[i];
                positions[i] = if delta.abs() <= max_step[i] {
                    targets[i]
                } else {
                    positions[i] + max_step[i].copysign(delta)
                };
            }
        }
        for velocities in self.velocities.iter_mut() {
            *velocities = [0.0; DOF];
        }

        let finger_target = if self.finger_effort > 0.0 {
            Some(FINGERS_OPEN)
        } else if self.finger_effort < 0.0 {
            Some(0.0)
        } else {
            None
        };
        if let Some(target) = finger_target {
            let max_finger_step = FINGER_SPEED * self.dt;
            for fingers in self.fingers.iter_mut() {
                for finger in fingers.iter_mut() {
                    let delta = target - *finger;
                    *finger = if delta.abs() <= max_finger_step {
                        target
                    } else {
                        *finger + max_finger_step.copysign(delta)
                    };
                }
            }
        }
        self.steps += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_buffered() {
        let mut sim = KinematicSimulation::new(2);
        let target = [0.01; DOF];
        sim.set_joint_position_target(&[target, target]);
        sim.step();
        assert_eq!(sim.joint_positions(), vec![DEFAULT_JOINTS; 2]);

        sim.write_data_to_sim();
        sim.step();
        assert_ne!(sim.joint_positions()[0], DEFAULT_JOINTS);
    }

    #[test]
    fn test_step_is_rate_limited() {
        let mut sim = KinematicSimulation::new(1);
        let mut target = DEFAULT_JOINTS;
        target[0] += 1.0;
        target[6] += 0.01;
        sim.set_joint_position_target(&[target]);
        sim.write_data_to_sim();
        sim.step();

        let positions = sim.joint_positions()[0];
        let max_step = JointLimits::panda().max_step(PHYSICS_DT);
        assert_eq!(positions[0], DEFAULT_JOINTS[0] + max_step[0]);
        assert_eq!(positions[6], target[6]);
        assert_eq!(positions[1], DEFAULT_JOINTS[1]);
    }

    #[test]
    fn test_reaches_target() {
        let mut sim = KinematicSimulation::new(1);
        let target = [0.5, -0.2, 0.3, -2.0, 0.1, 2.5, 0.0];
        sim.set_joint_position_target(&[target]);
        sim.write_data_to_sim();
        for _ in 0..100 {
            sim.step();
        }
        assert_eq!(sim.joint_positions(), vec![target]);
        assert_eq!(sim.steps(), 100);
    }

    #[test]
    fn test_teleport() {
        let mut sim = KinematicSimulation::new(1);
        let state = [0.3; DOF];
        sim.write_joint_state_to_sim(&[state], &[[0.0; DOF]]);
        assert_eq!(sim.joint_positions(), vec![state]);
    }

    #[test]
    fn test_gripper() {
        let mut sim = KinematicSimulation::new(1);
        sim.set_finger_effort_target(-20.0);
        sim.write_data_to_sim();
        for _ in 0..30 {
            sim.step();
        }
        assert_eq!(sim.finger_positions(), vec![[0.0, 0.0]]);

        sim.set_finger_effort_target(4.0);
        sim.write_data_to_sim();
        for _ in 0..30 {
            sim.step();
        }
        assert_eq!(sim.finger_positions(), vec![[FINGERS_OPEN, FINGERS_OPEN]]);
    }
}
