//! Contract of the simulated actuators. The physics engine lives behind this trait.

use crate::kinematic_traits::{Fingers, Joints};

/// A batch of simulated arms (one per environment) that accept joint targets and advance
/// the physics on demand.
///
/// Targets set with the `set_*` methods are buffered and only reach the simulation with
/// [Articulation::write_data_to_sim]. [Articulation::write_joint_state_to_sim] bypasses the
/// physics and teleports the joints.
pub trait Articulation {
    fn num_envs(&self) -> usize;

    /// Duration of one physics step, seconds.
    fn physics_dt(&self) -> f64;

    /// Current arm joint positions, one entry per environment.
    fn joint_positions(&self) -> Vec<Joints>;

    fn finger_positions(&self) -> Vec<Fingers>;

    /// Joint positions and velocities the environments start with.
    fn default_joint_state(&self) -> (Vec<Joints>, Vec<Joints>);

    fn write_joint_state_to_sim(&mut self, positions: &[Joints], velocities: &[Joints]);

    fn set_joint_position_target(&mut self, targets: &[Joints]);

    fn set_joint_velocity_target(&mut self, targets: &[Joints]);

    /// Same effort for both fingers of every environment. Positive opens, negative closes.
    fn set_finger_effort_target(&mut self, effort: f64);

    /// Clears internal buffers, joint state is not changed.
    fn reset(&mut self);

    fn write_data_to_sim(&mut self);

    /// Advances the physics by [Articulation::physics_dt].
    fn step(&mut self);
}
