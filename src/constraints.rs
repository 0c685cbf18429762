//! Joint and Cartesian limits of the arm.
//!
//! The checks are advisory: callers are informed, the robot wrapper logs a warning and proceeds.

use crate::kinematic_traits::{Joints, PosQuat, DOF};

/// Per joint position range and velocity magnitude bound. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    /// Lower position limit, radians
    pub lower: Joints,

    /// Upper position limit, radians
    pub upper: Joints,

    /// Maximal absolute joint velocity, radians per second
    pub velocity: Joints,
}

impl JointLimits {
    pub fn new(lower: Joints, upper: Joints, velocity: Joints) -> Self {
        JointLimits { lower, upper, velocity }
    }

    /// Physical limits of the Panda, see
    /// <https://frankaemika.github.io/docs/control_parameters.html#limits-for-panda>
    pub fn panda() -> Self {
        JointLimits {
            lower: [-2.8973, -1.7628, -2.8973, -3.0718, -2.8973, -0.0175, -2.8973],
            upper: [2.8973, 1.7628, 2.0, -0.0698, 2.8973, 3.7525, 2.8973],
            velocity: [2.175, 2.175, 2.175, 2.175, 2.61, 2.61, 2.61],
        }
    }

    /// True if every joint is within its position range, bounds included.
    pub fn compliant(&self, angles: &Joints) -> bool {
        (0..DOF).all(|i| angles[i] >= self.lower[i] && angles[i] <= self.upper[i])
    }

    /// [JointLimits::compliant] per batch element.
    pub fn within_joint_limits(&self, batch: &[Joints]) -> Vec<bool> {
        batch.iter().map(|angles| self.compliant(angles)).collect()
    }

    /// Moves every joint that is out of range to the nearest bound.
    pub fn clip(&self, angles: &mut Joints) {
        for i in 0..DOF {
            angles[i] = angles[i].clamp(self.lower[i], self.upper[i]);
        }
    }

    /// Largest joint displacement the velocity limits allow within `dt` seconds.
    pub fn max_step(&self, dt: f64) -> Joints {
        self.velocity.map(|v| v * dt)
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::panda()
    }
}

/// Axis aligned box the end effector target must be in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianLimits {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl CartesianLimits {
    pub fn new(lower: [f64; 3], upper: [f64; 3]) -> Self {
        CartesianLimits { lower, upper }
    }

    /// Workspace suggested for sim to real transfer as it is enforced on the real hardware
    /// (Polymetis Franka hardware configuration).
    pub fn panda() -> Self {
        CartesianLimits {
            lower: [0.1, -0.4, -0.05],
            upper: [1.0, 0.4, 1.0],
        }
    }

    /// True if the position part of the pose is inside the box, bounds included.
    /// Orientation is not checked.
    pub fn compliant(&self, pos_quat: &PosQuat) -> bool {
        (0..3).all(|i| pos_quat[i] >= self.lower[i] && pos_quat[i] <= self.upper[i])
    }

    /// [CartesianLimits::compliant] per batch element.
    pub fn within_cartesian_limits(&self, batch: &[PosQuat]) -> Vec<bool> {
        batch.iter().map(|pos_quat| self.compliant(pos_quat)).collect()
    }
}

impl Default for CartesianLimits {
    fn default() -> Self {
        Self::panda()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::JOINTS_READY;

    #[test]
    fn test_ready_pose_is_compliant() {
        assert!(JointLimits::panda().compliant(&JOINTS_READY));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let limits = JointLimits::panda();
        assert!(limits.compliant(&limits.lower));
        assert!(limits.compliant(&limits.upper));

        let mut beyond = limits.upper;
        beyond[3] += 1e-9;
        assert!(!limits.compliant(&beyond));
    }

    #[test]
    fn test_zero_joints_violate_j4_and_j6() {
        // J4 range is entirely negative
        let limits = JointLimits::panda();
        assert_eq!(limits.within_joint_limits(&[[0.0; DOF], JOINTS_READY]), vec![false, true]);
    }

    #[test]
    fn test_clip() {
        let limits = JointLimits::panda();
        let mut angles = [3.0, -2.0, 2.5, 0.0, 0.0, -1.0, 0.5];
        limits.clip(&mut angles);
        assert_eq!(angles, [2.8973, -1.7628, 2.0, -0.0698, 0.0, -0.0175, 0.5]);
        assert!(limits.compliant(&angles));
    }

    #[test]
    fn test_max_step() {
        let limits = JointLimits::panda();
        let step = limits.max_step(0.5);
        assert_eq!(step[0], 1.0875);
        assert_eq!(step[6], 1.305);
    }

    #[test]
    fn test_cartesian_box() {
        let limits = CartesianLimits::panda();
        let on_corner = [1.0, 0.4, 1.0, 1.0, 0.0, 0.0, 0.0];
        let lower_corner = [0.1, -0.4, -0.05, 1.0, 0.0, 0.0, 0.0];
        let beyond_x = [2.0, 0.0, 0.5, 1.0, 0.0, 0.0, 0.0];
        let beyond_y = [0.5, -1.4, 0.5, 1.0, 0.0, 0.0, 0.0];
        assert_eq!(
            limits.within_cartesian_limits(&[on_corner, lower_corner, beyond_x, beyond_y]),
            vec![true, true, false, false]
        );
    }
}
