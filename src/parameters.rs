//! Defines the kinematic parameter data structure of the arm

pub mod panda_kinematics {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
    use crate::kinematic_traits::DOF;

    /// Modified (Craig) Denavit-Hartenberg parameters of a seven joint arm, with the fixed
    /// transforms from the last joint to the flange and further to the tool center point.
    ///
    /// The transform from the frame `i - 1` to the frame `i` is
    /// `Rx(alpha[i]) * Tx(a[i]) * Rz(q[i]) * Tz(d[i])`.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Parameters {
        /// Link lengths a_{i-1} along the previous X axis, meters.
        pub a: [f64; DOF],

        /// Link offsets d_i along the joint Z axis, meters.
        pub d: [f64; DOF],

        /// Link twists alpha_{i-1} around the previous X axis, radians.
        pub alpha: [f64; DOF],

        /// Distance from the last joint frame to the flange along its Z axis.
        pub flange: f64,

        /// Rotation of the hand around the flange Z axis.
        pub hand_rotation: f64,

        /// Distance from the flange to the point between the fingertips (tool center point).
        pub tcp_offset: f64,
    }

    impl Parameters {
        /// Franka Emika Panda with the standard hand, tool center point between the fingertips.
        pub fn panda() -> Self {
            Parameters {
                a: [0.0, 0.0, 0.0, 0.0825, -0.0825, 0.0, 0.088],
                d: [0.333, 0.0, 0.316, 0.0, 0.384, 0.0, 0.0],
                alpha: [0.0, -FRAC_PI_2, FRAC_PI_2, FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2, FRAC_PI_2],
                flange: 0.107,
                hand_rotation: -FRAC_PI_4,
                tcp_offset: 0.1034,
            }
        }

        /// Panda without the hand, the pose being the flange.
        pub fn panda_flange() -> Self {
            Parameters {
                hand_rotation: 0.0,
                tcp_offset: 0.0,
                ..Self::panda()
            }
        }
    }

    impl Default for Parameters {
        fn default() -> Self {
            Self::panda()
        }
    }
}
