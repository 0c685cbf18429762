//! Inverse kinematics and pose tracking for the seven axis Franka Panda arm, driven inside
//! a simulator.
//!
//! The crate converts desired end effector poses (position and unit quaternion) into joint
//! angles, checks them against the physical limits of the arm and servos a simulated
//! articulation towards them until the joints settle or the step budget runs out.
//!
//! # Features
//!
//! - Three interchangeable IK strategies selected at runtime:
//!   Levenberg-Marquardt optimization, fixed step Jacobian iteration and damped least squares
//!   with joint clipping (the "CPU" solver).
//! - All strategies are batched: any number of independent targets (one per simulated
//!   environment) are solved in one call, preserving the order.
//! - Solvers never report success themselves. The dispatcher recomputes forward kinematics
//!   of every returned configuration and compares it with the target.
//! - Joint and Cartesian limits are checked, but only advisory: violations are logged and
//!   the motion proceeds.
//! - The robot wrapper runs a small state machine (solve, actuate, poll) against any
//!   [articulation::Articulation], the physics engine being an external collaborator.
//!   [simulation::KinematicSimulation] is a stub articulation usable without a simulator.
//! - Configuration can be read from and written to YAML (feature `allow_filesystem`).
//!
//! # Pose format
//!
//! Poses are exchanged as `[x, y, z, w, i, j, k]` arrays ([kinematic_traits::PosQuat]),
//! position in meters and orientation as a quaternion with the scalar part first.
//!
//! ```
//! use std::sync::Arc;
//! use rs_panda_ik::config::PandaConfig;
//! use rs_panda_ik::ik::InverseKinematics;
//! use rs_panda_ik::ik_solver::IkSolver;
//! use rs_panda_ik::kinematic_traits::{Kinematics, JOINTS_READY};
//! use rs_panda_ik::kinematics_impl::PandaKinematics;
//! use rs_panda_ik::pos_quat::pose_to_pos_quat;
//!
//! let robot = Arc::new(PandaKinematics::default());
//! let target = pose_to_pos_quat(&robot.forward(&[0.1, -0.7, 0.1, -2.2, 0.1, 1.6, 0.9]));
//!
//! let ik = InverseKinematics::new(robot, &PandaConfig::default());
//! let (joints, success) = ik
//!     .inverse_kinematics(&[target], &[JOINTS_READY], IkSolver::LevenbergMarquardt, 0.0, 1e-4)
//!     .unwrap();
//! assert_eq!(joints.len(), 1);
//! assert!(success[0]);
//! ```

pub mod kinematic_traits;
pub mod parameters;
pub mod kinematics_impl;

pub mod se3;
pub mod pos_quat;

#[path = "utils/utils.rs"]
pub mod utils;

pub mod error;

pub mod constraints;

pub mod jacobian;

pub mod ik_solver;

#[path = "ik/levenberg_marquardt.rs"]
pub mod levenberg_marquardt;

#[path = "ik/jacobian_iteration.rs"]
pub mod jacobian_iteration;

#[path = "ik/damped_least_squares.rs"]
pub mod damped_least_squares;

pub mod ik;

pub mod config;

#[cfg(feature = "allow_filesystem")]
pub mod config_from_file;

pub mod articulation;

pub mod simulation;

pub mod franka;

pub mod test_poses;
