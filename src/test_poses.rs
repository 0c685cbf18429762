//! Reference end effector targets, `[x, y, z, w, i, j, k]`. The quaternions are not normalized
//! in the tables, use [hardcore_test_ee_poses] and [test_ee_poses].

use crate::kinematic_traits::PosQuat;
use crate::pos_quat::normalize_quat_in_pos_quat;

/// Targets near the corners of the workspace, some of them with orientations the arm may
/// not be able to take there.
pub const HARDCORE_TEST_EE_POSES: [PosQuat; 24] = [
    [0.6, -0.25, 0.15, 0.009, 0.72, -0.67, -0.014],
    [0.6, -0.25, 0.15, 0.7071, 0.7071, 0.0, 0.0],
    [0.6, -0.25, 0.15, 0.7071, 0.7071, 0.0, 0.0],
    [0.6, 0.25, 0.15, 0.009, 0.72, -0.67, -0.014],
    [0.6, 0.25, 0.15, 0.7071, 0.7071, 0.0, 0.0],
    [0.6, 0.25, 0.15, -0.7071, 0.7071, 0.0, 0.0],
    [0.6, 0.25, 0.65, 0.009, 0.72, -0.67, -0.014],
    [0.6, 0.25, 0.65, 0.7071, 0.7071, 0.0, 0.0],
    [0.6, 0.25, 0.65, -0.7071, 0.7071, 0.0, 0.0],
    [0.6, -0.25, 0.65, 0.009, 0.72, -0.67, -0.014],
    [0.6, -0.25, 0.65, 0.7071, 0.7071, 0.0, 0.0],
    [0.6, -0.25, 0.65, -0.7071, 0.7071, 0.0, 0.0],
    [0.35, -0.25, 0.15, 0.009, 0.72, -0.67, -0.014],
    [0.35, -0.25, 0.15, 0.7071, 0.7071, 0.0, 0.0],
    [0.35, -0.25, 0.15, -0.7071, 0.7071, 0.0, 0.0],
    [0.35, 0.25, 0.15, 0.009, 0.72, -0.67, -0.014],
    [0.35, 0.25, 0.15, 0.7071, 0.7071, 0.0, 0.0],
    [0.35, 0.25, 0.15, -0.7071, 0.7071, 0.0, 0.0],
    [0.35, 0.25, 0.45, 0.009, 0.72, -0.67, -0.014],
    [0.35, 0.25, 0.45, 0.7071, 0.7071, 0.0, 0.0],
    [0.35, 0.25, 0.45, -0.7071, 0.7071, 0.0, 0.0],
    [0.35, -0.25, 0.45, 0.009, 0.72, -0.67, -0.014],
    [0.35, -0.25, 0.45, 0.7071, 0.7071, 0.0, 0.0],
    [0.35, -0.25, 0.45, -0.7071, 0.7071, 0.0, 0.0],
];

/// A sweep along Y at the height of 0.5 m with the gripper turning around.
pub const TEST_EE_POSES: [PosQuat; 24] = [
    [0.3, -0.6, 0.5, 0.0, 1.0, 0.0, 0.0],
    [0.3, -0.5, 0.5, 0.0, 1.0, 0.1, 0.0],
    [0.3, -0.4, 0.5, 0.0, 1.0, 0.2, 0.0],
    [0.3, -0.3, 0.5, 0.0, 1.0, 0.3, 0.0],
    [0.3, -0.2, 0.5, 0.0, 1.0, 0.4, 0.0],
    [0.3, -0.2, 0.5, 0.0, 1.0, 0.5, 0.0],
    [0.3, -0.1, 0.5, 0.0, 1.0, 0.6, 0.0],
    [0.3, -0.0, 0.5, 0.0, 1.0, 0.7, 0.0],
    [0.3, -0.1, 0.5, 0.0, 1.0, 0.8, 0.0],
    [0.3, -0.2, 0.5, 0.0, 1.0, 0.9, 0.0],
    [0.3, -0.3, 0.5, 0.0, 1.0, 1.0, 0.0],
    [0.3, -0.4, 0.5, 0.0, 0.9, 1.0, 0.0],
    [0.3, 0.1, 0.5, 0.0, 0.8, 1.0, 0.0],
    [0.3, 0.2, 0.5, 0.0, 0.7, 1.0, 0.0],
    [0.3, 0.3, 0.5, 0.0, 0.6, 1.0, 0.0],
    [0.3, 0.4, 0.5, 0.0, 0.5, 1.0, 0.0],
    [0.3, 0.5, 0.5, 0.0, 0.4, 1.0, 0.0],
    [0.3, 0.6, 0.5, 0.0, 0.3, 1.0, 0.0],
    [0.3, 0.0, 0.5, 0.0, 0.2, 1.0, 0.0],
    [0.3, 0.0, 0.5, 0.0, 0.1, 1.0, 0.0],
    [0.3, 0.0, 0.5, 0.0, 0.0, 1.0, 0.0],
    [0.3, 0.0, 0.5, 0.0, -1.0, 0.0, 0.0],
    [0.3, 0.0, 0.5, 0.0, -1.0, -1.0, -1.0],
    [0.3, 0.0, 0.5, 0.0, 1.0, 0.0, 0.0],
];

pub fn hardcore_test_ee_poses() -> Vec<PosQuat> {
    HARDCORE_TEST_EE_POSES.iter().map(normalize_quat_in_pos_quat).collect()
}

pub fn test_ee_poses() -> Vec<PosQuat> {
    TEST_EE_POSES.iter().map(normalize_quat_in_pos_quat).collect()
}

/// The same pose for every environment.
pub fn repeat(pose: &PosQuat, num_envs: usize) -> Vec<PosQuat> {
    vec![*pose; num_envs]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_normalized() {
        for pose in hardcore_test_ee_poses().iter().chain(test_ee_poses().iter()) {
            let norm = pose[3..].iter().map(|c| c * c).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12, "{:?}", pose);
        }
    }

    #[test]
    fn test_repeat() {
        let poses = repeat(&TEST_EE_POSES[0], 3);
        assert_eq!(poses.len(), 3);
        assert!(poses.iter().all(|p| *p == TEST_EE_POSES[0]));
    }
}
