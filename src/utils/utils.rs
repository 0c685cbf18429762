//! Helper functions

use crate::kinematic_traits::{Joints, Pose, PosQuat};

/// Checks if all elements in the array are finite
pub fn is_valid(qs: &Joints) -> bool {
    qs.iter().all(|&q| q.is_finite())
}

/// Joint values in degrees, as a single line suitable for logging.
pub fn format_joints(joints: &Joints) -> String {
    let mut row_str = String::new();
    for computed in joints {
        row_str.push_str(&format!("{:5.2} ", computed.to_degrees()));
    }
    format!("[{}]", row_str.trim_end())
}

pub fn format_pos_quat(pos_quat: &PosQuat) -> String {
    format!(
        "x: {:.5}, y: {:.5}, z: {:.5},  quat: {:.5},{:.5},{:.5},{:.5}",
        pos_quat[0], pos_quat[1], pos_quat[2], pos_quat[3], pos_quat[4], pos_quat[5], pos_quat[6]
    )
}

pub fn dump_pose(isometry: &Pose) {
    let translation = isometry.translation.vector;
    let rotation = isometry.rotation;
    println!(
        "x: {:.5}, y: {:.5}, z: {:.5},  quat: {:.5},{:.5},{:.5},{:.5}",
        translation.x, translation.y, translation.z, rotation.w, rotation.i, rotation.j, rotation.k
    );
}

pub fn assert_pose_eq(ta: &Pose, tb: &Pose, distance_tolerance: f64, angular_tolerance: f64) -> bool {
    fn bad(ta: &Pose, tb: &Pose) {
        dump_pose(ta);
        dump_pose(tb);
    }

    let translation_distance = (ta.translation.vector - tb.translation.vector).norm();
    let angular_distance = ta.rotation.angle_to(&tb.rotation);

    if translation_distance.abs() > distance_tolerance {
        bad(ta, tb);
        panic!("Poses have too different translations");
    }

    if angular_distance.abs() > angular_tolerance {
        bad(ta, tb);
        panic!("Poses have too different angles");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_is_valid_with_all_finite() {
        let qs = [0.0, 1.0, -1.0, 0.5, -0.5, PI, 0.0];
        assert!(is_valid(&qs));
    }

    #[test]
    fn test_is_valid_with_nan() {
        let qs = [0.0, f64::NAN, 1.0, -1.0, 0.5, -0.5, 0.0];
        assert!(!is_valid(&qs));
    }

    #[test]
    fn test_is_valid_with_infinity() {
        let qs = [0.0, f64::INFINITY, 1.0, -1.0, 0.5, -0.5, 0.0];
        assert!(!is_valid(&qs));
    }
}
