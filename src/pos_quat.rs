//! Conversions between flat `[x, y, z, w, i, j, k]` poses and isometries, and the closeness
//! predicates used to decide if a solution is good.

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};

use crate::kinematic_traits::{Pose, PosQuat};

/// Converts the flat pose into the isometry. The quaternion is normalized on the way.
pub fn pos_quat_to_pose(pos_quat: &PosQuat) -> Pose {
    let [x, y, z, w, i, j, k] = *pos_quat;
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_quaternion(Quaternion::new(w, i, j, k)),
    )
}

pub fn pose_to_pos_quat(pose: &Pose) -> PosQuat {
    let t = pose.translation.vector;
    let q = pose.rotation.quaternion();
    [t.x, t.y, t.z, q.w, q.i, q.j, q.k]
}

/// Returns the same pose with the unit length quaternion.
pub fn normalize_quat_in_pos_quat(pos_quat: &PosQuat) -> PosQuat {
    let norm = pos_quat[3..].iter().map(|c| c * c).sum::<f64>().sqrt();
    let mut normalized = *pos_quat;
    for c in normalized[3..].iter_mut() {
        *c /= norm;
    }
    normalized
}

/// `1 - dot(q1, q2)²`: zero for the same rotation (including `q` vs `-q`), one for
/// rotations 180 degrees apart.
pub fn spherical_distance_quat(quat_1: &[f64; 4], quat_2: &[f64; 4]) -> f64 {
    let dot: f64 = quat_1.iter().zip(quat_2).map(|(a, b)| a * b).sum();
    1.0 - dot * dot
}

/// The `[w, i, j, k]` part of the tuple.
pub fn quaternion_of(pos_quat: &PosQuat) -> [f64; 4] {
    [pos_quat[3], pos_quat[4], pos_quat[5], pos_quat[6]]
}

/// Flips the quaternion of `computed` into the hemisphere of the `target` quaternion, so that
/// component-wise comparison is not defeated by the double cover.
pub fn align_quaternion(computed: &PosQuat, target: &PosQuat) -> PosQuat {
    let dot: f64 = computed[3..].iter().zip(&target[3..]).map(|(a, b)| a * b).sum();
    let mut aligned = *computed;
    if dot < 0.0 {
        for c in aligned[3..].iter_mut() {
            *c = -*c;
        }
    }
    aligned
}

/// `|a - b| <= atol + rtol * |b|`, the second argument being the reference.
pub fn is_close(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + rtol * b.abs()
}

/// [is_close] for every pair of components.
pub fn all_close(a: &[f64], b: &[f64], rtol: f64, atol: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| is_close(*x, *y, rtol, atol))
}
