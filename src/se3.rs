//! Exponential and logarithm maps of SE(3), and the adjoint.
//!
//! Twists are 6-vectors `[v, ω]`, the linear part first. The logarithm of a relative transform
//! is the pose error signal of all IK strategies.

use nalgebra::{Isometry3, Matrix3, Matrix6, Translation3, UnitQuaternion, Vector3, Vector6};

/// Below this rotation angle the series expansions are used.
const SMALL_ANGLE: f64 = 1e-5;

/// Skew symmetric (cross product) matrix of the vector.
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y,
        v.z, 0.0, -v.x,
        -v.y, v.x, 0.0,
    )
}

/// Rigid transform reached by following the twist for unit time.
pub fn exp(twist: &Vector6<f64>) -> Isometry3<f64> {
    let v = twist.fixed_rows::<3>(0).into_owned();
    let omega = twist.fixed_rows::<3>(3).into_owned();
    let theta = omega.norm();
    let w = skew(&omega);

    let left_jacobian = if theta < SMALL_ANGLE {
        Matrix3::identity() + w * 0.5 + w * w / 6.0
    } else {
        let theta2 = theta * theta;
        Matrix3::identity()
            + w * ((1.0 - theta.cos()) / theta2)
            + w * w * ((theta - theta.sin()) / (theta2 * theta))
    };

    Isometry3::from_parts(
        Translation3::from(left_jacobian * v),
        UnitQuaternion::from_scaled_axis(omega),
    )
}

/// Twist that [exp] maps to the given transform. The rotation angle is in `[0, π]`.
pub fn log(pose: &Isometry3<f64>) -> Vector6<f64> {
    let omega = pose.rotation.scaled_axis();
    let theta = omega.norm();
    let w = skew(&omega);

    let coefficient = if theta < SMALL_ANGLE {
        1.0 / 12.0
    } else {
        (1.0 - theta * theta.sin() / (2.0 * (1.0 - theta.cos()))) / (theta * theta)
    };
    let left_jacobian_inverse = Matrix3::identity() - w * 0.5 + w * w * coefficient;
    let v = left_jacobian_inverse * pose.translation.vector;

    Vector6::new(v.x, v.y, v.z, omega.x, omega.y, omega.z)
}

/// Jacobian of [log] at `pose` with respect to a perturbation applied on the right:
/// `log(pose · exp(δ)) ≈ log(pose) + J·δ`. This is the inverse of the right Jacobian of SE(3).
pub fn log_jacobian(pose: &Isometry3<f64>) -> Matrix6<f64> {
    let twist = log(pose);
    let rho = -twist.fixed_rows::<3>(0).into_owned();
    let phi = -twist.fixed_rows::<3>(3).into_owned();
    let theta = phi.norm();
    let p = skew(&phi);
    let r = skew(&rho);

    let coefficient = if theta < SMALL_ANGLE {
        1.0 / 12.0
    } else {
        (1.0 - theta * theta.sin() / (2.0 * (1.0 - theta.cos()))) / (theta * theta)
    };
    // Inverse right Jacobian of SO(3) at -phi, that is the inverse left Jacobian
    let rotational = Matrix3::identity() - p * 0.5 + p * p * coefficient;

    let (c1, c2, c3) = if theta < SMALL_ANGLE {
        (1.0 / 6.0, 1.0 / 24.0, 1.0 / 120.0)
    } else {
        let (sin, cos) = theta.sin_cos();
        (
            (theta - sin) / theta.powi(3),
            (theta * theta + 2.0 * cos - 2.0) / (2.0 * theta.powi(4)),
            (2.0 * theta - 3.0 * sin + theta * cos) / (2.0 * theta.powi(5)),
        )
    };
    let prp = p * r * p;
    let coupling = r * 0.5
        + (p * r + r * p + prp) * c1
        + (p * p * r + r * p * p - prp * 3.0) * c2
        + (prp * p + p * prp) * c3;

    let mut jacobian = Matrix6::zeros();
    jacobian.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotational);
    jacobian.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-(rotational * coupling * rotational)));
    jacobian.fixed_view_mut::<3, 3>(3, 3).copy_from(&rotational);
    jacobian
}

/// Adjoint of the transform, mapping twists expressed in the child frame into the parent frame.
pub fn adjoint(pose: &Isometry3<f64>) -> Matrix6<f64> {
    let rotation = pose.rotation.to_rotation_matrix().into_inner();
    let p = skew(&pose.translation.vector);
    let mut adjoint = Matrix6::zeros();
    adjoint.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
    adjoint.fixed_view_mut::<3, 3>(0, 3).copy_from(&(p * rotation));
    adjoint.fixed_view_mut::<3, 3>(3, 3).copy_from(&rotation);
    adjoint
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_log_of_identity_is_zero() {
        let twist = log(&Isometry3::identity());
        assert_eq!(twist, Vector6::zeros());
    }

    #[test]
    fn test_pure_translation() {
        let pose = Isometry3::translation(0.1, -0.2, 0.3);
        let twist = log(&pose);
        assert_relative_eq!(twist, Vector6::new(0.1, -0.2, 0.3, 0.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_exp_inverts_log() {
        let twists = [
            Vector6::new(0.3, -0.1, 0.2, 0.4, -0.5, 0.6),
            Vector6::new(0.0, 0.0, 1.0, 0.0, 0.0, PI - 1e-3),
            Vector6::new(0.01, 0.02, -0.03, 1e-7, 0.0, -1e-7),
        ];
        for twist in twists {
            let back = log(&exp(&twist));
            assert_relative_eq!(back, twist, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_adjoint_moves_twists_between_frames() {
        // exp(Ad_T ξ) = T exp(ξ) T⁻¹
        let t = Isometry3::new(Vector3::new(0.2, 0.1, -0.4), Vector3::new(0.3, -0.2, 0.9));
        let xi = Vector6::new(0.05, -0.02, 0.01, 0.1, 0.2, -0.1);
        let lhs = exp(&(adjoint(&t) * xi));
        let rhs = t * exp(&xi) * t.inverse();
        assert_relative_eq!(lhs, rhs, epsilon = 1e-12);
    }

    #[test]
    fn test_log_jacobian_matches_finite_differences() {
        let poses = [
            exp(&Vector6::new(0.3, -0.1, 0.2, 0.4, -0.5, 0.6)),
            exp(&Vector6::new(0.1, 0.2, 0.3, 1e-7, 0.0, 0.0)),
            exp(&Vector6::new(1.0, 0.0, 0.5, 0.0, 0.0, 2.5)),
        ];
        let h = 1e-6;
        for pose in poses {
            let jacobian = log_jacobian(&pose);
            let base = log(&pose);
            for k in 0..6 {
                let mut delta = Vector6::zeros();
                delta[k] = h;
                let column = (log(&(pose * exp(&delta))) - base) / h;
                assert_relative_eq!(column, jacobian.column(k).into_owned(), epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_log_jacobian_of_identity() {
        assert_eq!(log_jacobian(&Isometry3::identity()), Matrix6::identity());
    }
}
