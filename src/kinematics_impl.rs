use crate::kinematic_traits::{JacobianMatrix, Joints, Kinematics, Pose, DOF};
use crate::parameters::panda_kinematics::Parameters;
use nalgebra::{Isometry3, Vector3};

/// Analytical kinematics of the Panda, built from the modified Denavit-Hartenberg table.
#[derive(Debug, Clone)]
pub struct PandaKinematics {
    parameters: Parameters,
}

impl PandaKinematics {
    /// Creates a new `PandaKinematics` instance with the given parameters.
    pub fn new(parameters: Parameters) -> Self {
        PandaKinematics { parameters }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// World poses of all joint frames (after the joint rotation) and of the end effector.
    /// The Z axis of the joint frame `i` is the rotation axis of the joint `i`.
    fn frames(&self, qs: &Joints) -> ([Pose; DOF], Pose) {
        let p = &self.parameters;
        let mut frames = [Isometry3::identity(); DOF];
        let mut pose = Isometry3::identity();
        for i in 0..DOF {
            pose = pose
                * Isometry3::rotation(Vector3::x() * p.alpha[i])
                * Isometry3::translation(p.a[i], 0.0, 0.0)
                * Isometry3::rotation(Vector3::z() * qs[i])
                * Isometry3::translation(0.0, 0.0, p.d[i]);
            frames[i] = pose;
        }
        let end_effector = pose
            * Isometry3::translation(0.0, 0.0, p.flange)
            * Isometry3::rotation(Vector3::z() * p.hand_rotation)
            * Isometry3::translation(0.0, 0.0, p.tcp_offset);
        (frames, end_effector)
    }
}

impl Default for PandaKinematics {
    fn default() -> Self {
        Self::new(Parameters::panda())
    }
}

impl Kinematics for PandaKinematics {
    fn forward(&self, qs: &Joints) -> Pose {
        self.frames(qs).1
    }

    /// Column `i` is the unit twist of the joint `i` axis: angular part is the axis direction,
    /// linear part is `p × ω` for any point `p` on the axis.
    fn spatial_jacobian(&self, qs: &Joints) -> JacobianMatrix {
        let (frames, _) = self.frames(qs);
        let mut jacobian = JacobianMatrix::zeros();
        for (i, frame) in frames.iter().enumerate() {
            let omega = frame.rotation * Vector3::z();
            let v = frame.translation.vector.cross(&omega);
            jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&v);
            jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&omega);
        }
        jacobian
    }
}
