/// The rotation representation a pose sequence is encoded in.
///
/// Every downstream consumer works on the canonical rotation-matrix form;
/// axis-angle and quaternion inputs are converted once, up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationRep {
    AxisAngle,
    Quaternion,
    RotMat,
}

impl RotationRep {
    /// Number of values a single joint rotation occupies in this
    /// representation.
    pub fn dof(&self) -> usize {
        match self {
            RotationRep::AxisAngle => 3,
            RotationRep::Quaternion => 4,
            RotationRep::RotMat => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotationRep::AxisAngle => "aa",
            RotationRep::Quaternion => "quat",
            RotationRep::RotMat => "rotmat",
        }
    }
}

/// Policy applied to rotation matrices before forward kinematics.
///
/// Predicted poses come straight out of a network and are projected to the
/// closest proper rotation. Ground-truth poses must already be valid, so they
/// are only checked and a failure is fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Reject any entry that fails the orthonormality/determinant check.
    Check,
    /// Project every entry to the closest proper rotation first.
    Correct,
}
