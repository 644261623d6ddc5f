//! Pose sequences and their canonicalization to rotation matrices.

use crate::error::{PoseError, PoseResult};
use crate::rotations::{aa2rotmat, quat2rotmat};
use crate::types::RotationRep;
use ndarray as nd;

/// An ordered sequence of per-joint local rotations, shape
/// `(frames, joints * dof)`, in a single representation.
///
/// A sparse sequence carries rotations only for the skeleton's major joints;
/// all other joints are implicitly identity.
#[derive(Clone, Debug)]
pub struct PoseSequence {
    data: nd::Array2<f32>,
    rep: RotationRep,
    sparse: bool,
}

impl PoseSequence {
    /// Wraps a raw pose array after checking that the trailing dimension is a
    /// multiple of the representation's dof.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the trailing dimension does not divide by
    /// the dof of `rep`.
    pub fn new(data: nd::Array2<f32>, rep: RotationRep, sparse: bool) -> PoseResult<Self> {
        let dof = rep.dof();
        if data.ncols() == 0 || data.ncols() % dof != 0 {
            return Err(PoseError::ShapeMismatch {
                rep,
                joints: data.ncols() / dof,
                dof,
                expected: (data.ncols() / dof.max(1)).max(1) * dof,
                found: data.ncols(),
            });
        }
        Ok(Self { data, rep, sparse })
    }

    pub fn num_frames(&self) -> usize {
        self.data.nrows()
    }

    /// Number of joints actually carried per frame (major joints only when
    /// sparse).
    pub fn num_joints(&self) -> usize {
        self.data.ncols() / self.rep.dof()
    }

    pub fn rep(&self) -> RotationRep {
        self.rep
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    pub fn data(&self) -> &nd::Array2<f32> {
        &self.data
    }

    /// Checks the trailing dimension against an expected joint count.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` when the sequence carries a different number
    /// of joints.
    pub fn expect_joints(&self, joints: usize) -> PoseResult<()> {
        let dof = self.rep.dof();
        if self.data.ncols() != joints * dof {
            return Err(PoseError::ShapeMismatch {
                rep: self.rep,
                joints,
                dof,
                expected: joints * dof,
                found: self.data.ncols(),
            });
        }
        Ok(())
    }

    /// Converts to the canonical form: one rotation matrix per carried joint,
    /// shape `(frames, joints, 3, 3)`.
    pub fn to_rotmats(&self) -> nd::Array4<f32> {
        let frames = self.num_frames();
        let joints = self.num_joints();
        let flat = self
            .data
            .to_owned()
            .into_shape_with_order((frames * joints, self.rep.dof()))
            .expect("trailing dimension validated at construction");
        let mats = match self.rep {
            RotationRep::AxisAngle => aa2rotmat(&flat),
            RotationRep::Quaternion => quat2rotmat(&flat),
            RotationRep::RotMat => flat
                .into_shape_with_order((frames * joints, 3, 3))
                .expect("rotmat rows are 9 values"),
        };
        mats.into_shape_with_order((frames, joints, 3, 3))
            .expect("shape preserved by conversion")
    }

    /// Concatenates `self` in front of `tail` along the time axis, e.g. to
    /// stitch a seed sequence in front of a prediction.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` when the two sequences disagree on
    /// representation, sparsity or joint count.
    pub fn stitched(&self, tail: &PoseSequence) -> PoseResult<PoseSequence> {
        if self.rep != tail.rep || self.sparse != tail.sparse || self.data.ncols() != tail.data.ncols() {
            return Err(PoseError::ShapeMismatch {
                rep: tail.rep,
                joints: self.num_joints(),
                dof: self.rep.dof(),
                expected: self.data.ncols(),
                found: tail.data.ncols(),
            });
        }
        let data = nd::concatenate(nd::Axis(0), &[self.data.view(), tail.data.view()])
            .expect("column counts checked above");
        Ok(PoseSequence {
            data,
            rep: self.rep,
            sparse: self.sparse,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn identity_rotmat_seq(frames: usize, joints: usize) -> PoseSequence {
        let mut data = nd::Array2::<f32>::zeros((frames, joints * 9));
        for f in 0..frames {
            for j in 0..joints {
                data[(f, j * 9)] = 1.0;
                data[(f, j * 9 + 4)] = 1.0;
                data[(f, j * 9 + 8)] = 1.0;
            }
        }
        PoseSequence::new(data, RotationRep::RotMat, false).unwrap()
    }

    #[test]
    fn test_rejects_bad_trailing_dimension() {
        let data = nd::Array2::<f32>::zeros((2, 10));
        assert!(PoseSequence::new(data, RotationRep::RotMat, false).is_err());
    }

    #[test]
    fn test_expect_joints() {
        let seq = identity_rotmat_seq(2, 4);
        assert!(seq.expect_joints(4).is_ok());
        assert!(seq.expect_joints(5).is_err());
    }

    #[test]
    fn test_to_rotmats_shape_and_identity() {
        let seq = identity_rotmat_seq(3, 2);
        let mats = seq.to_rotmats();
        assert_eq!(mats.dim(), (3, 2, 3, 3));
        assert_eq!(mats[(1, 1, 0, 0)], 1.0);
        assert_eq!(mats[(1, 1, 0, 1)], 0.0);
    }

    #[test]
    fn test_stitched_lengths_add_up() {
        let seed = identity_rotmat_seq(4, 2);
        let tail = identity_rotmat_seq(6, 2);
        let full = seed.stitched(&tail).unwrap();
        assert_eq!(full.num_frames(), 10);
    }

    #[test]
    fn test_stitched_rejects_mismatched_joints() {
        let seed = identity_rotmat_seq(4, 2);
        let tail = identity_rotmat_seq(6, 3);
        assert!(seed.stitched(&tail).is_err());
    }

    #[test]
    fn test_empty_sequence_is_allowed() {
        let seq = identity_rotmat_seq(0, 2);
        assert_eq!(seq.num_frames(), 0);
        assert_eq!(seq.to_rotmats().dim(), (0, 2, 3, 3));
    }
}
