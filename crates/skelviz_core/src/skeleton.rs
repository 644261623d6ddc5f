//! The kinematic-tree description consumed by the forward-kinematics solver.

use crate::error::{PoseError, PoseResult};
use crate::smpl;
use ndarray as nd;
use ndarray::prelude::*;

/// How a sparse pose (rotations only for the major joints) is expanded to a
/// full per-joint rotation array.
///
/// Identity fill is the only shipped strategy. Whether it is the right one is
/// a property of the skeleton preset, so it is carried here explicitly
/// instead of being assumed by the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SparseExpansion {
    /// Insert the identity rotation at every non-major joint.
    #[default]
    IdentityFill,
}

/// Immutable kinematic tree: parent indices, rest-pose bone offsets and the
/// major-joint subset used by sparse inputs.
///
/// Construction validates the tree invariant once, so the solver can run a
/// single ascending index pass without cycle checks.
#[derive(Clone, Debug)]
pub struct Skeleton {
    parents: Vec<i32>,
    offsets: nd::Array2<f32>,
    major_joints: Vec<usize>,
    sparse_expansion: SparseExpansion,
}

impl Skeleton {
    /// Builds a skeleton and validates that `parents` forms a tree rooted at
    /// joint 0 with `parents[i] < i`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSkeleton` when the parent array, offsets or major
    /// joint list are inconsistent.
    pub fn new(parents: Vec<i32>, offsets: nd::Array2<f32>, major_joints: Vec<usize>) -> PoseResult<Self> {
        if parents.is_empty() {
            return Err(PoseError::invalid_skeleton("parent array is empty"));
        }
        if parents[0] != -1 {
            return Err(PoseError::invalid_skeleton(format!(
                "joint 0 must be the root (parent -1), got parent {}",
                parents[0]
            )));
        }
        for (joint, &parent) in parents.iter().enumerate().skip(1) {
            if parent < 0 || parent as usize >= joint {
                return Err(PoseError::invalid_skeleton(format!(
                    "joint {joint} has parent {parent}; parents must satisfy 0 <= parent < joint"
                )));
            }
        }
        if offsets.dim() != (parents.len(), 3) {
            return Err(PoseError::invalid_skeleton(format!(
                "offsets have shape {:?}, expected ({}, 3)",
                offsets.dim(),
                parents.len()
            )));
        }
        for window in major_joints.windows(2) {
            if window[1] <= window[0] {
                return Err(PoseError::invalid_skeleton(
                    "major joint indices must be strictly increasing",
                ));
            }
        }
        if let Some(&last) = major_joints.last() {
            if last >= parents.len() {
                return Err(PoseError::invalid_skeleton(format!(
                    "major joint index {last} out of range for {} joints",
                    parents.len()
                )));
            }
        }
        Ok(Self {
            parents,
            offsets,
            major_joints,
            sparse_expansion: SparseExpansion::IdentityFill,
        })
    }

    /// The 24-joint SMPL body skeleton with its 15 major joints.
    pub fn smpl() -> Self {
        let offsets =
            nd::Array2::from_shape_vec((smpl::NUM_JOINTS, 3), smpl::BONE_OFFSETS.concat())
                .expect("static offset table has the right size");
        Self::new(
            smpl::PARENT_ID_PER_JOINT.to_vec(),
            offsets,
            smpl::MAJOR_JOINTS.to_vec(),
        )
        .expect("static SMPL skeleton is valid")
    }

    pub fn num_joints(&self) -> usize {
        self.parents.len()
    }

    pub fn parents(&self) -> &[i32] {
        &self.parents
    }

    /// Rest-pose offset of each joint relative to its parent, shape
    /// `(num_joints, 3)`. Row 0 is the fixed root position.
    pub fn offsets(&self) -> &nd::Array2<f32> {
        &self.offsets
    }

    pub fn major_joints(&self) -> &[usize] {
        &self.major_joints
    }

    pub fn sparse_expansion(&self) -> SparseExpansion {
        self.sparse_expansion
    }

    /// Global joint positions with every local rotation at identity.
    pub fn rest_pose(&self) -> nd::Array2<f32> {
        let mut positions = nd::Array2::<f32>::zeros((self.num_joints(), 3));
        positions.row_mut(0).assign(&self.offsets.row(0));
        for (joint, &parent) in self.parents.iter().enumerate().skip(1) {
            let pos = &positions.row(parent as usize) + &self.offsets.row(joint);
            positions.row_mut(joint).assign(&pos);
        }
        positions
    }
}
