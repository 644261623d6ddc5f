//! Forward kinematics: per-joint local rotations to global 3D positions.

use crate::error::{PoseError, PoseResult};
use crate::pose::PoseSequence;
use crate::rotations::{closest_rotmat, first_invalid_rotmat};
use crate::skeleton::{Skeleton, SparseExpansion};
use crate::types::RotationPolicy;
use log::debug;
use nalgebra as na;
use ndarray as nd;
use ndarray::prelude::*;

/// Forward-kinematics solver over a fixed skeleton.
pub struct ForwardKinematics {
    skeleton: Skeleton,
}

impl ForwardKinematics {
    pub fn new(skeleton: Skeleton) -> Self {
        Self { skeleton }
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Number of joints an input sequence is expected to carry.
    pub fn expected_input_joints(&self, sparse: bool) -> usize {
        if sparse {
            self.skeleton.major_joints().len()
        } else {
            self.skeleton.num_joints()
        }
    }

    /// Solves the whole sequence to global joint positions, shape
    /// `(frames, num_joints, 3)`.
    ///
    /// Rotations are canonicalized to matrices, sparse inputs are expanded to
    /// the full joint set, and every entry is validated. With
    /// `RotationPolicy::Correct` entries are first projected to the closest
    /// proper rotation; with `RotationPolicy::Check` an invalid entry is
    /// fatal and reported with `label`, frame and joint index.
    ///
    /// An empty sequence yields an empty output.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` when the sequence carries the wrong joint count,
    /// `InvalidRotation` under the check policy.
    pub fn solve(
        &self,
        seq: &PoseSequence,
        policy: RotationPolicy,
        label: &str,
    ) -> PoseResult<nd::Array3<f32>> {
        seq.expect_joints(self.expected_input_joints(seq.is_sparse()))?;

        let frames = seq.num_frames();
        let num_joints = self.skeleton.num_joints();
        if frames == 0 {
            return Ok(nd::Array3::<f32>::zeros((0, num_joints, 3)));
        }

        let rotmats = seq.to_rotmats();
        let rotmats = if seq.is_sparse() {
            self.expand_sparse(&rotmats)
        } else {
            rotmats
        };

        let flat = rotmats
            .into_shape_with_order((frames * num_joints, 3, 3))
            .expect("contiguous rotation stack");
        let flat = match policy {
            RotationPolicy::Correct => closest_rotmat(&flat),
            RotationPolicy::Check => flat,
        };
        if let Some(idx) = first_invalid_rotmat(&flat) {
            return Err(PoseError::InvalidRotation {
                label: label.to_string(),
                frame: idx / num_joints,
                joint: idx % num_joints,
            });
        }

        debug!("solving fk for '{label}': {frames} frames, {num_joints} joints");
        let rotmats = flat
            .into_shape_with_order((frames, num_joints, 3, 3))
            .expect("shape preserved");

        let mut positions = nd::Array3::<f32>::zeros((frames, num_joints, 3));
        for (frame_rots, mut frame_pos) in rotmats.outer_iter().zip(positions.outer_iter_mut()) {
            self.solve_frame(&frame_rots, &mut frame_pos);
        }
        Ok(positions)
    }

    /// One ascending index pass; `parents[i] < i` guarantees every parent's
    /// global transform is already computed.
    fn solve_frame(&self, local_rots: &nd::ArrayView3<f32>, positions: &mut nd::ArrayViewMut2<f32>) {
        let offsets = self.skeleton.offsets();
        let num_joints = self.skeleton.num_joints();
        let mut global_rots: Vec<na::Matrix3<f32>> = Vec::with_capacity(num_joints);
        let mut global_pos: Vec<na::Vector3<f32>> = Vec::with_capacity(num_joints);

        global_rots.push(mat3_from(&local_rots.index_axis(Axis(0), 0)));
        global_pos.push(na::Vector3::new(
            offsets[(0, 0)],
            offsets[(0, 1)],
            offsets[(0, 2)],
        ));

        for (joint, &parent) in self.skeleton.parents().iter().enumerate().skip(1) {
            let parent = parent as usize;
            let local = mat3_from(&local_rots.index_axis(Axis(0), joint));
            let bone = na::Vector3::new(
                offsets[(joint, 0)],
                offsets[(joint, 1)],
                offsets[(joint, 2)],
            );
            global_pos.push(global_pos[parent] + global_rots[parent] * bone);
            global_rots.push(global_rots[parent] * local);
        }

        for (joint, pos) in global_pos.iter().enumerate() {
            positions[(joint, 0)] = pos.x;
            positions[(joint, 1)] = pos.y;
            positions[(joint, 2)] = pos.z;
        }
    }

    /// Expands a sparse rotation stack `(frames, major, 3, 3)` to the full
    /// joint set, filling non-major joints per the skeleton's expansion
    /// strategy.
    fn expand_sparse(&self, rotmats: &nd::Array4<f32>) -> nd::Array4<f32> {
        let SparseExpansion::IdentityFill = self.skeleton.sparse_expansion();
        let frames = rotmats.dim().0;
        let num_joints = self.skeleton.num_joints();
        let mut full = nd::Array4::<f32>::zeros((frames, num_joints, 3, 3));
        let eye = nd::Array2::<f32>::eye(3);
        for mut joint_slot in full.axis_iter_mut(Axis(1)) {
            for mut frame_slot in joint_slot.outer_iter_mut() {
                frame_slot.assign(&eye);
            }
        }
        for (slot, &joint) in self.skeleton.major_joints().iter().enumerate() {
            for f in 0..frames {
                full.slice_mut(s![f, joint, .., ..])
                    .assign(&rotmats.slice(s![f, slot, .., ..]));
            }
        }
        full
    }
}

fn mat3_from(m: &nd::ArrayView2<f32>) -> na::Matrix3<f32> {
    na::Matrix3::new(
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
        m[(2, 2)],
    )
}
