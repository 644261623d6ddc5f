//! Posed body surfaces for dense visualization.

use crate::error::RenderResult;
use ndarray as nd;

/// One posed surface: vertex positions, triangle indices into them, and the
/// joint positions of the same pose for the skeleton overlay.
#[derive(Clone, Debug)]
pub struct MeshFrame {
    pub vertices: nd::Array2<f32>,
    pub faces: Vec<[u32; 3]>,
    pub joints: nd::Array2<f32>,
}

impl MeshFrame {
    pub fn num_vertices(&self) -> usize {
        self.vertices.dim().0
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }
}

/// Produces a posed surface from per-joint axis-angle rotations.
///
/// Implementations own their parameter data (template vertices, blend
/// weights and so on); callers only hand over the pose. Rotations arrive as
/// a flat `(num_joints * 3)` axis-angle row per call.
pub trait BodyModel {
    /// Number of joints a pose row must cover.
    fn num_joints(&self) -> usize;

    /// Poses the template with the given flat axis-angle vector.
    ///
    /// # Errors
    ///
    /// Model-specific failures, e.g. a pose row of the wrong width.
    fn pose(&self, axis_angles: nd::ArrayView1<f32>) -> RenderResult<MeshFrame>;
}
