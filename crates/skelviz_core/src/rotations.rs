//! Conversion and validation of joint rotation representations.
//!
//! All batch functions operate on stacks of per-joint rotations. Validation
//! and the closest-rotation projection are done in f64 so the tolerance is
//! not eaten up by single-precision round-off; inputs and outputs stay f32
//! like the rest of the pipeline.

use nalgebra as na;
use ndarray as nd;
use ndarray::prelude::*;

/// Tolerance on the Frobenius norm of `R^T R - I` and on `|det(R) - 1|`.
pub const ROTMAT_TOLERANCE: f64 = 1e-6;

fn to_na3(m: nd::ArrayView2<f32>) -> na::Matrix3<f64> {
    na::Matrix3::new(
        f64::from(m[(0, 0)]),
        f64::from(m[(0, 1)]),
        f64::from(m[(0, 2)]),
        f64::from(m[(1, 0)]),
        f64::from(m[(1, 1)]),
        f64::from(m[(1, 2)]),
        f64::from(m[(2, 0)]),
        f64::from(m[(2, 1)]),
        f64::from(m[(2, 2)]),
    )
}

fn to_na3_f32(m: nd::ArrayView2<f32>) -> na::Matrix3<f32> {
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

fn assign_na3(mut dst: nd::ArrayViewMut2<f32>, src: &na::Matrix3<f64>) {
    for r in 0..3 {
        for c in 0..3 {
            dst[(r, c)] = src[(r, c)] as f32;
        }
    }
}

fn is_valid_single(m: &na::Matrix3<f64>) -> bool {
    let residual = m.transpose() * m - na::Matrix3::identity();
    residual.norm() <= ROTMAT_TOLERANCE && (m.determinant() - 1.0).abs() <= ROTMAT_TOLERANCE
}

/// Checks each matrix in the stack for orthonormality and `det == +1`.
///
/// Reflections (`det == -1`) and non-orthogonal matrices are rejected.
pub fn is_valid_rotmat(mats: &nd::Array3<f32>) -> nd::Array1<bool> {
    let mut valid = nd::Array1::from_elem(mats.dim().0, false);
    for (idx, m) in mats.outer_iter().enumerate() {
        valid[idx] = is_valid_single(&to_na3(m));
    }
    valid
}

/// Index of the first matrix in the stack that is not a valid rotation.
pub fn first_invalid_rotmat(mats: &nd::Array3<f32>) -> Option<usize> {
    mats.outer_iter().position(|m| !is_valid_single(&to_na3(m)))
}

/// Projects each matrix to the closest proper rotation in Frobenius norm.
///
/// Uses `M = U S V^T`; the result is `U diag(1, 1, det(U V^T)) V^T`, which
/// guarantees `det == +1` even when the input is closer to a reflection.
/// Idempotent for matrices that already are valid rotations.
pub fn closest_rotmat(mats: &nd::Array3<f32>) -> nd::Array3<f32> {
    let mut out = nd::Array3::<f32>::zeros(mats.dim());
    for (m, dst) in mats.outer_iter().zip(out.outer_iter_mut()) {
        let svd = to_na3(m).svd(true, true);
        let u = svd.u.expect("svd requested u");
        let v_t = svd.v_t.expect("svd requested v_t");
        let det = (u * v_t).determinant();
        let fix = na::Matrix3::from_diagonal(&na::Vector3::new(1.0, 1.0, det));
        assign_na3(dst, &(u * fix * v_t));
    }
    out
}

/// Converts a stack of axis-angle vectors `(n, 3)` to rotation matrices
/// `(n, 3, 3)` via the exponential map. The zero vector maps to identity.
pub fn aa2rotmat(aas: &nd::Array2<f32>) -> nd::Array3<f32> {
    let mut out = nd::Array3::<f32>::zeros((aas.nrows(), 3, 3));
    for (aa, mut dst) in aas.outer_iter().zip(out.outer_iter_mut()) {
        let rot = na::Rotation3::from_scaled_axis(na::Vector3::new(aa[0], aa[1], aa[2]));
        let m = rot.matrix();
        for r in 0..3 {
            for c in 0..3 {
                dst[(r, c)] = m[(r, c)];
            }
        }
    }
    out
}

/// Converts a stack of rotation matrices `(n, 3, 3)` to axis-angle vectors
/// `(n, 3)`.
///
/// Goes through the unit-quaternion form, which stays stable for the
/// identity (angle 0) and for angles near pi where the direct log map
/// divides by a vanishing sine.
pub fn rotmat2aa(mats: &nd::Array3<f32>) -> nd::Array2<f32> {
    let mut out = nd::Array2::<f32>::zeros((mats.dim().0, 3));
    for (m, mut dst) in mats.outer_iter().zip(out.outer_iter_mut()) {
        let rot = na::Rotation3::from_matrix_unchecked(to_na3_f32(m));
        let aa = na::UnitQuaternion::from_rotation_matrix(&rot).scaled_axis();
        dst[0] = aa.x;
        dst[1] = aa.y;
        dst[2] = aa.z;
    }
    out
}

/// Converts a stack of `(w, x, y, z)` quaternions `(n, 4)` to rotation
/// matrices `(n, 3, 3)`.
///
/// Inputs are assumed unit-norm; no renormalization happens here. Feeding a
/// malformed quaternion is the caller's error, not this function's.
pub fn quat2rotmat(quats: &nd::Array2<f32>) -> nd::Array3<f32> {
    let mut out = nd::Array3::<f32>::zeros((quats.nrows(), 3, 3));
    for (q, mut dst) in quats.outer_iter().zip(out.outer_iter_mut()) {
        let quat = na::Quaternion::new(q[0], q[1], q[2], q[3]);
        let rot = na::UnitQuaternion::new_unchecked(quat).to_rotation_matrix();
        let m = rot.matrix();
        for r in 0..3 {
            for c in 0..3 {
                dst[(r, c)] = m[(r, c)];
            }
        }
    }
    out
}
