//! Shared camera state and per-panel axis bounds.

use nalgebra as na;
use ndarray as nd;

/// Orbit camera shared by every panel of a figure. Changing it between
/// frames affects all panels on the next redraw, which keeps side-by-side
/// skeletons locked to the same viewpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Elevation above the horizontal plane, degrees.
    pub elev_deg: f32,
    /// Azimuth around the vertical axis, degrees.
    pub azim_deg: f32,
}

impl Default for Camera {
    fn default() -> Self {
        // the default skeleton viewpoint
        Self {
            elev_deg: 0.0,
            azim_deg: -56.0,
        }
    }
}

impl Camera {
    pub fn new(elev_deg: f32, azim_deg: f32) -> Self {
        Self { elev_deg, azim_deg }
    }

    /// World-to-view rotation. The view's x axis maps to screen right, its z
    /// axis to screen up and its y axis to depth.
    pub fn view_rotation(&self) -> na::Rotation3<f32> {
        let azim = na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), -self.azim_deg.to_radians());
        let elev = na::Rotation3::from_axis_angle(&na::Vector3::x_axis(), -self.elev_deg.to_radians());
        elev * azim
    }
}

/// Fixed cubic axis bounds for one panel.
///
/// Computed once at composition start from the first panel's extents and
/// never recomputed per frame, so the skeleton does not rescale as it moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisBounds {
    pub center: [f32; 3],
    pub half_range: f32,
}

impl AxisBounds {
    /// Bounds enclosing all positions of a `(frames, joints, 3)` array.
    pub fn from_positions(positions: &nd::Array3<f32>) -> Self {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in positions.rows() {
            for c in 0..3 {
                min[c] = min[c].min(p[c]);
                max[c] = max[c].max(p[c]);
            }
        }
        if min[0] > max[0] {
            // no positions at all; pick a unit box
            return Self {
                center: [0.0; 3],
                half_range: 1.0,
            };
        }
        Self::from_min_max(min, max)
    }

    /// Cubic bounds around the box `[min, max]`, equalized to the largest
    /// extent on any axis.
    pub fn from_min_max(min: [f32; 3], max: [f32; 3]) -> Self {
        let half_range = (0..3)
            .map(|c| max[c] - min[c])
            .fold(0.0_f32, f32::max)
            .max(1e-6)
            * 0.5;
        Self {
            center: [
                0.5 * (min[0] + max[0]),
                0.5 * (min[1] + max[1]),
                0.5 * (min[2] + max[2]),
            ],
            half_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounds_equalize_to_largest_extent() {
        let b = AxisBounds::from_min_max([0.0, 0.0, 0.0], [2.0, 1.0, 0.5]);
        assert_relative_eq!(b.half_range, 1.0);
        assert_relative_eq!(b.center[0], 1.0);
        assert_relative_eq!(b.center[2], 0.25);
    }

    #[test]
    fn test_bounds_from_positions() {
        let pos = ndarray::array![[[0.0, 0.0, 0.0], [1.0, 2.0, 0.0]], [[0.0, 0.0, -2.0], [1.0, 0.0, 0.0]]];
        let b = AxisBounds::from_positions(&pos);
        assert_relative_eq!(b.half_range, 1.0);
        assert_relative_eq!(b.center[1], 1.0);
    }

    #[test]
    fn test_default_camera() {
        let cam = Camera::default();
        assert_relative_eq!(cam.azim_deg, -56.0);
        let r = cam.view_rotation();
        // pure azimuth keeps the vertical axis fixed
        let up = r * nalgebra::Vector3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(up.z, 1.0, epsilon = 1e-6);
    }
}
