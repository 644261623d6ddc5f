//! The drawing capability the composer renders through.
//!
//! A backend only needs to draw 3D line segments and filled polygons into
//! one or more panels, carry a camera that can be queried and set, and
//! persist the current frame. The shipped implementation is the software
//! rasterizer in [`crate::raster`]; tests use a recording backend.

use crate::camera::{AxisBounds, Camera};
use crate::color::Color;
use crate::error::RenderResult;
use std::path::Path;

/// Static description of one panel, fixed at composition start.
#[derive(Clone, Debug)]
pub struct PanelLayout {
    pub title: String,
    pub bounds: AxisBounds,
}

/// A drawing surface with one or more side-by-side 3D panels.
pub trait PlotBackend {
    /// Starts a new figure. Called once per animation, before any frame.
    fn begin(&mut self, fig_title: &str, panels: &[PanelLayout]);

    fn set_camera(&mut self, camera: Camera);

    fn camera(&self) -> Camera;

    /// Clears the canvas for the next frame.
    fn clear_frame(&mut self);

    /// Draws one bone segment into the given panel.
    fn draw_segment(&mut self, panel: usize, a: [f32; 3], b: [f32; 3], color: Color);

    /// Draws a filled triangle with alpha blending and a wireframe edge.
    fn draw_triangle(&mut self, panel: usize, tri: [[f32; 3]; 3], fill: Color, alpha: f32, edge: Color);

    /// Draws the per-frame caption (elapsed time).
    fn draw_caption(&mut self, text: &str);

    /// Persists the current frame to `path`.
    ///
    /// # Errors
    ///
    /// Propagates IO and image-encoding failures.
    fn write_frame(&mut self, path: &Path) -> RenderResult<()>;
}
