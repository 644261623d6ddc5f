//! Software raster implementation of the plot capability.
//!
//! Renders 3D segments and triangles into an RGB image with an orthographic
//! projection per panel, plus a small built-in glyph set for titles and the
//! elapsed-time caption. There is deliberately no lighting model.

use crate::backend::{PanelLayout, PlotBackend};
use crate::camera::Camera;
use crate::color::{Color, BLACK, WHITE};
use crate::error::RenderResult;
use image::{Rgb, RgbImage};
use nalgebra as na;
use std::path::Path;

/// Figure size matching a 16x9 plot at 100 dpi.
pub const DEFAULT_WIDTH: u32 = 1600;
pub const DEFAULT_HEIGHT: u32 = 900;

const TITLE_STRIP: u32 = 48;

#[derive(Clone, Copy, Debug)]
struct Viewport {
    x0: u32,
    y0: u32,
    w: u32,
    h: u32,
}

/// A multi-panel software rasterizer.
pub struct RasterBackend {
    width: u32,
    height: u32,
    img: RgbImage,
    camera: Camera,
    fig_title: String,
    panels: Vec<PanelLayout>,
    viewports: Vec<Viewport>,
}

impl RasterBackend {
    pub fn new() -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            img: RgbImage::from_pixel(width, height, Rgb([WHITE.r, WHITE.g, WHITE.b])),
            camera: Camera::default(),
            fig_title: String::new(),
            panels: Vec::new(),
            viewports: Vec::new(),
        }
    }

    fn layout_viewports(&mut self) {
        self.viewports.clear();
        let n = self.panels.len().max(1) as u32;
        let panel_w = self.width / n;
        // canvases shorter than the title strip shrink the strip, not panels
        let y0 = TITLE_STRIP.min(self.height / 2);
        let h = (self.height - y0).max(1);
        for i in 0..self.panels.len() as u32 {
            self.viewports.push(Viewport {
                x0: i * panel_w,
                y0,
                w: panel_w,
                h,
            });
        }
    }

    /// Orthographic projection of a world point into panel pixels.
    fn project(&self, panel: usize, p: [f32; 3]) -> (i64, i64) {
        let layout = &self.panels[panel];
        let vp = &self.viewports[panel];
        let world = na::Vector3::new(
            p[0] - layout.bounds.center[0],
            p[1] - layout.bounds.center[1],
            p[2] - layout.bounds.center[2],
        );
        let view = self.camera.view_rotation() * world;
        #[allow(clippy::cast_precision_loss)]
        let scale = 0.45 * vp.w.min(vp.h) as f32;
        let cx = f64::from(vp.x0) + f64::from(vp.w) / 2.0;
        let cy = f64::from(vp.y0) + f64::from(vp.h) / 2.0;
        let x = cx + f64::from(view.x / layout.bounds.half_range * scale);
        let y = cy - f64::from(view.z / layout.bounds.half_range * scale);
        (x.round() as i64, y.round() as i64)
    }

    fn put_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            self.img
                .put_pixel(x as u32, y as u32, Rgb([color.r, color.g, color.b]));
        }
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let dst = self.img.get_pixel(x as u32, y as u32).0;
        let mix = |d: u8, s: u8| -> u8 {
            (f32::from(d) * (1.0 - alpha) + f32::from(s) * alpha).round() as u8
        };
        self.img.put_pixel(
            x as u32,
            y as u32,
            Rgb([mix(dst[0], color.r), mix(dst[1], color.g), mix(dst[2], color.b)]),
        );
    }

    fn draw_line(&mut self, a: (i64, i64), b: (i64, i64), color: Color) {
        let (mut x0, mut y0) = a;
        let (x1, y1) = b;
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn draw_dot(&mut self, p: (i64, i64), color: Color) {
        for dy in -1..=1 {
            for dx in -1..=1 {
                self.put_pixel(p.0 + dx, p.1 + dy, color);
            }
        }
    }

    fn draw_text(&mut self, x: i64, y: i64, text: &str, color: Color, scale: i64) {
        let mut cursor = x;
        for ch in text.chars() {
            let ch = ch.to_ascii_lowercase();
            if let Some(rows) = glyph(ch) {
                for (ry, row) in rows.iter().enumerate() {
                    for rx in 0..5_i64 {
                        if row & (0x10 >> rx) != 0 {
                            for oy in 0..scale {
                                for ox in 0..scale {
                                    self.put_pixel(
                                        cursor + rx * scale + ox,
                                        y + ry as i64 * scale + oy,
                                        color,
                                    );
                                }
                            }
                        }
                    }
                }
            }
            cursor += 6 * scale;
        }
    }

    fn text_width(text: &str, scale: i64) -> i64 {
        text.chars().count() as i64 * 6 * scale
    }
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotBackend for RasterBackend {
    fn begin(&mut self, fig_title: &str, panels: &[PanelLayout]) {
        self.fig_title = fig_title.to_string();
        self.panels = panels.to_vec();
        self.layout_viewports();
        self.clear_frame();
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn clear_frame(&mut self) {
        for px in self.img.pixels_mut() {
            *px = Rgb([WHITE.r, WHITE.g, WHITE.b]);
        }
        let title = self.fig_title.clone();
        let tx = i64::from(self.width) / 2 - Self::text_width(&title, 2) / 2;
        self.draw_text(tx, 12, &title, BLACK, 2);
        for (i, panel) in self.panels.clone().iter().enumerate() {
            let vp = self.viewports[i];
            let tx = i64::from(vp.x0) + i64::from(vp.w) / 2 - Self::text_width(&panel.title, 2) / 2;
            self.draw_text(tx, i64::from(TITLE_STRIP) + 8, &panel.title, BLACK, 2);
        }
    }

    fn draw_segment(&mut self, panel: usize, a: [f32; 3], b: [f32; 3], color: Color) {
        let pa = self.project(panel, a);
        let pb = self.project(panel, b);
        self.draw_line(pa, pb, color);
        self.draw_dot(pa, color);
        self.draw_dot(pb, color);
    }

    fn draw_triangle(&mut self, panel: usize, tri: [[f32; 3]; 3], fill: Color, alpha: f32, edge: Color) {
        let p: Vec<(i64, i64)> = tri.iter().map(|v| self.project(panel, *v)).collect();
        let min_x = p.iter().map(|q| q.0).min().unwrap_or(0);
        let max_x = p.iter().map(|q| q.0).max().unwrap_or(0);
        let min_y = p.iter().map(|q| q.1).min().unwrap_or(0);
        let max_y = p.iter().map(|q| q.1).max().unwrap_or(0);

        let (x0, y0) = (p[0].0 as f32, p[0].1 as f32);
        let (x1, y1) = (p[1].0 as f32, p[1].1 as f32);
        let (x2, y2) = (p[2].0 as f32, p[2].1 as f32);
        let denom = (y1 - y2) * (x0 - x2) + (x2 - x1) * (y0 - y2);
        if denom.abs() > f32::EPSILON {
            for y in min_y..=max_y {
                for x in min_x..=max_x {
                    let l0 = ((y1 - y2) * (x as f32 - x2) + (x2 - x1) * (y as f32 - y2)) / denom;
                    let l1 = ((y2 - y0) * (x as f32 - x2) + (x0 - x2) * (y as f32 - y2)) / denom;
                    let l2 = 1.0 - l0 - l1;
                    if l0 >= 0.0 && l1 >= 0.0 && l2 >= 0.0 {
                        self.blend_pixel(x, y, fill, alpha);
                    }
                }
            }
        }
        self.draw_line(p[0], p[1], edge);
        self.draw_line(p[1], p[2], edge);
        self.draw_line(p[2], p[0], edge);
    }

    fn draw_caption(&mut self, text: &str) {
        let y = i64::from(self.height) - 28;
        self.draw_text(16, y, text, BLACK, 2);
    }

    fn write_frame(&mut self, path: &Path) -> RenderResult<()> {
        self.img.save(path)?;
        Ok(())
    }
}

/// 5x7 glyphs, bit 4 is the leftmost column.
#[rustfmt::skip]
fn glyph(ch: char) -> Option<[u8; 7]> {
    Some(match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F],
        'b' => [0x10, 0x10, 0x1E, 0x11, 0x11, 0x11, 0x1E],
        'c' => [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E],
        'd' => [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F],
        'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        'f' => [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08],
        'g' => [0x00, 0x0F, 0x11, 0x11, 0x0F, 0x01, 0x0E],
        'h' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11],
        'i' => [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E],
        'j' => [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C],
        'k' => [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12],
        'l' => [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x15, 0x15],
        'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11],
        'o' => [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E],
        'p' => [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10],
        'q' => [0x00, 0x00, 0x0F, 0x11, 0x0F, 0x01, 0x01],
        'r' => [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10],
        's' => [0x00, 0x00, 0x0F, 0x10, 0x0E, 0x01, 0x1E],
        't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06],
        'u' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D],
        'v' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'w' => [0x00, 0x00, 0x15, 0x15, 0x15, 0x15, 0x0A],
        'x' => [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11],
        'y' => [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E],
        'z' => [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        ' ' => [0x00; 7],
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::AxisBounds;
    use crate::color::CYCLE;

    fn unit_layout(title: &str) -> PanelLayout {
        PanelLayout {
            title: title.to_string(),
            bounds: AxisBounds::from_min_max([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]),
        }
    }

    #[test]
    fn test_segment_leaves_pixels() {
        let mut backend = RasterBackend::with_size(200, 120);
        backend.begin("t", &[unit_layout("p")]);
        backend.draw_segment(0, [-0.5, 0.0, -0.5], [0.5, 0.0, 0.5], CYCLE[0]);
        let colored = backend
            .img
            .pixels()
            .filter(|p| p.0 == [CYCLE[0].r, CYCLE[0].g, CYCLE[0].b])
            .count();
        assert!(colored > 10);
    }

    #[test]
    fn test_clear_frame_resets_canvas() {
        let mut backend = RasterBackend::with_size(200, 120);
        backend.begin("", &[unit_layout("")]);
        backend.draw_segment(0, [-0.5, 0.0, 0.0], [0.5, 0.0, 0.0], CYCLE[1]);
        backend.clear_frame();
        let colored = backend
            .img
            .pixels()
            .filter(|p| p.0 == [CYCLE[1].r, CYCLE[1].g, CYCLE[1].b])
            .count();
        assert_eq!(colored, 0);
    }

    #[test]
    fn test_two_panels_do_not_overlap() {
        let mut backend = RasterBackend::with_size(400, 120);
        backend.begin("", &[unit_layout(""), unit_layout("")]);
        // panel 1 center projects into the right half of the canvas
        let (x, _) = backend.project(1, [0.0, 0.0, 0.0]);
        assert!(x >= 200);
        let (x, _) = backend.project(0, [0.0, 0.0, 0.0]);
        assert!(x < 200);
    }

    #[test]
    fn test_short_canvas_keeps_viewport_on_screen() {
        let mut backend = RasterBackend::with_size(100, 40);
        backend.begin("t", &[unit_layout("p")]);
        backend.draw_segment(0, [-0.5, 0.0, 0.0], [0.5, 0.0, 0.0], CYCLE[0]);
        let colored = backend
            .img
            .pixels()
            .filter(|p| p.0 == [CYCLE[0].r, CYCLE[0].g, CYCLE[0].b])
            .count();
        assert!(colored > 0);
    }

    #[test]
    fn test_glyphs_cover_caption_charset() {
        for ch in "0123456789. secondspassed".chars() {
            assert!(glyph(ch).is_some(), "missing glyph for {ch:?}");
        }
    }

    #[test]
    fn test_write_frame_produces_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_0000.png");
        let mut backend = RasterBackend::with_size(64, 64);
        backend.begin("", &[unit_layout("")]);
        backend.write_frame(&path).unwrap();
        assert!(path.exists());
    }
}
