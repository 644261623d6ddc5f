//! Turns one or more joint-position sequences into a renderable multi-panel
//! animation.

use crate::backend::{PanelLayout, PlotBackend};
use crate::camera::AxisBounds;
use crate::color::{Color, CYCLE};
use crate::error::{RenderError, RenderResult};
use log::debug;
use ndarray as nd;
use ndarray::prelude::*;

/// One animation panel: a `(frames, joints, 3)` position sequence plus its
/// display properties.
#[derive(Clone, Debug)]
pub struct Panel {
    pub positions: nd::Array3<f32>,
    pub title: String,
    pub color: Color,
    /// Frames at or after this index switch to the post-cutover color. Used
    /// to mark the boundary between seed and prediction.
    pub cutover: Option<usize>,
}

impl Panel {
    pub fn new(positions: nd::Array3<f32>, title: impl Into<String>, color: Color) -> Self {
        Self {
            positions,
            title: title.into(),
            color,
            cutover: None,
        }
    }

    pub fn with_cutover(mut self, frame: usize) -> Self {
        self.cutover = Some(frame);
        self
    }
}

/// What to do when panels have different lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Truncate every panel to the shortest one. The historical behavior.
    #[default]
    TruncateToShortest,
    /// Treat a mismatch as a caller error.
    Strict,
}

/// Composition settings.
#[derive(Clone, Debug)]
pub struct AnimationConfig {
    pub fps: f32,
    pub length_policy: LengthPolicy,
    pub post_cutover_color: Color,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            length_policy: LengthPolicy::default(),
            post_cutover_color: CYCLE[2],
        }
    }
}

/// A composed animation, ready to be driven frame by frame through a
/// [`PlotBackend`].
///
/// Owns the panels, the per-panel bone list and the frame count; the axis
/// bounds are fixed at composition time from the first panel's extents so
/// the view does not rescale while the skeleton moves.
pub struct Animation {
    panels: Vec<Panel>,
    parents: Vec<i32>,
    fig_title: String,
    num_frames: usize,
    bounds: AxisBounds,
    config: AnimationConfig,
}

impl Animation {
    /// Composes panels into an animation.
    ///
    /// # Errors
    ///
    /// `EmptyAnimation` when no panels are given or truncation leaves zero
    /// frames; `LengthMismatch` under the strict length policy.
    pub fn new(
        panels: Vec<Panel>,
        parents: &[i32],
        fig_title: impl Into<String>,
        config: AnimationConfig,
    ) -> RenderResult<Self> {
        if panels.is_empty() {
            return Err(RenderError::EmptyAnimation);
        }
        let num_frames = panels
            .iter()
            .map(|p| p.positions.dim().0)
            .min()
            .unwrap_or(0);
        if config.length_policy == LengthPolicy::Strict {
            for panel in &panels {
                if panel.positions.dim().0 != num_frames {
                    return Err(RenderError::LengthMismatch {
                        title: panel.title.clone(),
                        expected: num_frames,
                        found: panel.positions.dim().0,
                    });
                }
            }
        }
        if num_frames == 0 {
            return Err(RenderError::EmptyAnimation);
        }

        let bounds = AxisBounds::from_positions(&panels[0].positions);
        debug!(
            "composed animation with {} panels, {num_frames} frames",
            panels.len()
        );
        Ok(Self {
            panels,
            parents: parents.to_vec(),
            fig_title: fig_title.into(),
            num_frames,
            bounds,
            config,
        })
    }

    /// Comparison length after truncation.
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn fps(&self) -> f32 {
        self.config.fps
    }

    pub fn fig_title(&self) -> &str {
        &self.fig_title
    }

    /// Panel layouts for the backend. Every panel gets the same fixed bounds
    /// derived from the first panel.
    pub fn layouts(&self) -> Vec<PanelLayout> {
        self.panels
            .iter()
            .map(|p| PanelLayout {
                title: p.title.clone(),
                bounds: self.bounds,
            })
            .collect()
    }

    /// Color of a panel's segments at frame `t`.
    pub fn segment_color(&self, panel: usize, t: usize) -> Color {
        let panel = &self.panels[panel];
        match panel.cutover {
            Some(cut) if t >= cut => self.config.post_cutover_color,
            _ => panel.color,
        }
    }

    /// Draws frame `t` into the backend: every panel's bone segments plus
    /// the elapsed-time caption.
    pub fn render_frame<B: PlotBackend>(&self, t: usize, backend: &mut B) {
        backend.clear_frame();
        for (idx, panel) in self.panels.iter().enumerate() {
            let color = self.segment_color(idx, t);
            let pos = panel.positions.slice(s![t, .., ..]);
            for (joint, &parent) in self.parents.iter().enumerate().skip(1) {
                let parent = parent as usize;
                let a = [pos[(parent, 0)], pos[(parent, 1)], pos[(parent, 2)]];
                let b = [pos[(joint, 0)], pos[(joint, 1)], pos[(joint, 2)]];
                backend.draw_segment(idx, a, b, color);
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let elapsed = t as f32 / self.config.fps;
        backend.draw_caption(&format!("{elapsed:.2} seconds passed"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    /// Backend that records draw calls instead of rasterizing.
    #[derive(Default)]
    pub struct RecordingBackend {
        pub camera: Camera,
        pub segments: Vec<(usize, Color)>,
        pub captions: Vec<String>,
        pub frames_written: Vec<std::path::PathBuf>,
    }

    impl PlotBackend for RecordingBackend {
        fn begin(&mut self, _fig_title: &str, _panels: &[PanelLayout]) {}
        fn set_camera(&mut self, camera: Camera) {
            self.camera = camera;
        }
        fn camera(&self) -> Camera {
            self.camera
        }
        fn clear_frame(&mut self) {
            self.segments.clear();
        }
        fn draw_segment(&mut self, panel: usize, _a: [f32; 3], _b: [f32; 3], color: Color) {
            self.segments.push((panel, color));
        }
        fn draw_triangle(
            &mut self,
            _panel: usize,
            _tri: [[f32; 3]; 3],
            _fill: Color,
            _alpha: f32,
            _edge: Color,
        ) {
        }
        fn draw_caption(&mut self, text: &str) {
            self.captions.push(text.to_string());
        }
        fn write_frame(&mut self, path: &Path) -> RenderResult<()> {
            self.frames_written.push(path.to_path_buf());
            Ok(())
        }
    }

    fn positions(frames: usize) -> nd::Array3<f32> {
        nd::Array3::<f32>::zeros((frames, 3, 3))
    }

    #[test]
    fn test_truncates_to_shortest_panel() {
        let panels = vec![
            Panel::new(positions(10), "prediction", CYCLE[0]),
            Panel::new(positions(7), "target", CYCLE[0]),
        ];
        let anim = Animation::new(panels, &[-1, 0, 1], "t", AnimationConfig::default()).unwrap();
        assert_eq!(anim.num_frames(), 7);
    }

    #[test]
    fn test_strict_policy_rejects_mismatch() {
        let panels = vec![
            Panel::new(positions(10), "prediction", CYCLE[0]),
            Panel::new(positions(7), "target", CYCLE[0]),
        ];
        let config = AnimationConfig {
            length_policy: LengthPolicy::Strict,
            ..Default::default()
        };
        assert!(matches!(
            Animation::new(panels, &[-1, 0, 1], "t", config),
            Err(RenderError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_frames_is_empty_animation() {
        let panels = vec![Panel::new(positions(0), "p", CYCLE[0])];
        assert!(matches!(
            Animation::new(panels, &[-1, 0, 1], "t", AnimationConfig::default()),
            Err(RenderError::EmptyAnimation)
        ));
    }

    #[test]
    fn test_no_panels_is_empty_animation() {
        assert!(matches!(
            Animation::new(vec![], &[-1, 0, 1], "t", AnimationConfig::default()),
            Err(RenderError::EmptyAnimation)
        ));
    }

    #[test]
    fn test_cutover_switches_color() {
        let panels = vec![
            Panel::new(positions(6), "prediction", CYCLE[0]).with_cutover(3),
            Panel::new(positions(6), "target", CYCLE[0]),
        ];
        let anim = Animation::new(panels, &[-1, 0, 1], "t", AnimationConfig::default()).unwrap();
        assert_eq!(anim.segment_color(0, 2), CYCLE[0]);
        assert_eq!(anim.segment_color(0, 3), CYCLE[2]);
        // no cutover on the target panel
        assert_eq!(anim.segment_color(1, 5), CYCLE[0]);
    }

    #[test]
    fn test_render_frame_emits_one_segment_per_bone() {
        let panels = vec![
            Panel::new(positions(2), "a", CYCLE[0]),
            Panel::new(positions(2), "b", CYCLE[1]),
        ];
        let anim = Animation::new(panels, &[-1, 0, 1], "t", AnimationConfig::default()).unwrap();
        let mut backend = RecordingBackend::default();
        anim.render_frame(0, &mut backend);
        // 2 panels x 2 non-root joints
        assert_eq!(backend.segments.len(), 4);
        assert_eq!(backend.captions.last().unwrap(), "0.00 seconds passed");
    }
}
