//! High-level entry points: raw pose arrays in, videos out.

use crate::backend::{PanelLayout, PlotBackend};
use crate::camera::{AxisBounds, Camera};
use crate::color::{CYCLE, MESH_EDGE, MESH_FACE};
use crate::compose::{Animation, AnimationConfig, LengthPolicy, Panel};
use crate::encoder::EncoderConfig;
use crate::export::{export, export_with, Destination};
use crate::error::{RenderError, RenderResult};
use crate::mesh::BodyModel;
use log::info;
use ndarray as nd;
use ndarray::prelude::*;
use skelviz_core::fk::ForwardKinematics;
use skelviz_core::pose::PoseSequence;
use skelviz_core::rotations::rotmat2aa;
use skelviz_core::skeleton::Skeleton;
use skelviz_core::types::{RotationPolicy, RotationRep};
use std::path::PathBuf;

const MESH_ALPHA: f32 = 0.2;
const DENSE_BOUNDS_MIN: [f32; 3] = [-1.0, -1.0, -1.5];
const DENSE_BOUNDS_MAX: [f32; 3] = [1.0, 0.5, 0.5];
const DENSE_AZIMUTH: f32 = 41.0;

/// Settings shared by every visualization a [`Visualizer`] produces.
#[derive(Clone, Debug)]
pub struct VisualizerConfig {
    /// Representation of incoming pose arrays.
    pub rep: RotationRep,
    /// Whether incoming arrays carry only the major joints.
    pub sparse: bool,
    pub fps: f32,
    pub video_dir: PathBuf,
    /// When set, frame stills are kept here instead of a temporary
    /// directory.
    pub frames_dir: Option<PathBuf>,
    pub length_policy: LengthPolicy,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            rep: RotationRep::Quaternion,
            sparse: true,
            fps: 60.0,
            video_dir: PathBuf::from("videos"),
            frames_dir: None,
            length_policy: LengthPolicy::default(),
        }
    }
}

/// Sample names can carry path separators and run-id suffixes; the file
/// name keeps everything with separators dotted, the figure title stops at
/// the first underscore.
fn sanitize_name(name: &str) -> String {
    name.replace('/', ".")
}

fn display_title(name: &str) -> String {
    let sanitized = sanitize_name(name);
    match sanitized.split_once('_') {
        Some((head, _)) => head.to_string(),
        None => sanitized,
    }
}

/// Swap the y and z columns in place. Pose data is y-up; the plot wants
/// z-up.
fn swap_yz(positions: &mut nd::Array3<f32>) {
    for mut row in positions.rows_mut() {
        row.swap(1, 2);
    }
}

/// Renders pose sequences over a fixed skeleton into videos through a
/// [`PlotBackend`].
pub struct Visualizer<B: PlotBackend> {
    fk: ForwardKinematics,
    backend: B,
    config: VisualizerConfig,
}

impl<B: PlotBackend> Visualizer<B> {
    pub fn new(skeleton: Skeleton, backend: B, config: VisualizerConfig) -> Self {
        Self {
            fk: ForwardKinematics::new(skeleton),
            backend,
            config,
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    fn sequence(&self, data: nd::Array2<f32>) -> RenderResult<PoseSequence> {
        Ok(PoseSequence::new(data, self.config.rep, self.config.sparse)?)
    }

    fn destination(&self, file_name: &str) -> Destination {
        let stem = file_name.trim_end_matches(".mp4");
        Destination::Video {
            path: self.config.video_dir.join(file_name),
            keep_frames: self.config.frames_dir.as_ref().map(|d| d.join(stem)),
        }
    }

    fn animation_config(&self) -> AnimationConfig {
        AnimationConfig {
            fps: self.config.fps,
            length_policy: self.config.length_policy,
            ..AnimationConfig::default()
        }
    }

    /// Side-by-side comparison of a model's prediction against ground truth.
    ///
    /// The seed is stitched in front of both continuations, so both panels
    /// replay the shared history before diverging; the prediction panel
    /// switches color at the seam. Predicted rotations are projected to the
    /// closest proper rotation, target rotations must already be valid.
    ///
    /// # Errors
    ///
    /// Shape and rotation-validity failures from the solver, plus export
    /// errors.
    pub fn visualize_results(
        &mut self,
        name: &str,
        seed: nd::Array2<f32>,
        prediction: nd::Array2<f32>,
        target: nd::Array2<f32>,
    ) -> RenderResult<()> {
        let seed = self.sequence(seed)?;
        let prediction = self.sequence(prediction)?;
        let target = self.sequence(target)?;
        let cutover = seed.num_frames();

        let mut pred_pos =
            self.fk
                .solve(&seed.stitched(&prediction)?, RotationPolicy::Correct, "prediction")?;
        let mut target_pos =
            self.fk
                .solve(&seed.stitched(&target)?, RotationPolicy::Check, "target")?;
        swap_yz(&mut pred_pos);
        swap_yz(&mut target_pos);

        let panels = vec![
            Panel::new(pred_pos, "prediction", CYCLE[0]).with_cutover(cutover),
            Panel::new(target_pos, "target", CYCLE[0]),
        ];
        let anim = Animation::new(
            panels,
            self.fk.skeleton().parents(),
            display_title(name),
            self.animation_config(),
        )?;

        let file_name = format!("{}_skeleton.mp4", sanitize_name(name));
        let dest = self.destination(&file_name);
        info!("rendering comparison '{name}' to {file_name}");
        self.backend.set_camera(Camera::default());
        export(&anim, &mut self.backend, &dest, &EncoderConfig::default())
    }

    /// Renders a single pose sequence as a one-panel skeleton video.
    ///
    /// # Errors
    ///
    /// Shape and rotation-validity failures from the solver, plus export
    /// errors.
    pub fn visualize_skeleton(
        &mut self,
        name: &str,
        poses: nd::Array2<f32>,
        policy: RotationPolicy,
    ) -> RenderResult<()> {
        let seq = self.sequence(poses)?;
        let mut positions = self.fk.solve(&seq, policy, name)?;
        swap_yz(&mut positions);

        let title = display_title(name);
        let panels = vec![Panel::new(positions, title.clone(), CYCLE[0])];
        let anim = Animation::new(
            panels,
            self.fk.skeleton().parents(),
            title,
            self.animation_config(),
        )?;

        let file_name = format!("{}_skeleton.mp4", sanitize_name(name));
        let dest = self.destination(&file_name);
        info!("rendering skeleton '{name}' to {file_name}");
        self.backend.set_camera(Camera::default());
        export(&anim, &mut self.backend, &dest, &EncoderConfig::default())
    }

    /// Renders a pose sequence as a posed body surface with the skeleton
    /// overlaid, one frame per pose.
    ///
    /// The surface needs a body model; without one this fails with
    /// `ModelUnavailable`. Bounds are fixed rather than derived from the
    /// data so the full body stays in frame.
    ///
    /// # Errors
    ///
    /// `ModelUnavailable` without a model, shape failures from pose
    /// canonicalization, model and export errors.
    pub fn visualize_dense(
        &mut self,
        name: &str,
        poses: nd::Array2<f32>,
        model: Option<&dyn BodyModel>,
    ) -> RenderResult<()> {
        let model = model.ok_or(RenderError::ModelUnavailable)?;
        let seq = self.sequence(poses)?;
        let axis_angles = self.full_axis_angles(&seq)?;
        let num_frames = axis_angles.nrows();

        let mut meshes = Vec::with_capacity(num_frames);
        for row in axis_angles.rows() {
            let mut mesh = model.pose(row)?;
            swap_yz_2d(&mut mesh.vertices);
            swap_yz_2d(&mut mesh.joints);
            meshes.push(mesh);
        }

        let title = display_title(name);
        let layout = PanelLayout {
            title: title.clone(),
            bounds: AxisBounds::from_min_max(DENSE_BOUNDS_MIN, DENSE_BOUNDS_MAX),
        };
        self.backend.begin(&title, &[layout]);
        self.backend.set_camera(Camera::new(0.0, DENSE_AZIMUTH));

        let file_name = format!("{}_smpl.mp4", sanitize_name(name));
        let dest = self.destination(&file_name);
        info!("rendering dense body '{name}' to {file_name}");
        let parents = self.fk.skeleton().parents().to_vec();
        let fps = self.config.fps;
        export_with(
            num_frames,
            fps,
            &mut self.backend,
            &dest,
            &EncoderConfig::default(),
            |t, backend| {
                backend.clear_frame();
                let mesh = &meshes[t];
                for face in &mesh.faces {
                    let tri = [
                        vertex(&mesh.vertices, face[0]),
                        vertex(&mesh.vertices, face[1]),
                        vertex(&mesh.vertices, face[2]),
                    ];
                    backend.draw_triangle(0, tri, MESH_FACE, MESH_ALPHA, MESH_EDGE);
                }
                for (joint, &parent) in parents.iter().enumerate().skip(1) {
                    if joint >= mesh.joints.nrows() {
                        break;
                    }
                    let parent = parent as usize;
                    backend.draw_segment(
                        0,
                        [
                            mesh.joints[(parent, 0)],
                            mesh.joints[(parent, 1)],
                            mesh.joints[(parent, 2)],
                        ],
                        [
                            mesh.joints[(joint, 0)],
                            mesh.joints[(joint, 1)],
                            mesh.joints[(joint, 2)],
                        ],
                        CYCLE[3],
                    );
                }
                #[allow(clippy::cast_precision_loss)]
                let elapsed = t as f32 / fps;
                backend.draw_caption(&format!("{elapsed:.2} seconds passed"));
            },
        )
    }

    /// Canonicalizes a sequence to one flat axis-angle row per frame over
    /// the full joint set, identity-filling non-major joints of sparse
    /// input. This is the pose format body models take.
    fn full_axis_angles(&self, seq: &PoseSequence) -> RenderResult<nd::Array2<f32>> {
        seq.expect_joints(self.fk.expected_input_joints(seq.is_sparse()))?;
        let frames = seq.num_frames();
        let num_joints = self.fk.skeleton().num_joints();

        let rotmats = seq.to_rotmats();
        let full = if seq.is_sparse() {
            let mut full = nd::Array4::<f32>::zeros((frames, num_joints, 3, 3));
            for f in 0..frames {
                for j in 0..num_joints {
                    full[(f, j, 0, 0)] = 1.0;
                    full[(f, j, 1, 1)] = 1.0;
                    full[(f, j, 2, 2)] = 1.0;
                }
            }
            for (slot, &joint) in self.fk.skeleton().major_joints().iter().enumerate() {
                full.slice_mut(s![.., joint, .., ..])
                    .assign(&rotmats.slice(s![.., slot, .., ..]));
            }
            full
        } else {
            rotmats
        };

        let flat = full
            .into_shape_with_order((frames * num_joints, 3, 3))
            .expect("contiguous rotation stack");
        let aa = rotmat2aa(&flat);
        Ok(aa
            .into_shape_with_order((frames, num_joints * 3))
            .expect("one axis-angle per joint"))
    }
}

fn swap_yz_2d(positions: &mut nd::Array2<f32>) {
    for mut row in positions.rows_mut() {
        row.swap(1, 2);
    }
}

fn vertex(vertices: &nd::Array2<f32>, idx: u32) -> [f32; 3] {
    let idx = idx as usize;
    [
        vertices[(idx, 0)],
        vertices[(idx, 1)],
        vertices[(idx, 2)],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterBackend;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_name_dots_separators() {
        assert_eq!(sanitize_name("walking/07"), "walking.07");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[test]
    fn test_display_title_stops_at_underscore() {
        assert_eq!(display_title("walking_eval_0"), "walking");
        assert_eq!(display_title("run/01_test"), "run.01");
        assert_eq!(display_title("bare"), "bare");
    }

    #[test]
    fn test_swap_yz() {
        let mut pos = nd::array![[[1.0_f32, 2.0, 3.0]]];
        swap_yz(&mut pos);
        assert_eq!(pos[(0, 0, 1)], 3.0);
        assert_eq!(pos[(0, 0, 2)], 2.0);
    }

    #[test]
    fn test_dense_without_model_fails() {
        let config = VisualizerConfig {
            rep: RotationRep::AxisAngle,
            sparse: false,
            ..VisualizerConfig::default()
        };
        let mut viz = Visualizer::new(Skeleton::smpl(), RasterBackend::with_size(64, 64), config);
        let poses = nd::Array2::<f32>::zeros((2, 24 * 3));
        let err = viz.visualize_dense("walk", poses, None).unwrap_err();
        assert!(matches!(err, RenderError::ModelUnavailable));
    }

    #[test]
    fn test_full_axis_angles_expands_sparse_to_all_joints() {
        let config = VisualizerConfig {
            rep: RotationRep::AxisAngle,
            sparse: true,
            ..VisualizerConfig::default()
        };
        let viz = Visualizer::new(Skeleton::smpl(), RasterBackend::with_size(64, 64), config);
        let poses = nd::Array2::<f32>::zeros((3, 15 * 3));
        let seq = PoseSequence::new(poses, RotationRep::AxisAngle, true).unwrap();
        let aa = viz.full_axis_angles(&seq).unwrap();
        assert_eq!(aa.dim(), (3, 24 * 3));
        // identity everywhere, so every axis-angle is zero
        assert!(aa.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_skeleton_video_writes_frames(){
        let dir = tempfile::tempdir().unwrap();
        let config = VisualizerConfig {
            rep: RotationRep::AxisAngle,
            sparse: false,
            video_dir: dir.path().join("videos"),
            frames_dir: Some(dir.path().join("frames")),
            ..VisualizerConfig::default()
        };
        let mut viz = Visualizer::new(Skeleton::smpl(), RasterBackend::with_size(64, 64), config);
        let poses = nd::Array2::<f32>::zeros((2, 24 * 3));
        let result = viz.visualize_skeleton("walk_eval", poses, RotationPolicy::Check);
        // frames land on disk whether or not ffmpeg is installed here
        let frames = dir.path().join("frames").join("walk_eval_skeleton");
        assert!(frames.join("frame_0000.png").exists());
        assert!(frames.join("frame_0001.png").exists());
        match result {
            Ok(()) => assert!(dir.path().join("videos").join("walk_eval_skeleton.mp4").exists()),
            Err(RenderError::EncoderUnavailable | RenderError::EncoderFailed { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
