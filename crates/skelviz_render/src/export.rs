//! Frame and video export.
//!
//! Frames are written by a single ordered loop so the zero-padded numbering
//! stays contiguous, which the external encoder depends on.

use crate::backend::PlotBackend;
use crate::compose::Animation;
use crate::encoder::{create_mp4_clip, frame_file_name, EncoderConfig};
use crate::error::{RenderError, RenderResult};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Where a composed animation goes.
#[derive(Clone, Debug)]
pub enum Destination {
    /// Drive the backend frame by frame without writing anything.
    Display,
    /// Persist every frame as a still image in this directory.
    Frames(PathBuf),
    /// Encode a video at `path`. Frames go to `keep_frames` when given,
    /// otherwise to a temporary directory that is removed after a
    /// successful encode.
    Video {
        path: PathBuf,
        keep_frames: Option<PathBuf>,
    },
}

fn write_frames<B: PlotBackend>(
    num_frames: usize,
    backend: &mut B,
    dir: &Path,
    draw: &mut impl FnMut(usize, &mut B),
) -> RenderResult<()> {
    for t in 0..num_frames {
        draw(t, backend);
        backend.write_frame(&dir.join(frame_file_name(t)))?;
    }
    debug!("wrote {num_frames} frames to {}", dir.display());
    Ok(())
}

/// Drives `draw` once per frame and delivers the result to `dest`.
///
/// The encoder input frame rate is forced to `fps` so video timing matches
/// the frame captions. Encoding blocks until ffmpeg exits. When encoding
/// fails, frames already written are kept (even temporary ones) so the
/// operator can retry by hand.
///
/// # Errors
///
/// IO and image-encoding failures while writing frames, and
/// `EncoderUnavailable` / `EncoderFailed` from the encoding step.
pub fn export_with<B: PlotBackend>(
    num_frames: usize,
    fps: f32,
    backend: &mut B,
    dest: &Destination,
    encoder: &EncoderConfig,
    mut draw: impl FnMut(usize, &mut B),
) -> RenderResult<()> {
    match dest {
        Destination::Display => {
            for t in 0..num_frames {
                draw(t, backend);
            }
            Ok(())
        }
        Destination::Frames(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| RenderError::io(dir, e))?;
            write_frames(num_frames, backend, dir, &mut draw)
        }
        Destination::Video { path, keep_frames } => {
            let encoder = EncoderConfig {
                input_fps: fps,
                ..encoder.clone()
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| RenderError::io(parent, e))?;
            }
            match keep_frames {
                Some(dir) => {
                    std::fs::create_dir_all(dir).map_err(|e| RenderError::io(dir, e))?;
                    write_frames(num_frames, backend, dir, &mut draw)?;
                    create_mp4_clip(path, dir, &encoder)
                }
                None => {
                    let tmp = tempfile::tempdir().map_err(|e| RenderError::io(path, e))?;
                    write_frames(num_frames, backend, tmp.path(), &mut draw)?;
                    match create_mp4_clip(path, tmp.path(), &encoder) {
                        Ok(()) => Ok(()), // tmp dropped here, stills removed
                        Err(err) => {
                            let kept = tmp.keep();
                            warn!(
                                "encoding failed, keeping frame stills at {}",
                                kept.display()
                            );
                            Err(err)
                        }
                    }
                }
            }
        }
    }
}

/// Renders a composed animation and delivers it to `dest`.
///
/// # Errors
///
/// See [`export_with`].
pub fn export<B: PlotBackend>(
    anim: &Animation,
    backend: &mut B,
    dest: &Destination,
    encoder: &EncoderConfig,
) -> RenderResult<()> {
    backend.begin(anim.fig_title(), &anim.layouts());
    export_with(
        anim.num_frames(),
        anim.fps(),
        backend,
        dest,
        encoder,
        |t, b| anim.render_frame(t, b),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::CYCLE;
    use crate::compose::{AnimationConfig, Panel};
    use crate::raster::RasterBackend;
    use ndarray as nd;

    fn animation(frames: usize) -> Animation {
        let positions = nd::Array3::<f32>::zeros((frames, 3, 3));
        let panels = vec![Panel::new(positions, "p", CYCLE[0])];
        Animation::new(panels, &[-1, 0, 1], "t", AnimationConfig::default()).unwrap()
    }

    fn assert_contiguous(dir: &Path, n: usize) {
        for idx in 0..n {
            assert!(
                dir.join(frame_file_name(idx)).exists(),
                "missing frame {idx}"
            );
        }
        let count = std::fs::read_dir(dir).unwrap().count();
        assert_eq!(count, n, "unexpected extra files");
    }

    #[test]
    fn test_export_frames_contiguous() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = RasterBackend::with_size(64, 64);
        let anim = animation(5);
        export(
            &anim,
            &mut backend,
            &Destination::Frames(dir.path().to_path_buf()),
            &EncoderConfig::default(),
        )
        .unwrap();
        assert_contiguous(dir.path(), 5);
    }

    #[test]
    fn test_export_single_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = RasterBackend::with_size(64, 64);
        let anim = animation(1);
        export(
            &anim,
            &mut backend,
            &Destination::Frames(dir.path().to_path_buf()),
            &EncoderConfig::default(),
        )
        .unwrap();
        assert_contiguous(dir.path(), 1);
    }

    #[test]
    fn test_display_writes_nothing() {
        let mut backend = RasterBackend::with_size(64, 64);
        let anim = animation(3);
        export(
            &anim,
            &mut backend,
            &Destination::Display,
            &EncoderConfig::default(),
        )
        .unwrap();
    }

    #[test]
    fn test_video_export_keeps_persisted_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames_dir = dir.path().join("frames");
        let video_path = dir.path().join("out.mp4");
        let mut backend = RasterBackend::with_size(64, 64);
        let anim = animation(2);
        let result = export(
            &anim,
            &mut backend,
            &Destination::Video {
                path: video_path.clone(),
                keep_frames: Some(frames_dir.clone()),
            },
            &EncoderConfig::default(),
        );
        // frames survive whether or not ffmpeg is installed here
        assert_contiguous(&frames_dir, 2);
        match result {
            Ok(()) => assert!(video_path.exists()),
            Err(RenderError::EncoderUnavailable | RenderError::EncoderFailed { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
