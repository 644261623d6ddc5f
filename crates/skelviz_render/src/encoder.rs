//! Blocking contract with the external ffmpeg encoder.

use crate::error::{RenderError, RenderResult};
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Frame file pattern consumed by ffmpeg. Frames must be written with this
/// exact fixed-width numbering, contiguously from the start number, or the
/// encoder silently stops early.
pub const FRAME_PATTERN: &str = "frame_%04d.png";

/// Name of the frame file at `idx`, matching [`FRAME_PATTERN`].
pub fn frame_file_name(idx: usize) -> String {
    format!("frame_{idx:04}.png")
}

/// Encoder settings.
#[derive(Clone, Debug)]
pub struct EncoderConfig {
    /// Rate the frames were produced at; must match the fps used for the
    /// time captions.
    pub input_fps: f32,
    /// Rate of the encoded video.
    pub output_fps: f32,
    /// Index of the first frame file.
    pub start_number: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            input_fps: 60.0,
            output_fps: 30.0,
            start_number: 0,
        }
    }
}

fn encoder_args(config: &EncoderConfig, pattern: &Path, out_path: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-start_number"),
        config.start_number.to_string().into(),
        // must come before -i, otherwise it is not respected
        OsString::from("-framerate"),
        config.input_fps.to_string().into(),
        OsString::from("-r"),
        config.output_fps.to_string().into(),
        OsString::from("-loglevel"),
        OsString::from("panic"),
        OsString::from("-i"),
        pattern.into(),
        OsString::from("-c:v"),
        OsString::from("libx264"),
        OsString::from("-preset"),
        OsString::from("slow"),
        OsString::from("-profile:v"),
        OsString::from("high"),
        OsString::from("-level:v"),
        OsString::from("4.0"),
        OsString::from("-pix_fmt"),
        OsString::from("yuv420p"),
        OsString::from("-y"),
        out_path.into(),
    ]
}

/// Encodes the frame stills in `frames_dir` into an mp4 at `out_path`.
///
/// Blocks until ffmpeg exits. The frame files are left untouched either way;
/// deleting temporaries is the caller's job.
///
/// # Errors
///
/// `EncoderUnavailable` when ffmpeg is not on the PATH, `EncoderFailed` on a
/// non-zero exit status.
pub fn create_mp4_clip(out_path: &Path, frames_dir: &Path, config: &EncoderConfig) -> RenderResult<()> {
    let ffmpeg = which::which("ffmpeg").map_err(|_| RenderError::EncoderUnavailable)?;
    let pattern = frames_dir.join(FRAME_PATTERN);
    debug!("encoding {} -> {}", pattern.display(), out_path.display());

    let output = Command::new(ffmpeg)
        .args(encoder_args(config, &pattern, out_path))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| RenderError::io(out_path, e))?;

    if !output.status.success() {
        return Err(RenderError::EncoderFailed {
            exit_code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Picks an unused `vid{N}.mp4` name in `dir` by probing increasing numeric
/// suffixes. This is a plain existence probe, not a lock; good enough for a
/// single-operator offline tool.
pub fn unique_video_name(dir: &Path) -> PathBuf {
    let mut counter = 0usize;
    loop {
        let candidate = dir.join(format!("vid{counter}.mp4"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_file_name_is_zero_padded() {
        assert_eq!(frame_file_name(0), "frame_0000.png");
        assert_eq!(frame_file_name(42), "frame_0042.png");
        assert_eq!(frame_file_name(12345), "frame_12345.png");
    }

    #[test]
    fn test_encoder_args_order() {
        let config = EncoderConfig::default();
        let args = encoder_args(&config, Path::new("/tmp/frame_%04d.png"), Path::new("/tmp/out.mp4"));
        let framerate = args.iter().position(|a| a == "-framerate").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(framerate < input, "-framerate must precede -i");
        assert_eq!(args[framerate + 1], OsString::from("60"));
        assert_eq!(args.last().unwrap(), &OsString::from("/tmp/out.mp4"));
    }

    #[test]
    fn test_unique_video_name_probes_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_video_name(dir.path()), dir.path().join("vid0.mp4"));
        std::fs::write(dir.path().join("vid0.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("vid1.mp4"), b"x").unwrap();
        assert_eq!(unique_video_name(dir.path()), dir.path().join("vid2.mp4"));
    }
}
