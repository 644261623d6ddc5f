//! Command line front end: render evaluation archives to videos and encode
//! existing frame directories.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ndarray::{Array2, Axis, Ix3};
use ndarray_npy::NpzReader;
use skelviz_core::skeleton::Skeleton;
use skelviz_core::types::RotationRep;
use skelviz_render::compose::LengthPolicy;
use skelviz_render::encoder::{create_mp4_clip, unique_video_name, EncoderConfig};
use skelviz_render::raster::RasterBackend;
use skelviz_render::visualizer::{Visualizer, VisualizerConfig};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skelviz")]
#[command(about = "Skeletal pose sequence visualization", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Rep {
    /// Axis-angle, 3 values per joint
    Aa,
    /// Quaternion (w, x, y, z), 4 values per joint
    Quat,
    /// Row-major rotation matrix, 9 values per joint
    Rotmat,
}

impl From<Rep> for RotationRep {
    fn from(rep: Rep) -> Self {
        match rep {
            Rep::Aa => RotationRep::AxisAngle,
            Rep::Quat => RotationRep::Quaternion,
            Rep::Rotmat => RotationRep::RotMat,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render a seed/prediction/target archive to a comparison video
    Render {
        /// Path to an .npz archive with `seed`, `prediction` and `target`
        /// stacks of shape (samples, frames, joints * dof); plain
        /// (frames, joints * dof) members are treated as one sample
        #[arg(long)]
        results: PathBuf,

        /// Sample name used for the video file and figure title; defaults
        /// to the archive's file stem
        #[arg(long)]
        name: Option<String>,

        /// Index into the archive's sample stacks
        #[arg(long, default_value_t = 0)]
        sample: usize,

        /// Rotation representation of the arrays
        #[arg(long, value_enum, default_value_t = Rep::Quat)]
        rep: Rep,

        /// Arrays carry all skeleton joints instead of only the major ones
        #[arg(long)]
        full_joints: bool,

        /// Frames per second of the pose data
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Directory videos are written to
        #[arg(long, default_value = "videos")]
        video_dir: PathBuf,

        /// Keep the rendered frame stills under this directory
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        /// Fail when seed, prediction and target lengths disagree instead
        /// of truncating to the shortest
        #[arg(long)]
        strict_lengths: bool,
    },

    /// Encode an existing directory of frame stills to an mp4
    Encode {
        /// Directory containing frame_0000.png, frame_0001.png, ...
        #[arg(long)]
        frames_dir: PathBuf,

        /// Directory the video is written to; the file name is the first
        /// free vid<N>.mp4
        #[arg(long, default_value = "videos")]
        out_dir: PathBuf,

        /// Rate the frames were produced at
        #[arg(long, default_value_t = 60.0)]
        input_fps: f32,

        /// Rate of the encoded video
        #[arg(long, default_value_t = 30.0)]
        output_fps: f32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            results,
            name,
            sample,
            rep,
            full_joints,
            fps,
            video_dir,
            frames_dir,
            strict_lengths,
        } => render(
            &results,
            name,
            sample,
            rep,
            full_joints,
            fps,
            video_dir,
            frames_dir,
            strict_lengths,
        ),
        Commands::Encode {
            frames_dir,
            out_dir,
            input_fps,
            output_fps,
        } => encode(&frames_dir, &out_dir, input_fps, output_fps),
    }
}

// numpy stores members with a .npy suffix, older writers without
fn member<D: ndarray::Dimension>(
    npz: &mut NpzReader<File>,
    name: &str,
) -> Result<ndarray::Array<f32, D>, ndarray_npy::ReadNpzError> {
    npz.by_name(name)
        .or_else(|_| npz.by_name(&format!("{name}.npy")))
}

/// Picks one sample out of a `(samples, frames, joints * dof)` stack. A 2D
/// member is accepted as a single-sample archive.
fn pose_array(npz: &mut NpzReader<File>, name: &str, sample: usize) -> Result<Array2<f32>> {
    if let Ok(stack) = member::<Ix3>(npz, name) {
        let samples = stack.dim().0;
        if sample >= samples {
            bail!("sample {sample} out of range, `{name}` stack has {samples} samples");
        }
        return Ok(stack.index_axis(Axis(0), sample).to_owned());
    }
    let single: Array2<f32> = member(npz, name)
        .with_context(|| format!("archive has no 2D or 3D `{name}` array"))?;
    if sample > 0 {
        bail!("`{name}` is a single-sample archive, sample {sample} does not exist");
    }
    Ok(single)
}

#[allow(clippy::too_many_arguments)]
fn render(
    results: &PathBuf,
    name: Option<String>,
    sample: usize,
    rep: Rep,
    full_joints: bool,
    fps: f32,
    video_dir: PathBuf,
    frames_dir: Option<PathBuf>,
    strict_lengths: bool,
) -> Result<()> {
    let file = File::open(results)
        .with_context(|| format!("cannot open results archive {}", results.display()))?;
    let mut npz = NpzReader::new(file).context("results archive is not a valid npz file")?;
    let seed = pose_array(&mut npz, "seed", sample)?;
    let prediction = pose_array(&mut npz, "prediction", sample)?;
    let target = pose_array(&mut npz, "target", sample)?;

    let name = name.unwrap_or_else(|| {
        let stem = results
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string());
        format!("{stem}_{sample}")
    });

    let config = VisualizerConfig {
        rep: rep.into(),
        sparse: !full_joints,
        fps,
        video_dir,
        frames_dir,
        length_policy: if strict_lengths {
            LengthPolicy::Strict
        } else {
            LengthPolicy::TruncateToShortest
        },
    };
    let video_dir = config.video_dir.clone();
    let mut viz = Visualizer::new(Skeleton::smpl(), RasterBackend::new(), config);

    println!(
        "Rendering '{name}': seed {} frames, prediction {}, target {}",
        seed.nrows(),
        prediction.nrows(),
        target.nrows()
    );
    viz.visualize_results(&name, seed, prediction, target)
        .with_context(|| format!("rendering '{name}' failed"))?;
    println!("Wrote video to {}", video_dir.display());
    Ok(())
}

fn encode(frames_dir: &PathBuf, out_dir: &PathBuf, input_fps: f32, output_fps: f32) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;
    let out_path = unique_video_name(out_dir);
    let config = EncoderConfig {
        input_fps,
        output_fps,
        ..EncoderConfig::default()
    };
    create_mp4_clip(&out_path, frames_dir, &config)
        .with_context(|| format!("encoding {} failed", frames_dir.display()))?;
    println!("Wrote {}", out_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use ndarray_npy::NpzWriter;

    fn stacked_archive(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("results.npz");
        let mut stack = Array3::<f32>::zeros((3, 4, 6));
        for s in 0..3 {
            stack
                .index_axis_mut(Axis(0), s)
                .fill(s as f32);
        }
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("seed", &stack).unwrap();
        npz.finish().unwrap();
        path
    }

    #[test]
    fn test_pose_array_selects_sample_from_stack() {
        let dir = tempfile::tempdir().unwrap();
        let path = stacked_archive(dir.path());
        let mut npz = NpzReader::new(File::open(path).unwrap()).unwrap();
        let seed = pose_array(&mut npz, "seed", 1).unwrap();
        assert_eq!(seed.dim(), (4, 6));
        assert!(seed.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_pose_array_rejects_sample_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = stacked_archive(dir.path());
        let mut npz = NpzReader::new(File::open(path).unwrap()).unwrap();
        let err = pose_array(&mut npz, "seed", 3).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_pose_array_accepts_single_sample_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.npz");
        let single = Array2::<f32>::ones((5, 6));
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("seed", &single).unwrap();
        npz.finish().unwrap();

        let mut npz = NpzReader::new(File::open(&path).unwrap()).unwrap();
        let seed = pose_array(&mut npz, "seed", 0).unwrap();
        assert_eq!(seed.dim(), (5, 6));
        assert!(pose_array(&mut npz, "seed", 1).is_err());
    }

    #[test]
    fn test_pose_array_reports_missing_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = stacked_archive(dir.path());
        let mut npz = NpzReader::new(File::open(path).unwrap()).unwrap();
        assert!(pose_array(&mut npz, "prediction", 0).is_err());
    }
}
