//! Static description of the SMPL kinematic tree.
//!
//! Parent indices, the "major" joint subset used by sparse pose inputs, and
//! the rest-pose bone offsets (meters, parent-relative). The offsets are the
//! mean-shape template values; forward kinematics output is agnostic to the
//! unit as long as it matches this convention.

pub const NUM_JOINTS: usize = 24;
pub const NUM_MAJOR_JOINTS: usize = 15;

/// parents\[i\] is the index of joint i's parent; the root carries -1.
pub const PARENT_ID_PER_JOINT: [i32; NUM_JOINTS] = [
    -1, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9, 12, 13, 14, 16, 17, 18, 19, 20, 21,
];

/// The subset of joints a sparse pose carries rotations for. All other
/// joints are implicitly identity.
pub const MAJOR_JOINTS: [usize; NUM_MAJOR_JOINTS] = [1, 2, 3, 4, 5, 6, 9, 12, 13, 14, 15, 16, 17, 18, 19];

pub const JOINT_NAMES: [&str; NUM_JOINTS] = [
    "pelvis",
    "l_hip",
    "r_hip",
    "spine1",
    "l_knee",
    "r_knee",
    "spine2",
    "l_ankle",
    "r_ankle",
    "spine3",
    "l_foot",
    "r_foot",
    "neck",
    "l_collar",
    "r_collar",
    "head",
    "l_shoulder",
    "r_shoulder",
    "l_elbow",
    "r_elbow",
    "l_wrist",
    "r_wrist",
    "l_hand",
    "r_hand",
];

/// Rest-pose offset of each joint relative to its parent.
#[rustfmt::skip]
pub const BONE_OFFSETS: [[f32; 3]; NUM_JOINTS] = [
    [ 0.000_000,  0.000_000,  0.000_000], // pelvis
    [ 0.058_581, -0.082_280, -0.017_664], // l_hip
    [-0.060_310, -0.090_513, -0.013_543], // r_hip
    [ 0.004_439,  0.124_404, -0.038_385], // spine1
    [ 0.043_451, -0.386_469,  0.008_037], // l_knee
    [-0.043_257, -0.383_688, -0.004_843], // r_knee
    [ 0.004_488,  0.137_956,  0.026_820], // spine2
    [-0.014_790, -0.426_874, -0.037_428], // l_ankle
    [ 0.019_056, -0.420_046, -0.034_562], // r_ankle
    [-0.002_265,  0.056_032,  0.002_855], // spine3
    [ 0.041_054, -0.060_286,  0.122_042], // l_foot
    [-0.034_840, -0.062_106,  0.130_323], // r_foot
    [-0.013_390,  0.211_635, -0.033_468], // neck
    [ 0.071_702,  0.113_999, -0.018_898], // l_collar
    [-0.082_954,  0.112_472, -0.023_707], // r_collar
    [ 0.010_113,  0.088_937,  0.050_410], // head
    [ 0.122_921,  0.045_205, -0.019_046], // l_shoulder
    [-0.113_228,  0.046_853, -0.008_472], // r_shoulder
    [ 0.255_332, -0.015_649, -0.022_946], // l_elbow
    [-0.260_127, -0.014_369, -0.031_269], // r_elbow
    [ 0.265_709,  0.012_698, -0.007_375], // l_wrist
    [-0.269_108,  0.006_794, -0.006_027], // r_wrist
    [ 0.086_691, -0.010_636, -0.015_594], // l_hand
    [-0.088_754, -0.008_573, -0.010_227], // r_hand
];
