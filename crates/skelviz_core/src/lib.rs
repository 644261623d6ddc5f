pub mod error;
pub mod fk;
pub mod pose;
pub mod rotations;
pub mod skeleton;
pub mod smpl;
pub mod types;
