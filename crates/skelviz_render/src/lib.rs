pub mod backend;
pub mod camera;
pub mod color;
pub mod compose;
pub mod encoder;
pub mod error;
pub mod export;
pub mod mesh;
pub mod raster;
pub mod visualizer;
