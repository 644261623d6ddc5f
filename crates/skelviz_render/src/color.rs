//! Display colors for panels and meshes.

/// An opaque RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The default property cycle, matching the usual plotting palette so
/// figures look familiar next to their Python counterparts.
pub const CYCLE: [Color; 4] = [
    Color::new(0x1f, 0x77, 0xb4), // blue
    Color::new(0xff, 0x7f, 0x0e), // orange
    Color::new(0x2c, 0xa0, 0x2c), // green
    Color::new(0xd6, 0x27, 0x28), // red
];

pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);

/// Face fill for the dense body mesh.
pub const MESH_FACE: Color = Color::new(141, 184, 226);
/// Edge color for the dense body mesh wireframe.
pub const MESH_EDGE: Color = Color::new(50, 50, 50);
