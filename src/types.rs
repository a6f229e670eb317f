//! Small geometry types shared by the controller and the hosts

/// Window origin in root/screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Content area size in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Geometry a window is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub position: Position,
    pub dimensions: Dimensions,
    pub fullscreen: bool,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        use crate::constants::geometry::*;
        Self {
            position: Position::new(DEFAULT_LEFT, DEFAULT_TOP),
            dimensions: Dimensions::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            fullscreen: false,
        }
    }
}
