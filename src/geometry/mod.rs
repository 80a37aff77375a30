// src/geometry/mod.rs
//! Shared 2D point types for the pixel and millimeter coordinate spaces.

pub mod fill;
pub mod homography;
pub mod markers;
pub mod quadrant;

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate in the captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PxPoint {
    pub x: i32,
    pub y: i32,
}

impl PxPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        PxPoint { x, y }
    }
}

impl std::fmt::Display for PxPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Physical coordinate on the work surface, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmPoint {
    pub x: f64,
    pub y: f64,
}

impl std::fmt::Display for MmPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}mm, {:.2}mm)", self.x, self.y)
    }
}
