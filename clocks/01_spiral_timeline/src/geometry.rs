//! Geometry primitives
//!
//! All coordinates are y-down with the origin at the top-left of the display,
//! matching the drawing surface. Positive angles turn clockwise on screen.

use nannou::prelude::{pt2, Point2};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> Point2 {
        pt2(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Largest square centered in this box
    pub fn square_fit(&self) -> Bounds {
        let side = self.width.min(self.height);
        Bounds::new(
            self.left + (self.width - side) / 2.0,
            self.top + (self.height - side) / 2.0,
            side,
            side,
        )
    }

    /// Shrink by `margin` on every side. Negative sizes are passed through.
    pub fn inset(&self, margin: f32) -> Bounds {
        Bounds::new(
            self.left + margin,
            self.top + margin,
            self.width - 2.0 * margin,
            self.height - 2.0 * margin,
        )
    }

    /// Corner points, clockwise from top-left
    pub fn corners(&self) -> [Point2; 4] {
        [
            pt2(self.left, self.top),
            pt2(self.right(), self.top),
            pt2(self.right(), self.bottom()),
            pt2(self.left, self.bottom()),
        ]
    }
}

/// Rotate a vector clockwise on screen (y-down) by `angle` radians
pub fn rotate(v: Point2, angle: f32) -> Point2 {
    let (sin, cos) = angle.sin_cos();
    pt2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotation followed by translation: the user-to-device transform of a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2 {
    /// Accumulated clockwise rotation in radians
    pub rotation: f32,
    /// Device-space position of the user-space origin
    pub offset: Point2,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            offset: pt2(0.0, 0.0),
        }
    }
}

impl Transform2 {
    /// Move the user-space origin by `(dx, dy)` in current user units
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.offset += rotate(pt2(dx, dy), self.rotation);
    }

    /// Rotate user space clockwise by `angle` radians
    pub fn rotate(&mut self, angle: f32) {
        self.rotation += angle;
    }

    /// Map a user-space point to device space
    pub fn apply(&self, p: Point2) -> Point2 {
        self.offset + rotate(p, self.rotation)
    }
}
