//! Coordinate types for the ground plane, heights, and map cells.
//!
//! The simulation works on a horizontal plane (`x`, `y` in tiles) plus a
//! separate height above ground. Vectors that pack all three use `z` for the
//! height.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A point on the ground plane plus a height above it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    /// Position on the horizontal plane, in tiles
    pub plane: Vec2,
    /// Height above ground, in tiles
    pub height: f32,
}

impl WorldPos {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(plane: Vec2, height: f32) -> Self {
        Self { plane, height }
    }

    /// Creates a world position on the ground.
    #[must_use]
    pub const fn on_ground(plane: Vec2) -> Self {
        Self { plane, height: 0.0 }
    }

    /// Packs into a vector with the height in `z`.
    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.plane.x, self.plane.y, self.height)
    }

    /// Unpacks a vector whose `z` is the height.
    #[must_use]
    pub const fn from_vec3(v: Vec3) -> Self {
        Self {
            plane: Vec2::new(v.x, v.y),
            height: v.z,
        }
    }

    /// Horizontal distance to another position, ignoring height.
    #[must_use]
    pub fn horizontal_distance(self, other: Self) -> f32 {
        self.plane.distance(other.plane)
    }

    /// Map cell directly below this position.
    #[must_use]
    pub fn ground_cell(self) -> GridCell {
        GridCell::from_plane(self.plane)
    }
}

/// Integer cell on the map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// X coordinate in cells
    pub x: i32,
    /// Z coordinate in cells (the plane's second axis)
    pub z: i32,
}

impl GridCell {
    /// Creates a new grid cell.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Cell containing a plane position (rounded to the nearest cell).
    #[must_use]
    pub fn from_plane(plane: Vec2) -> Self {
        // Halves round away from zero. Ties-to-even needs a newer toolchain
        // than the declared rust-version, and exact halves only occur on
        // cell boundaries where either neighbor is acceptable.
        Self {
            x: plane.x.round() as i32,
            z: plane.y.round() as i32,
        }
    }

    /// Plane position of the cell center.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32, self.z as f32)
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Flat heading in degrees from one plane point toward another.
///
/// 0° points along +y, 90° along +x. Coincident points give 0°.
#[must_use]
pub fn flat_heading_degrees(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    if delta.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    let degrees = delta.x.atan2(delta.y).to_degrees();
    if degrees < 0.0 {
        degrees + 360.0
    } else {
        degrees
    }
}
