//! Narrow read-only views of the host world.
//!
//! The flight core never sees host entities. A launcher or target is anything
//! that can report where it stands, and the map is anything that can say
//! whether a cell exists.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use linecharge_common::{GridCell, WorldPos};

/// Something with a position on the ground plane and a height.
pub trait GroundPoint {
    /// Position on the horizontal plane.
    fn plane_position(&self) -> Vec2;

    /// Height above ground.
    fn height(&self) -> f32 {
        0.0
    }

    /// Combined world position.
    fn world_position(&self) -> WorldPos {
        WorldPos::new(self.plane_position(), self.height())
    }
}

impl GroundPoint for WorldPos {
    fn plane_position(&self) -> Vec2 {
        self.plane
    }

    fn height(&self) -> f32 {
        self.height
    }
}

impl GroundPoint for Vec2 {
    fn plane_position(&self) -> Vec2 {
        *self
    }
}

impl GroundPoint for GridCell {
    fn plane_position(&self) -> Vec2 {
        self.center()
    }
}

/// Map extent query used to filter detonation cells.
pub trait MapBounds {
    /// Checks if a cell lies inside the playable map.
    fn contains(&self, cell: GridCell) -> bool;

    /// Checks the cell under a plane position.
    fn contains_plane(&self, plane: Vec2) -> bool {
        self.contains(GridCell::from_plane(plane))
    }
}

/// Rectangular map covering cells `[0, width) x [0, depth)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectBounds {
    /// Width in cells
    pub width: i32,
    /// Depth in cells
    pub depth: i32,
}

impl RectBounds {
    /// Creates new rectangular bounds.
    #[must_use]
    pub const fn new(width: i32, depth: i32) -> Self {
        Self { width, depth }
    }
}

impl MapBounds for RectBounds {
    fn contains(&self, cell: GridCell) -> bool {
        cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.depth
    }
}

/// A map without edges; every cell is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unbounded;

impl MapBounds for Unbounded {
    fn contains(&self, _cell: GridCell) -> bool {
        true
    }
}
