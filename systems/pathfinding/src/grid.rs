//! Quantisation between world units and planner cells.

use glam::Vec2;
use maze_whiskers_core::CellCoord;

/// Planner cell size used when none is configured.
pub const DEFAULT_CELL_SIZE: f32 = 32.0;

/// Square grid the planner searches, independent of the maze's tile size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathGrid {
    cell_size: f32,
}

impl Default for PathGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl PathGrid {
    /// Creates a grid with the provided cell size.
    ///
    /// Non-positive or non-finite sizes fall back to [`DEFAULT_CELL_SIZE`].
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        Self { cell_size }
    }

    /// Side length of a planner cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Planner cell containing the point; negative coordinates have none.
    #[must_use]
    pub fn cell_of(&self, point: Vec2) -> Option<CellCoord> {
        if !point.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = (point.x / self.cell_size).floor();
        let row = (point.y / self.cell_size).floor();
        if column > u32::MAX as f32 || row > u32::MAX as f32 {
            return None;
        }
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// World-space centre of a planner cell.
    #[must_use]
    pub fn center_of(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_size,
            (cell.row() as f32 + 0.5) * self.cell_size,
        )
    }
}
