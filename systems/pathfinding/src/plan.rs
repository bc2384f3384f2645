//! Ordered waypoint sequence consumed by the pursuit controller.

use maze_whiskers_core::CellCoord;

/// Waypoints from the enemy's cell to the target cell plus a cursor.
///
/// The cursor is either a valid index or equal to the waypoint count, in
/// which case the plan is exhausted. Plans are replaced wholesale when a new
/// search completes and are never patched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPlan {
    waypoints: Vec<CellCoord>,
    cursor: usize,
}

impl PathPlan {
    /// Creates a plan positioned at its first waypoint.
    #[must_use]
    pub fn new(waypoints: Vec<CellCoord>) -> Self {
        Self {
            waypoints,
            cursor: 0,
        }
    }

    /// Every waypoint including the starting cell.
    #[must_use]
    pub fn waypoints(&self) -> &[CellCoord] {
        &self.waypoints
    }

    /// Number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the plan holds no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of unit steps the route takes.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// Index of the waypoint currently steered toward.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Waypoint currently steered toward, if the plan is not exhausted.
    #[must_use]
    pub fn current(&self) -> Option<CellCoord> {
        self.waypoints.get(self.cursor).copied()
    }

    /// Final waypoint of the route.
    #[must_use]
    pub fn destination(&self) -> Option<CellCoord> {
        self.waypoints.last().copied()
    }

    /// Waypoints not yet reached.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.waypoints.len() - self.cursor
    }

    /// Reports whether every waypoint has been reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.waypoints.len()
    }

    /// Moves the cursor past the current waypoint.
    ///
    /// Returns `false` once the plan is already exhausted.
    pub fn advance(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.cursor += 1;
        true
    }
}
