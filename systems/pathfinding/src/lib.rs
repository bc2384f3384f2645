#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid A* planner that routes the enemy toward the player.
//!
//! The planner runs on its own grid ([`PathGrid`]), which is finer than the
//! maze's wall layout. World coordinates are quantised before the search and
//! walkability is delegated to a caller-supplied closure, so the planner
//! never touches the world directly.

mod grid;
mod plan;

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet},
};

use maze_whiskers_core::CellCoord;

pub use grid::{PathGrid, DEFAULT_CELL_SIZE};
pub use plan::PathPlan;

/// Upper bound on node expansions for a single search.
pub const DEFAULT_MAX_EXPANSIONS: usize = 16_384;

/// Reusable A* search over a 4-connected grid with unit step cost.
///
/// Open nodes are ordered by `f = g + h` with a Manhattan heuristic. Ties on
/// `f` prefer the lower `h`, and remaining ties go to the node queued first.
/// A node is never expanded twice. When a cheaper route to a queued node is
/// found its cost and parent are replaced and it is queued again; the older
/// heap entry is skipped when popped.
#[derive(Debug)]
pub struct PathPlanner {
    max_expansions: usize,
    open: BinaryHeap<Reverse<OpenEntry>>,
    records: HashMap<CellCoord, NodeRecord>,
    closed: HashSet<CellCoord>,
    sequence: u64,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPlanner {
    /// Creates a planner with the default expansion budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_expansions(DEFAULT_MAX_EXPANSIONS)
    }

    /// Creates a planner that gives up after `max_expansions` expansions.
    #[must_use]
    pub fn with_max_expansions(max_expansions: usize) -> Self {
        Self {
            max_expansions: max_expansions.max(1),
            open: BinaryHeap::new(),
            records: HashMap::new(),
            closed: HashSet::new(),
            sequence: 0,
        }
    }

    /// Searches for a route from `from` to `to`.
    ///
    /// Returns `None` when the open set empties before the target is reached
    /// or when the expansion budget runs out. Callers fall back to chasing
    /// the target directly. The start cell is never checked for walkability
    /// because the agent already stands on it.
    pub fn find_path<F>(
        &mut self,
        from: CellCoord,
        to: CellCoord,
        mut is_walkable: F,
    ) -> Option<PathPlan>
    where
        F: FnMut(CellCoord) -> bool,
    {
        self.reset();

        let _ = self.records.insert(
            from,
            NodeRecord {
                cost: 0,
                parent: None,
            },
        );
        self.push(from, 0, from.manhattan_distance(to));

        let mut expansions = 0;
        while let Some(Reverse(entry)) = self.open.pop() {
            if self.closed.contains(&entry.cell) {
                continue;
            }

            let cost = entry.f - entry.h;
            let Some(record) = self.records.get(&entry.cell) else {
                continue;
            };
            if cost > record.cost {
                continue;
            }

            if entry.cell == to {
                return Some(self.reconstruct(to));
            }

            let _ = self.closed.insert(entry.cell);
            expansions += 1;
            if expansions > self.max_expansions {
                log::debug!(
                    "path search from {from:?} to {to:?} exhausted {} expansions",
                    self.max_expansions
                );
                return None;
            }

            let next_cost = cost + 1;
            for neighbor in neighbors(entry.cell) {
                if self.closed.contains(&neighbor) {
                    continue;
                }
                if !is_walkable(neighbor) {
                    continue;
                }

                let improved = match self.records.get(&neighbor) {
                    Some(existing) => next_cost < existing.cost,
                    None => true,
                };
                if !improved {
                    continue;
                }

                let _ = self.records.insert(
                    neighbor,
                    NodeRecord {
                        cost: next_cost,
                        parent: Some(entry.cell),
                    },
                );
                self.push(neighbor, next_cost, neighbor.manhattan_distance(to));
            }
        }

        None
    }

    fn reset(&mut self) {
        self.open.clear();
        self.records.clear();
        self.closed.clear();
        self.sequence = 0;
    }

    fn push(&mut self, cell: CellCoord, cost: u32, heuristic: u32) {
        self.open.push(Reverse(OpenEntry {
            f: cost + heuristic,
            h: heuristic,
            sequence: self.sequence,
            cell,
        }));
        self.sequence += 1;
    }

    fn reconstruct(&self, goal: CellCoord) -> PathPlan {
        let mut waypoints = vec![goal];
        let mut cursor = goal;
        while let Some(parent) = self.records.get(&cursor).and_then(|record| record.parent) {
            waypoints.push(parent);
            cursor = parent;
        }
        waypoints.reverse();
        PathPlan::new(waypoints)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f: u32,
    h: u32,
    sequence: u64,
    cell: CellCoord,
}

#[derive(Clone, Copy, Debug)]
struct NodeRecord {
    cost: u32,
    parent: Option<CellCoord>,
}

/// Up, right, down, left; cells past the zero edge are skipped.
fn neighbors(cell: CellCoord) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    if let Some(row) = cell.row().checked_add(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
