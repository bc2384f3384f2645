#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Whiskers engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, read the maze through the
//! [`WorldQuery`] trait, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Whiskers.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the maze grid with the provided layout.
    ConfigureMaze {
        /// Cell occupancy describing walls, obstacles and open floor.
        layout: MazeLayout,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves the player to the provided world position.
    PlacePlayer {
        /// Centre of the player expressed in world units.
        position: Vec2,
    },
    /// Anchors the goal on the provided maze cell, clearing any wall there.
    PlaceGoal {
        /// Maze cell that hosts the goal.
        cell: CellCoord,
    },
    /// Creates the enemy at the provided world position in an inactive state.
    SpawnEnemy {
        /// Centre of the enemy expressed in world units.
        position: Vec2,
    },
    /// Signals that the introduction finished and the enemy may hunt.
    ActivateEnemy,
    /// Removes the enemy from the world.
    DespawnEnemy,
    /// Sets the enemy's walking velocity.
    SteerEnemy {
        /// Velocity in world units per second.
        velocity: Vec2,
        /// Facing implied by the velocity, if it changed.
        facing: Option<Facing>,
    },
    /// Teleports the enemy along its jump arc; velocity is zeroed.
    RepositionEnemy {
        /// New enemy centre expressed in world units.
        position: Vec2,
    },
    /// Requests that a wall occupying the cell be removed.
    RemoveWall {
        /// Maze cell to clear.
        cell: CellCoord,
    },
    /// Requests the transient dust marker that precedes an obstacle.
    SpawnDust {
        /// Placement transaction that owns the marker.
        placement: PlacementId,
        /// Maze cell the marker covers.
        cell: CellCoord,
    },
    /// Requests removal of a dust marker once its transaction ends.
    ClearDust {
        /// Placement transaction that owned the marker.
        placement: PlacementId,
    },
    /// Drops a fish pickup on an open cell.
    PlaceFish {
        /// Maze cell that hosts the fish.
        cell: CellCoord,
    },
    /// Changes the player's health by `delta`, clamped to the world's range.
    AdjustHealth {
        /// Signed amount added to the current health.
        delta: i32,
    },
    /// Requests a permanent obstacle on the provided cell.
    PlaceObstacle {
        /// Placement transaction committing the obstacle.
        placement: PlacementId,
        /// Maze cell that receives the obstacle.
        cell: CellCoord,
        /// Sprite variant chosen for the obstacle.
        variant: ObstacleVariant,
    },
    /// Ends the session with the provided reason.
    EndGame {
        /// Condition that ended the session.
        reason: GameOverReason,
    },
    /// Reports that every encroachment front reached the maze centre.
    CompleteEncroachment,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new maze grid is active.
    MazeConfigured {
        /// Number of columns in the grid.
        columns: u32,
        /// Number of rows in the grid.
        rows: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player moved to a new position.
    PlayerPlaced {
        /// Player centre after the move.
        position: Vec2,
    },
    /// Confirms that the goal was anchored on a cell.
    GoalPlaced {
        /// Maze cell hosting the goal.
        cell: CellCoord,
    },
    /// Confirms that the enemy entered the world.
    EnemySpawned {
        /// Enemy centre after spawning.
        position: Vec2,
    },
    /// Announces that the enemy started hunting.
    EnemyActivated,
    /// Announces that the enemy left the world.
    EnemyDespawned,
    /// Confirms that a wall was removed.
    WallRemoved {
        /// Cell that no longer holds a wall.
        cell: CellCoord,
    },
    /// Confirms that a dust marker appeared.
    DustSpawned {
        /// Owning placement transaction.
        placement: PlacementId,
        /// Cell covered by the marker.
        cell: CellCoord,
    },
    /// Confirms that a dust marker disappeared.
    DustCleared {
        /// Owning placement transaction.
        placement: PlacementId,
    },
    /// Confirms that a fish pickup appeared.
    FishPlaced {
        /// Cell hosting the fish.
        cell: CellCoord,
    },
    /// Reports that the player swallowed a fish.
    FishEaten {
        /// Cell the fish was taken from.
        cell: CellCoord,
    },
    /// Reports the player's health after it changed.
    HealthChanged {
        /// Health after clamping.
        health: u32,
    },
    /// Confirms that an obstacle now occupies a cell.
    ObstaclePlaced {
        /// Placement transaction that committed the obstacle.
        placement: PlacementId,
        /// Cell now holding the obstacle.
        cell: CellCoord,
        /// Sprite variant of the obstacle.
        variant: ObstacleVariant,
    },
    /// Reports that an obstacle request targeted a cell already holding one.
    ObstacleRejected {
        /// Placement transaction that was refused.
        placement: PlacementId,
        /// Cell that already held an obstacle.
        cell: CellCoord,
    },
    /// Announces the end of the session.
    GameOver {
        /// Condition that ended the session.
        reason: GameOverReason,
    },
    /// Announces that the encroachment reached the maze centre.
    EncroachmentCompleted,
}

/// Conditions that end a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOverReason {
    /// The enemy's footprint reached the player.
    EnemyCaughtPlayer,
    /// A freshly committed obstacle landed on the player.
    ObstacleHitPlayer,
    /// A freshly committed obstacle landed on the goal.
    ObstacleHitGoal,
    /// The player's health drained to zero.
    HealthDepleted,
    /// The player reached the goal.
    PlayerReachedGoal,
}

impl GameOverReason {
    /// Reports whether the session ended in the player's favour.
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Self::PlayerReachedGoal)
    }
}

/// Horizontal orientation of an agent's sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Sprite mirrored toward decreasing x.
    Left,
    /// Sprite facing increasing x.
    #[default]
    Right,
}

impl Facing {
    /// Derives the facing implied by a horizontal velocity component.
    ///
    /// A zero component keeps whatever facing the agent already has, which
    /// callers express by receiving `None`.
    #[must_use]
    pub fn from_velocity_x(velocity_x: f32) -> Option<Self> {
        if velocity_x < 0.0 {
            Some(Self::Left)
        } else if velocity_x > 0.0 {
            Some(Self::Right)
        } else {
            None
        }
    }
}

/// Cardinal directions used by the maze and by encroachment fronts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward increasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// Occupancy kind of a single maze cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellKind {
    /// Open floor.
    #[default]
    Empty,
    /// Maze wall laid down by the generator.
    Wall,
    /// Encroachment obstacle.
    Obstacle,
}

impl CellKind {
    /// Reports whether the kind blocks movement.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Wall | Self::Obstacle)
    }
}

/// Entities whose footprints the world can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// The player-controlled cat.
    Player,
    /// The pursuing enemy.
    Enemy,
    /// The goal the player tries to reach.
    Goal,
}

/// Identifier of a single obstacle placement transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlacementId(u32);

impl PlacementId {
    /// Creates a new placement identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Sprite variant of an obstacle, numbered from one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObstacleVariant(u8);

impl ObstacleVariant {
    /// Number of distinct obstacle sprites.
    pub const COUNT: u8 = 3;

    /// Creates a variant, wrapping values outside `1..=COUNT` back into range.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value >= 1 && value <= Self::COUNT {
            Self(value)
        } else {
            Self(value % Self::COUNT + 1)
        }
    }

    /// One-based sprite index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Axis-aligned rectangle expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    min: Vec2,
    max: Vec2,
}

impl Rect {
    /// Creates a rectangle from two corners in any order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a rectangle centred on `center` with the provided full size.
    #[must_use]
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Creates a square centred on `center` with the provided side length.
    #[must_use]
    pub fn square(center: Vec2, side: f32) -> Self {
        Self::from_center_size(center, Vec2::splat(side))
    }

    /// Lower corner of the rectangle.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper corner of the rectangle.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Centre point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Reports whether the two rectangles share interior area.
    ///
    /// Rectangles that merely touch along an edge do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Dimensions of the maze and the world length of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MazeExtent {
    columns: u32,
    rows: u32,
    cell_length: f32,
}

impl MazeExtent {
    /// Creates a new extent description.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, cell_length: f32) -> Self {
        Self {
            columns,
            rows,
            cell_length,
        }
    }

    /// Number of columns in the maze.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the maze.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of one cell in world units.
    #[must_use]
    pub const fn cell_length(&self) -> f32 {
        self.cell_length
    }

    /// Total width of the maze in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_length
    }

    /// Total height of the maze in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_length
    }

    /// World-space rectangle covering the whole maze.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_corners(Vec2::ZERO, Vec2::new(self.width(), self.height()))
    }

    /// Reports whether the point lies inside the maze, upper edges excluded.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x < self.width() && point.y < self.height()
    }

    /// Reports whether the cell lies inside the maze.
    #[must_use]
    pub const fn contains_cell(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// World-space centre of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_length,
            (cell.row() as f32 + 0.5) * self.cell_length,
        )
    }

    /// Square footprint of the provided side length centred on a cell.
    #[must_use]
    pub fn cell_footprint(&self, cell: CellCoord, side: f32) -> Rect {
        Rect::square(self.cell_center(cell), side)
    }
}

/// Dense row-major grid of cell kinds describing a maze.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeLayout {
    columns: u32,
    rows: u32,
    cells: Vec<CellKind>,
}

impl MazeLayout {
    /// Creates a layout where every cell holds the same kind.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, kind: CellKind) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![kind; capacity],
        }
    }

    /// Creates a layout from row-major cells, rejecting mismatched lengths.
    #[must_use]
    pub fn from_cells(columns: u32, rows: u32, cells: Vec<CellKind>) -> Option<Self> {
        let expected = usize::try_from(u64::from(columns) * u64::from(rows)).ok()?;
        if cells.len() != expected {
            return None;
        }
        Some(Self {
            columns,
            rows,
            cells,
        })
    }

    /// Number of columns in the layout.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the layout.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Kind stored at the provided cell, if it lies inside the layout.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Overwrites the kind at the provided cell, returning the previous kind.
    pub fn set(&mut self, cell: CellCoord, kind: CellKind) -> Option<CellKind> {
        let index = self.index(cell)?;
        let slot = self.cells.get_mut(index)?;
        Some(std::mem::replace(slot, kind))
    }

    /// Iterator over every cell holding the provided kind in row-major order.
    pub fn cells_of(&self, kind: CellKind) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, stored)| **stored == kind)
            .map(move |(index, _)| {
                let index = index as u32;
                CellCoord::new(index % columns, index / columns)
            })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Read-only snapshot of a moving agent used by systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Centre of the agent in world units.
    pub position: Vec2,
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Orientation of the agent's sprite.
    pub facing: Facing,
    /// Collision footprint of the agent.
    pub bounds: Rect,
}

/// Read-only queries the world answers for systems.
///
/// Systems never mutate the maze through this trait; every change flows back
/// through [`Command`] values.
pub trait WorldQuery {
    /// Dimensions of the maze.
    fn extent(&self) -> MazeExtent;

    /// Occupancy kind of the provided cell, if it lies inside the maze.
    fn cell_kind(&self, cell: CellCoord) -> Option<CellKind>;

    /// Reports whether an agent-sized probe centred on `point` fits.
    ///
    /// Points outside the maze are never walkable.
    fn is_walkable(&self, point: Vec2) -> bool;

    /// Footprints of walls and obstacles within `radius` of `point`.
    fn walls_near(&self, point: Vec2, radius: f32) -> Vec<Rect>;

    /// Collision footprint of the entity, if it currently exists.
    fn bounds(&self, entity: EntityKind) -> Option<Rect>;
}
