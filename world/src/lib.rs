#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Maze Whiskers.
//!
//! The world owns the maze grid, the player and their health, the goal, the
//! enemy body, fish pickups and the transient dust markers. It is the only
//! place those values change: systems read it through [`WorldQuery`] and the
//! [`query`] module and request mutations with [`Command`] values passed to
//! [`apply`].

mod layout;

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use glam::Vec2;
use maze_whiskers_core::{
    CellCoord, CellKind, Command, EntityKind, Event, Facing, GameOverReason, MazeExtent,
    MazeLayout, PlacementId, Rect, WorldQuery,
};

pub use layout::{parse_layout, LayoutError};

const DEFAULT_MAZE_SIZE: u32 = 21;

/// Geometry used to turn maze cells and agents into world-space footprints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    /// Side length of one maze cell in world units.
    pub cell_length: f32,
    /// Side of the square footprint of a wall inside its cell.
    pub wall_extent: f32,
    /// Side of the square footprint of an obstacle inside its cell.
    pub obstacle_extent: f32,
    /// Side of the square footprint of the player and the enemy.
    pub agent_extent: f32,
    /// Side of the square footprint of the goal.
    pub goal_extent: f32,
    /// Half the side of the hitbox used by walkability checks.
    pub probe_half_extent: f32,
    /// Side of the square footprint of a fish pickup.
    pub fish_extent: f32,
    /// Health the player starts with and can never exceed.
    pub max_health: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_length: 96.0,
            wall_extent: 64.0,
            obstacle_extent: 96.0,
            agent_extent: 40.0,
            goal_extent: 48.0,
            probe_half_extent: 16.0,
            fish_extent: 32.0,
            max_health: 100,
        }
    }
}

/// Represents the authoritative Maze Whiskers world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    layout: MazeLayout,
    player: Option<Body>,
    enemy: Option<Enemy>,
    goal: Option<CellCoord>,
    dust: BTreeMap<PlacementId, CellCoord>,
    fish: BTreeSet<CellCoord>,
    health: u32,
    game_over: Option<GameOverReason>,
    encroachment_complete: bool,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an open maze with the default geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates an open maze using the provided geometry.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            layout: MazeLayout::filled(DEFAULT_MAZE_SIZE, DEFAULT_MAZE_SIZE, CellKind::Empty),
            player: None,
            enemy: None,
            goal: None,
            dust: BTreeMap::new(),
            fish: BTreeSet::new(),
            health: config.max_health,
            game_over: None,
            encroachment_complete: false,
        }
    }

    fn extent_value(&self) -> MazeExtent {
        MazeExtent::new(
            self.layout.columns(),
            self.layout.rows(),
            self.config.cell_length,
        )
    }

    fn footprint(&self, cell: CellCoord, kind: CellKind) -> Option<Rect> {
        let side = match kind {
            CellKind::Wall => self.config.wall_extent,
            CellKind::Obstacle => self.config.obstacle_extent,
            CellKind::Empty => return None,
        };
        Some(self.extent_value().cell_footprint(cell, side))
    }

    fn blocked(&self, area: &Rect) -> bool {
        let reach = (area.max() - area.min()).max_element();
        self.walls_near(area.center(), reach)
            .iter()
            .any(|wall| wall.overlaps(area))
    }

    fn integrate_enemy(&mut self, dt: Duration) {
        let extent = self.config.agent_extent;
        let Some(enemy) = self.enemy.as_ref() else {
            return;
        };
        if !enemy.active || enemy.body.velocity == Vec2::ZERO {
            return;
        }

        let start = enemy.body.position;
        let delta = enemy.body.velocity * dt.as_secs_f32();
        let escaping = self.blocked(&Rect::square(start, extent));

        let mut position = start;
        for step in [Vec2::new(delta.x, 0.0), Vec2::new(0.0, delta.y)] {
            let candidate = position + step;
            if escaping || !self.blocked(&Rect::square(candidate, extent)) {
                position = candidate;
            }
        }

        if let Some(enemy) = self.enemy.as_mut() {
            enemy.body.position = position;
        }
    }

    /// Removes every fish the player's footprint touches.
    fn eat_fish(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        let player = Rect::square(position, self.config.agent_extent);
        let extent = self.extent_value();
        let side = self.config.fish_extent;
        let eaten: Vec<CellCoord> = self
            .fish
            .iter()
            .copied()
            .filter(|cell| extent.cell_footprint(*cell, side).overlaps(&player))
            .collect();
        for cell in eaten {
            let _ = self.fish.remove(&cell);
            out_events.push(Event::FishEaten { cell });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMaze { layout } => {
            let columns = layout.columns();
            let rows = layout.rows();
            world.layout = layout;
            world.goal = None;
            world.dust.clear();
            world.fish.clear();
            world.health = world.config.max_health;
            world.game_over = None;
            world.encroachment_complete = false;
            out_events.push(Event::MazeConfigured { columns, rows });
        }
        Command::Tick { dt } => {
            if world.game_over.is_none() {
                world.integrate_enemy(dt);
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlacePlayer { position } => {
            let body = world.player.get_or_insert_with(|| Body::at(position));
            body.position = position;
            out_events.push(Event::PlayerPlaced { position });
            if world.game_over.is_none() {
                world.eat_fish(position, out_events);
            }
        }
        Command::PlaceFish { cell } => {
            if world.layout.kind(cell) != Some(CellKind::Empty) {
                log::warn!("fish placement at {cell:?} is not open floor");
                return;
            }
            if world.fish.insert(cell) {
                out_events.push(Event::FishPlaced { cell });
            }
        }
        Command::AdjustHealth { delta } => {
            let max = i64::from(world.config.max_health);
            let next = (i64::from(world.health) + i64::from(delta)).clamp(0, max);
            let health = u32::try_from(next).unwrap_or(world.config.max_health);
            if health != world.health {
                world.health = health;
                out_events.push(Event::HealthChanged { health });
            }
        }
        Command::PlaceGoal { cell } => {
            if !world.extent_value().contains_cell(cell) {
                log::warn!("goal placement at {cell:?} lies outside the maze");
                return;
            }
            if world.layout.kind(cell) == Some(CellKind::Wall) {
                let _ = world.layout.set(cell, CellKind::Empty);
                out_events.push(Event::WallRemoved { cell });
            }
            world.goal = Some(cell);
            out_events.push(Event::GoalPlaced { cell });
        }
        Command::SpawnEnemy { position } => {
            world.enemy = Some(Enemy {
                body: Body::at(position),
                active: false,
            });
            out_events.push(Event::EnemySpawned { position });
        }
        Command::ActivateEnemy => {
            if let Some(enemy) = world.enemy.as_mut() {
                if !enemy.active {
                    enemy.active = true;
                    out_events.push(Event::EnemyActivated);
                }
            }
        }
        Command::DespawnEnemy => {
            if world.enemy.take().is_some() {
                out_events.push(Event::EnemyDespawned);
            }
        }
        Command::SteerEnemy { velocity, facing } => {
            if let Some(enemy) = world.enemy.as_mut() {
                enemy.body.velocity = velocity;
                if let Some(facing) = facing {
                    enemy.body.facing = facing;
                }
            }
        }
        Command::RepositionEnemy { position } => {
            if let Some(enemy) = world.enemy.as_mut() {
                enemy.body.position = position;
                enemy.body.velocity = Vec2::ZERO;
            }
        }
        Command::RemoveWall { cell } => {
            if world.layout.kind(cell) == Some(CellKind::Wall) {
                let _ = world.layout.set(cell, CellKind::Empty);
                out_events.push(Event::WallRemoved { cell });
            }
        }
        Command::SpawnDust { placement, cell } => {
            if world.extent_value().contains_cell(cell) {
                let _ = world.dust.insert(placement, cell);
                out_events.push(Event::DustSpawned { placement, cell });
            }
        }
        Command::ClearDust { placement } => {
            if world.dust.remove(&placement).is_some() {
                out_events.push(Event::DustCleared { placement });
            }
        }
        Command::PlaceObstacle {
            placement,
            cell,
            variant,
        } => match world.layout.kind(cell) {
            None => log::warn!("obstacle placement at {cell:?} lies outside the maze"),
            Some(CellKind::Obstacle) => {
                out_events.push(Event::ObstacleRejected { placement, cell });
            }
            Some(_) => {
                let _ = world.layout.set(cell, CellKind::Obstacle);
                let _ = world.fish.remove(&cell);
                out_events.push(Event::ObstaclePlaced {
                    placement,
                    cell,
                    variant,
                });
            }
        },
        Command::EndGame { reason } => {
            if world.game_over.is_none() {
                world.game_over = Some(reason);
                if let Some(enemy) = world.enemy.as_mut() {
                    enemy.body.velocity = Vec2::ZERO;
                }
                log::info!("game over: {reason:?}");
                out_events.push(Event::GameOver { reason });
            }
        }
        Command::CompleteEncroachment => {
            if !world.encroachment_complete {
                world.encroachment_complete = true;
                out_events.push(Event::EncroachmentCompleted);
            }
        }
    }
}

impl WorldQuery for World {
    fn extent(&self) -> MazeExtent {
        self.extent_value()
    }

    fn cell_kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.layout.kind(cell)
    }

    fn is_walkable(&self, point: Vec2) -> bool {
        if !self.extent_value().contains_point(point) {
            return false;
        }
        let probe = Rect::square(point, self.config.probe_half_extent * 2.0);
        !self.blocked(&probe)
    }

    fn walls_near(&self, point: Vec2, radius: f32) -> Vec<Rect> {
        let extent = self.extent_value();
        let cell_length = extent.cell_length();
        if cell_length <= 0.0 || extent.columns() == 0 || extent.rows() == 0 {
            return Vec::new();
        }

        let span = |low: f32, high: f32, count: u32| {
            let first = ((low / cell_length).floor() - 1.0).max(0.0) as u32;
            let last = ((high / cell_length).floor() + 1.0).max(0.0) as u32;
            (first, last.min(count - 1))
        };
        let radius = radius.max(0.0);
        let (first_column, last_column) =
            span(point.x - radius, point.x + radius, extent.columns());
        let (first_row, last_row) = span(point.y - radius, point.y + radius, extent.rows());

        let mut walls = Vec::new();
        for row in first_row..=last_row {
            for column in first_column..=last_column {
                let cell = CellCoord::new(column, row);
                let Some(kind) = self.layout.kind(cell) else {
                    continue;
                };
                let Some(rect) = self.footprint(cell, kind) else {
                    continue;
                };
                let nearest = point.clamp(rect.min(), rect.max());
                if nearest.distance(point) <= radius {
                    walls.push(rect);
                }
            }
        }
        walls
    }

    fn bounds(&self, entity: EntityKind) -> Option<Rect> {
        match entity {
            EntityKind::Player => self
                .player
                .as_ref()
                .map(|body| Rect::square(body.position, self.config.agent_extent)),
            EntityKind::Enemy => self
                .enemy
                .as_ref()
                .map(|enemy| Rect::square(enemy.body.position, self.config.agent_extent)),
            EntityKind::Goal => self.goal.map(|cell| {
                self.extent_value()
                    .cell_footprint(cell, self.config.goal_extent)
            }),
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use maze_whiskers_core::{
        AgentSnapshot, CellCoord, CellKind, GameOverReason, MazeExtent, MazeLayout, PlacementId,
        Rect, WorldQuery,
    };
    use rand::Rng;

    use super::{Body, World};

    /// Dimensions of the active maze.
    #[must_use]
    pub fn extent(world: &World) -> MazeExtent {
        world.extent_value()
    }

    /// Provides read-only access to the maze grid.
    #[must_use]
    pub fn layout(world: &World) -> &MazeLayout {
        &world.layout
    }

    /// Snapshot of the player, if one was placed.
    #[must_use]
    pub fn player(world: &World) -> Option<AgentSnapshot> {
        world
            .player
            .as_ref()
            .map(|body| snapshot(body, world.config.agent_extent))
    }

    /// Snapshot of the enemy, if one exists.
    #[must_use]
    pub fn enemy(world: &World) -> Option<AgentSnapshot> {
        world
            .enemy
            .as_ref()
            .map(|enemy| snapshot(&enemy.body, world.config.agent_extent))
    }

    /// Reports whether the enemy exists and finished its introduction.
    #[must_use]
    pub fn enemy_active(world: &World) -> bool {
        world.enemy.as_ref().map_or(false, |enemy| enemy.active)
    }

    /// Cell hosting the goal, if one was placed.
    #[must_use]
    pub fn goal(world: &World) -> Option<CellCoord> {
        world.goal
    }

    /// Dust markers currently shown, keyed by placement.
    #[must_use]
    pub fn dust(world: &World) -> Vec<(PlacementId, CellCoord)> {
        world
            .dust
            .iter()
            .map(|(placement, cell)| (*placement, *cell))
            .collect()
    }

    /// Cells currently holding fish.
    #[must_use]
    pub fn fish(world: &World) -> Vec<CellCoord> {
        world.fish.iter().copied().collect()
    }

    /// Current player health.
    #[must_use]
    pub fn health(world: &World) -> u32 {
        world.health
    }

    /// Cells currently holding obstacles in row-major order.
    #[must_use]
    pub fn obstacles(world: &World) -> Vec<CellCoord> {
        world.layout.cells_of(CellKind::Obstacle).collect()
    }

    /// Reason the session ended, if it has.
    #[must_use]
    pub fn game_over(world: &World) -> Option<GameOverReason> {
        world.game_over
    }

    /// Reports whether the encroachment reached the maze centre.
    #[must_use]
    pub fn encroachment_complete(world: &World) -> bool {
        world.encroachment_complete
    }

    /// Picks a wall cell to turn into the goal.
    ///
    /// Candidates lie farther than `min_distance` from `start` and border at
    /// least one open cell so the goal stays reachable.
    pub fn select_goal_cell<R: Rng + ?Sized>(
        world: &World,
        rng: &mut R,
        start: Vec2,
        min_distance: f32,
    ) -> Option<CellCoord> {
        let extent = world.extent_value();
        let candidates: Vec<CellCoord> = world
            .layout
            .cells_of(CellKind::Wall)
            .filter(|cell| extent.cell_center(*cell).distance(start) > min_distance)
            .filter(|cell| borders_floor(world, *cell))
            .collect();

        if candidates.is_empty() {
            log::warn!("no wall lies farther than {min_distance} units from the start");
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    /// Picks open cells to receive fish, each with probability `density`.
    ///
    /// The player's starting cell never receives one.
    pub fn scatter_fish<R: Rng + ?Sized>(
        world: &World,
        rng: &mut R,
        density: f64,
        start: CellCoord,
    ) -> Vec<CellCoord> {
        if density.is_nan() || density <= 0.0 {
            return Vec::new();
        }
        let density = density.min(1.0);
        world
            .layout
            .cells_of(CellKind::Empty)
            .filter(|cell| *cell != start && Some(*cell) != world.goal)
            .filter(|_| rng.gen_bool(density))
            .collect()
    }

    fn borders_floor(world: &World, cell: CellCoord) -> bool {
        let column = cell.column();
        let row = cell.row();
        let around = [
            row.checked_sub(1).map(|row| CellCoord::new(column, row)),
            column.checked_add(1).map(|column| CellCoord::new(column, row)),
            row.checked_add(1).map(|row| CellCoord::new(column, row)),
            column.checked_sub(1).map(|column| CellCoord::new(column, row)),
        ];
        around
            .into_iter()
            .flatten()
            .any(|neighbor| {
                world
                    .cell_kind(neighbor)
                    .map_or(false, |kind| !kind.is_blocking())
            })
    }

    fn snapshot(body: &Body, agent_extent: f32) -> AgentSnapshot {
        AgentSnapshot {
            position: body.position,
            velocity: body.velocity,
            facing: body.facing,
            bounds: Rect::square(body.position, agent_extent),
        }
    }
}

#[derive(Clone, Debug)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    facing: Facing,
}

impl Body {
    fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing: Facing::default(),
        }
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    body: Body,
    active: bool,
}
