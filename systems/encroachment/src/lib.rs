#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Encroachment system that fills the maze with obstacles from its edges.
//!
//! Four fronts, one per maze edge, advance toward the centre on independent
//! repeating timers. Each firing claims the next row or column: walls are
//! cleared, dust markers appear, and after a short delay the permanent
//! obstacles land. A committed obstacle that overlaps the player or the goal
//! ends the session.

use std::{collections::BTreeMap, time::Duration};

use maze_whiskers_core::{
    CellCoord, CellKind, Command, Direction, EntityKind, Event, GameOverReason, MazeExtent,
    ObstacleVariant, PlacementId, Rect, WorldQuery,
};
use maze_whiskers_system_scheduler::{Scheduler, TimerId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the encroachment system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    grace: Duration,
    interval: Duration,
    dust_delay: Duration,
    occupancy_radius: f32,
    obstacle_extent: f32,
    seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Config {
    /// Creates a configuration with reference timings and the provided seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            grace: Duration::from_secs(15),
            interval: Duration::from_secs(10),
            dust_delay: Duration::from_millis(1_300),
            occupancy_radius: 0.5,
            obstacle_extent: 1.0,
            seed,
        }
    }

    /// Sets the delay between `start` and the first ring.
    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Sets the period of every front's timer.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets how long dust shows before the obstacle commits.
    #[must_use]
    pub const fn with_dust_delay(mut self, dust_delay: Duration) -> Self {
        self.dust_delay = dust_delay;
        self
    }

    /// Sets the occupancy radius and obstacle footprint as fractions of a cell.
    #[must_use]
    pub const fn with_footprint(mut self, occupancy_radius: f32, obstacle_extent: f32) -> Self {
        self.occupancy_radius = occupancy_radius;
        self.obstacle_extent = obstacle_extent;
        self
    }
}

/// Lifecycle of the encroachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// `start` has not been called.
    Dormant,
    /// Waiting for the grace delay to elapse.
    Grace,
    /// Fronts are advancing.
    Advancing,
    /// Every front reached the centre.
    Completed,
    /// Stopped by a collision or by the session ending.
    Halted,
}

#[derive(Clone, Copy, Debug)]
struct SpawnFront {
    direction: Direction,
    progress: u32,
    timer: Option<TimerId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EncroachmentTimer {
    Grace,
    Front(Direction),
    Commit(PlacementId),
}

#[derive(Clone, Copy, Debug)]
struct PendingPlacement {
    cell: CellCoord,
    variant: ObstacleVariant,
}

/// Directional obstacle spawner with transactional placements.
#[derive(Debug)]
pub struct Encroachment {
    config: Config,
    phase: Phase,
    fronts: [SpawnFront; 4],
    scheduler: Scheduler<EncroachmentTimer>,
    grace_timer: Option<TimerId>,
    pending: BTreeMap<PlacementId, PendingPlacement>,
    committed: Vec<CellCoord>,
    extent: Option<MazeExtent>,
    next_placement: u32,
    rng: ChaCha8Rng,
    terminal_raised: bool,
}

impl Default for Encroachment {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Encroachment {
    /// Creates a dormant system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            phase: Phase::Dormant,
            fronts: Direction::ALL.map(|direction| SpawnFront {
                direction,
                progress: 0,
                timer: None,
            }),
            scheduler: Scheduler::new(),
            grace_timer: None,
            pending: BTreeMap::new(),
            committed: Vec::new(),
            extent: None,
            next_placement: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            terminal_raised: false,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Rings completed by the front starting at the given edge.
    #[must_use]
    pub fn progress(&self, direction: Direction) -> u32 {
        self.front(direction).progress
    }

    /// Number of placements still waiting for their commit.
    #[must_use]
    pub fn pending_placements(&self) -> usize {
        self.pending.len()
    }

    /// Arms the grace timer. Calling it again has no effect.
    pub fn start(&mut self) {
        if self.phase != Phase::Dormant {
            return;
        }
        let grace = self.scheduler.after(self.config.grace, EncroachmentTimer::Grace);
        self.grace_timer = Some(grace);
        self.phase = Phase::Grace;
        log::info!("encroachment begins in {:?}", self.config.grace);
    }

    /// Consumes events and immutable views to emit placement commands.
    pub fn handle<W: WorldQuery + ?Sized>(
        &mut self,
        events: &[Event],
        world: &W,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::GameOver { .. } => self.stop(),
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        let until = self.scheduler.now().saturating_add(elapsed);
        while let Some(timer) = self.scheduler.poll(until) {
            match timer {
                EncroachmentTimer::Grace => self.begin_fronts(world, out),
                EncroachmentTimer::Front(direction) => self.tick(direction, world, out),
                EncroachmentTimer::Commit(placement) => self.commit(placement, world, out),
            }
        }
        self.scheduler.settle(until);
    }

    /// Advances one front by a single ring.
    ///
    /// Cells already holding an obstacle are skipped, yet the front still
    /// advances. Each remaining cell loses its wall, shows dust and schedules
    /// its commit.
    pub fn tick<W: WorldQuery + ?Sized>(
        &mut self,
        direction: Direction,
        world: &W,
        out: &mut Vec<Command>,
    ) {
        if matches!(self.phase, Phase::Halted | Phase::Completed) {
            return;
        }
        let extent = world.extent();
        self.extent = Some(extent);

        let limit = front_limit(direction, &extent);
        let depth = self.front(direction).progress;
        if depth >= limit {
            return;
        }

        let mut requested = 0_usize;
        for cell in ring_cells(direction, depth, &extent) {
            if self.is_occupied(cell) || world.cell_kind(cell) == Some(CellKind::Obstacle) {
                log::trace!("{cell:?} already holds an obstacle");
                continue;
            }
            if world.cell_kind(cell) == Some(CellKind::Wall) {
                out.push(Command::RemoveWall { cell });
            }

            let placement = PlacementId::new(self.next_placement);
            self.next_placement = self.next_placement.wrapping_add(1);
            let variant = ObstacleVariant::new(self.rng.gen_range(1..=ObstacleVariant::COUNT));
            let _ = self
                .pending
                .insert(placement, PendingPlacement { cell, variant });
            let _ = self
                .scheduler
                .after(self.config.dust_delay, EncroachmentTimer::Commit(placement));
            out.push(Command::SpawnDust { placement, cell });
            requested += 1;
        }

        let front = self.front_mut(direction);
        front.progress += 1;
        let progress = front.progress;
        let finished = if progress >= limit {
            front.timer.take()
        } else {
            None
        };
        log::debug!("{direction:?} front reached depth {progress} with {requested} placements");
        if let Some(id) = finished {
            let _ = self.scheduler.cancel(id);
        }

        if self.is_complete() {
            self.complete(out);
        }
    }

    /// Resolves a dust marker into an obstacle, or discards it.
    ///
    /// The occupancy check is repeated here because another front may have
    /// committed the same cell while the dust was showing.
    pub fn commit<W: WorldQuery + ?Sized>(
        &mut self,
        placement: PlacementId,
        world: &W,
        out: &mut Vec<Command>,
    ) {
        let Some(PendingPlacement { cell, variant }) = self.pending.remove(&placement) else {
            return;
        };
        out.push(Command::ClearDust { placement });

        if self.phase == Phase::Halted || self.terminal_raised {
            log::debug!("placement {} aborted: encroachment halted", placement.get());
            return;
        }
        if self.is_occupied(cell) || world.cell_kind(cell) == Some(CellKind::Obstacle) {
            log::debug!("placement {} aborted: {cell:?} is taken", placement.get());
            return;
        }

        let extent = world.extent();
        self.extent = Some(extent);
        out.push(Command::PlaceObstacle {
            placement,
            cell,
            variant,
        });
        self.committed.push(cell);

        let side = extent.cell_length() * self.config.obstacle_extent;
        let footprint = extent.cell_footprint(cell, side);
        let _ = self.check_collision(&footprint, world, out);
    }

    /// Raises the terminal event when `footprint` overlaps the player or goal.
    ///
    /// Only the first overlap raises anything; the system stops afterwards.
    /// Returns whether this call raised the event.
    pub fn check_collision<W: WorldQuery + ?Sized>(
        &mut self,
        footprint: &Rect,
        world: &W,
        out: &mut Vec<Command>,
    ) -> bool {
        if self.terminal_raised {
            return false;
        }

        let hits = |entity| {
            world
                .bounds(entity)
                .map_or(false, |bounds| bounds.overlaps(footprint))
        };
        let reason = if hits(EntityKind::Player) {
            GameOverReason::ObstacleHitPlayer
        } else if hits(EntityKind::Goal) {
            GameOverReason::ObstacleHitGoal
        } else {
            return false;
        };

        self.terminal_raised = true;
        log::info!("obstacle collision: {reason:?}");
        out.push(Command::EndGame { reason });
        self.stop();
        true
    }

    /// Cancels every front and the grace timer.
    ///
    /// Dust already showing stays scheduled and is discarded at its commit.
    /// Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.phase == Phase::Halted {
            return;
        }
        if let Some(id) = self.grace_timer.take() {
            let _ = self.scheduler.cancel(id);
        }
        self.cancel_fronts();
        self.phase = Phase::Halted;
        log::info!("encroachment stopped");
    }

    /// Reports whether a committed obstacle lies within the occupancy radius
    /// of the cell's centre.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        let Some(extent) = self.extent else {
            return self.committed.contains(&cell);
        };
        let center = extent.cell_center(cell);
        let radius = extent.cell_length() * self.config.occupancy_radius;
        self.committed
            .iter()
            .any(|other| extent.cell_center(*other).distance(center) <= radius)
    }

    /// Reports whether every front reached the centre of the maze.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let Some(extent) = self.extent else {
            return false;
        };
        self.fronts
            .iter()
            .all(|front| front.progress >= front_limit(front.direction, &extent))
    }

    fn begin_fronts<W: WorldQuery + ?Sized>(&mut self, world: &W, out: &mut Vec<Command>) {
        self.grace_timer = None;
        if self.phase != Phase::Grace {
            return;
        }
        self.phase = Phase::Advancing;
        log::info!("encroachment fronts advancing every {:?}", self.config.interval);

        for direction in Direction::ALL {
            let timer = self
                .scheduler
                .every(self.config.interval, EncroachmentTimer::Front(direction));
            self.front_mut(direction).timer = Some(timer);
        }
        for direction in Direction::ALL {
            self.tick(direction, world, out);
        }
    }

    fn complete(&mut self, out: &mut Vec<Command>) {
        self.cancel_fronts();
        self.phase = Phase::Completed;
        log::info!("encroachment reached the centre");
        out.push(Command::CompleteEncroachment);
    }

    fn cancel_fronts(&mut self) {
        for front in &mut self.fronts {
            if let Some(id) = front.timer.take() {
                let _ = self.scheduler.cancel(id);
            }
        }
    }

    fn front(&self, direction: Direction) -> &SpawnFront {
        &self.fronts[front_index(direction)]
    }

    fn front_mut(&mut self, direction: Direction) -> &mut SpawnFront {
        &mut self.fronts[front_index(direction)]
    }
}

fn front_index(direction: Direction) -> usize {
    match direction {
        Direction::North => 0,
        Direction::East => 1,
        Direction::South => 2,
        Direction::West => 3,
    }
}

/// Rings a front claims before meeting the opposite front.
fn front_limit(direction: Direction, extent: &MazeExtent) -> u32 {
    let span = match direction {
        Direction::North | Direction::South => extent.rows(),
        Direction::East | Direction::West => extent.columns(),
    };
    span.div_ceil(2)
}

/// Cells of the row or column `depth` rings in from the front's edge.
fn ring_cells(direction: Direction, depth: u32, extent: &MazeExtent) -> Vec<CellCoord> {
    let columns = extent.columns();
    let rows = extent.rows();
    match direction {
        Direction::North => (0..columns).map(|c| CellCoord::new(c, depth)).collect(),
        Direction::South => (0..columns)
            .map(|c| CellCoord::new(c, rows - 1 - depth))
            .collect(),
        Direction::West => (0..rows).map(|r| CellCoord::new(depth, r)).collect(),
        Direction::East => (0..rows)
            .map(|r| CellCoord::new(columns - 1 - depth, r))
            .collect(),
    }
}
