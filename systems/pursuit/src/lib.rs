#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuit controller that steers the enemy toward the player.
//!
//! The controller follows an A* plan when one exists and otherwise chases the
//! player in a straight line. A probe cast ahead of the movement direction
//! detects walls; when one blocks the way and the player is still far off the
//! enemy leaps over it along a timed arc, ignoring steering until it lands.

mod jump;
mod spawn;

use std::time::Duration;

use glam::Vec2;
use maze_whiskers_core::{AgentSnapshot, Command, Event, Facing, GameOverReason, Rect, WorldQuery};
use maze_whiskers_system_pathfinding::{PathGrid, PathPlan, PathPlanner};
use maze_whiskers_system_scheduler::{Scheduler, TimerId};

pub use jump::{ArcSample, JumpArc, JumpConfig};
pub use spawn::{choose_spawn_point, SpawnRules};

/// Configuration parameters required to construct the pursuit controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    planning: bool,
    path_speed: f32,
    chase_speed: f32,
    replan_interval: Duration,
    waypoint_tolerance: f32,
    lookahead: f32,
    probe_half_extent: f32,
    grid_cell_size: f32,
    jump: JumpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planning: true,
            path_speed: 80.0,
            chase_speed: 120.0,
            replan_interval: Duration::from_millis(200),
            waypoint_tolerance: 5.0,
            lookahead: 80.0,
            probe_half_extent: 16.0,
            grid_cell_size: maze_whiskers_system_pathfinding::DEFAULT_CELL_SIZE,
            jump: JumpConfig::default(),
        }
    }
}

impl Config {
    /// Enables or disables the A* planning layer.
    #[must_use]
    pub const fn with_planning(mut self, planning: bool) -> Self {
        self.planning = planning;
        self
    }

    /// Sets the speeds used while following a plan and while chasing directly.
    #[must_use]
    pub const fn with_speeds(mut self, path_speed: f32, chase_speed: f32) -> Self {
        self.path_speed = path_speed;
        self.chase_speed = chase_speed;
        self
    }

    /// Sets how often a fresh plan is computed.
    #[must_use]
    pub const fn with_replan_interval(mut self, replan_interval: Duration) -> Self {
        self.replan_interval = replan_interval;
        self
    }

    /// Sets how far ahead the wall probe is cast.
    #[must_use]
    pub const fn with_lookahead(mut self, lookahead: f32) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Sets the planner's cell size in world units.
    #[must_use]
    pub const fn with_grid_cell_size(mut self, grid_cell_size: f32) -> Self {
        self.grid_cell_size = grid_cell_size;
        self
    }

    /// Replaces the jump tuning.
    #[must_use]
    pub const fn with_jump(mut self, jump: JumpConfig) -> Self {
        self.jump = jump;
        self
    }

    /// Reports whether the planning layer is enabled.
    #[must_use]
    pub const fn planning(&self) -> bool {
        self.planning
    }
}

/// Movement state of the controlled enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PursuitState {
    /// Waiting for the activation signal.
    Idle,
    /// Steering along the plan or straight at the player.
    Chasing,
    /// Airborne over a wall.
    Jumping(JumpArc),
}

/// Outcome of a single controller step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PursuitStep {
    /// Velocity to apply to the enemy.
    pub velocity: Vec2,
    /// Facing implied by the velocity; `None` keeps the current facing.
    pub facing: Option<Facing>,
    /// Position the enemy is moved to while airborne.
    pub reposition: Option<Vec2>,
    /// Set on the single step that first detects the catch.
    pub caught: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PursuitTimer {
    Replan,
}

/// Enemy controller combining planning, direct chase and wall jumps.
#[derive(Debug)]
pub struct Pursuit {
    config: Config,
    state: PursuitState,
    plan: Option<PathPlan>,
    planner: PathPlanner,
    grid: PathGrid,
    scheduler: Scheduler<PursuitTimer>,
    replan_timer: Option<TimerId>,
    replan_due: bool,
    caught_reported: bool,
    halted: bool,
}

impl Default for Pursuit {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Pursuit {
    /// Creates an idle controller using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: PursuitState::Idle,
            plan: None,
            planner: PathPlanner::new(),
            grid: PathGrid::new(config.grid_cell_size),
            scheduler: Scheduler::new(),
            replan_timer: None,
            replan_due: false,
            caught_reported: false,
            halted: false,
        }
    }

    /// Current movement state.
    #[must_use]
    pub const fn state(&self) -> &PursuitState {
        &self.state
    }

    /// Reports whether the enemy is airborne.
    #[must_use]
    pub const fn is_jumping(&self) -> bool {
        matches!(self.state, PursuitState::Jumping(_))
    }

    /// Plan currently being followed, if any.
    #[must_use]
    pub fn plan(&self) -> Option<&PathPlan> {
        self.plan.as_ref()
    }

    /// Arc sample for the render layer while a jump is in progress.
    #[must_use]
    pub fn jump_sample(&self) -> Option<ArcSample> {
        match &self.state {
            PursuitState::Jumping(arc) => Some(arc.sample()),
            _ => None,
        }
    }

    /// Replaces the plan being followed, bypassing the planner.
    pub fn follow(&mut self, plan: PathPlan) {
        self.plan = Some(plan);
    }

    /// Starts chasing: the first step after activation plans immediately.
    pub fn activate(&mut self) {
        if self.halted {
            return;
        }
        self.reset_timer();
        if self.config.planning {
            self.replan_timer = Some(
                self.scheduler
                    .every(self.config.replan_interval, PursuitTimer::Replan),
            );
            self.replan_due = true;
        }
        self.state = PursuitState::Chasing;
        log::info!("enemy activated, planning {}", self.config.planning);
    }

    /// Consumes events and immutable views to emit steering commands.
    pub fn handle<W: WorldQuery + ?Sized>(
        &mut self,
        events: &[Event],
        enemy: Option<AgentSnapshot>,
        player: Option<AgentSnapshot>,
        world: &W,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::EnemyActivated => self.activate(),
                Event::EnemyDespawned => self.reset(),
                Event::GameOver { .. } => self.halt(),
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        let Some(step) = self.step(elapsed, enemy, player, world) else {
            return;
        };

        if let Some(position) = step.reposition {
            out.push(Command::RepositionEnemy { position });
        }
        out.push(Command::SteerEnemy {
            velocity: step.velocity,
            facing: step.facing,
        });
        if step.caught {
            out.push(Command::EndGame {
                reason: GameOverReason::EnemyCaughtPlayer,
            });
        }
    }

    /// Runs one controller update after `dt` of simulated time.
    ///
    /// Returns `None` while idle or halted, and when either agent is missing.
    pub fn step<W: WorldQuery + ?Sized>(
        &mut self,
        dt: Duration,
        enemy: Option<AgentSnapshot>,
        player: Option<AgentSnapshot>,
        world: &W,
    ) -> Option<PursuitStep> {
        if self.halted || self.state == PursuitState::Idle {
            return None;
        }

        let mut fired = Vec::new();
        self.scheduler.advance(dt, &mut fired);
        if fired.contains(&PursuitTimer::Replan) {
            self.replan_due = true;
        }

        let (Some(enemy), Some(player)) = (enemy, player) else {
            log::warn!("pursuit skipped a step: enemy or player is missing");
            return None;
        };

        let caught = !self.caught_reported && enemy.bounds.overlaps(&player.bounds);
        if caught {
            self.caught_reported = true;
            log::info!("enemy caught the player");
            return Some(PursuitStep {
                caught,
                ..PursuitStep::default()
            });
        }

        if let PursuitState::Jumping(arc) = &mut self.state {
            arc.advance(dt);
            let sample = arc.sample();
            if arc.is_finished() {
                self.state = PursuitState::Chasing;
                self.replan_due = self.config.planning;
                log::trace!("enemy landed at {}", sample.ground);
            }
            return Some(PursuitStep {
                reposition: Some(sample.ground),
                ..PursuitStep::default()
            });
        }

        if self.replan_due && self.config.planning {
            self.replan_due = false;
            self.replan(enemy.position, player.position, world);
        }

        let (target, speed) = match self.next_waypoint(enemy.position) {
            Some(waypoint) => (waypoint, self.config.path_speed),
            None => (player.position, self.config.chase_speed),
        };
        let direction = (target - enemy.position).normalize_or_zero();
        if direction == Vec2::ZERO {
            return Some(PursuitStep::default());
        }

        let player_distance = enemy.position.distance(player.position);
        if player_distance > self.config.jump.min_player_distance
            && self.probe_blocked(enemy.position, direction, world)
        {
            let extent = world.extent();
            let arc = JumpArc::launch(enemy.position, direction, &self.config.jump, &extent);
            log::debug!("wall ahead, jumping from {} to {}", arc.start(), arc.end());
            self.state = PursuitState::Jumping(arc);
            self.plan = None;
            return Some(PursuitStep {
                facing: Facing::from_velocity_x(direction.x),
                ..PursuitStep::default()
            });
        }

        let velocity = direction * speed;
        Some(PursuitStep {
            velocity,
            facing: Facing::from_velocity_x(velocity.x),
            reposition: None,
            caught: false,
        })
    }

    fn replan<W: WorldQuery + ?Sized>(&mut self, from: Vec2, to: Vec2, world: &W) {
        let grid = self.grid;
        let (Some(from), Some(to)) = (grid.cell_of(from), grid.cell_of(to)) else {
            self.plan = None;
            return;
        };

        let mut plan = self
            .planner
            .find_path(from, to, |cell| world.is_walkable(grid.center_of(cell)));
        if let Some(plan) = plan.as_mut() {
            if plan.len() > 1 {
                let _ = plan.advance();
            }
            log::debug!("replanned route with {} steps", plan.steps());
        } else {
            log::debug!("no route to the player, chasing directly");
        }
        self.plan = plan;
    }

    fn next_waypoint(&mut self, position: Vec2) -> Option<Vec2> {
        let grid = self.grid;
        let tolerance = self.config.waypoint_tolerance;
        let plan = self.plan.as_mut()?;
        while let Some(cell) = plan.current() {
            let center = grid.center_of(cell);
            if center.distance(position) > tolerance {
                return Some(center);
            }
            let _ = plan.advance();
        }
        None
    }

    fn probe_blocked<W: WorldQuery + ?Sized>(
        &self,
        position: Vec2,
        direction: Vec2,
        world: &W,
    ) -> bool {
        let point = position + direction * self.config.lookahead;
        if !world.extent().contains_point(point) {
            return true;
        }
        let side = self.config.probe_half_extent * 2.0;
        let probe = Rect::square(point, side);
        world
            .walls_near(point, side)
            .iter()
            .any(|wall| wall.overlaps(&probe))
    }

    fn reset_timer(&mut self) {
        if let Some(id) = self.replan_timer.take() {
            let _ = self.scheduler.cancel(id);
        }
        self.replan_due = false;
    }

    fn reset(&mut self) {
        self.reset_timer();
        self.state = PursuitState::Idle;
        self.plan = None;
        self.caught_reported = false;
    }

    fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.reset_timer();
        self.scheduler.clear();
        self.halted = true;
        self.plan = None;
        log::info!("pursuit halted");
    }
}
