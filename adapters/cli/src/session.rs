//! Headless game session wiring the world to the pursuit, encroachment and
//! survival systems.

use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;
use maze_whiskers_core::{CellKind, Command, Event, GameOverReason, MazeLayout, WELCOME_BANNER};
use maze_whiskers_system_encroachment::Encroachment;
use maze_whiskers_system_pursuit::{choose_spawn_point, Pursuit, SpawnRules};
use maze_whiskers_system_scheduler::Scheduler;
use maze_whiskers_system_survival::Survival;
use maze_whiskers_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::SessionConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionTimer {
    ActivateEnemy,
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) elapsed: Duration,
    pub(crate) outcome: Option<GameOverReason>,
    pub(crate) obstacles: usize,
    pub(crate) encroachment_complete: bool,
    pub(crate) health: u32,
}

pub(crate) struct Session {
    world: World,
    pursuit: Pursuit,
    encroachment: Encroachment,
    survival: Survival,
    scheduler: Scheduler<SessionTimer>,
    elapsed: Duration,
}

impl Session {
    /// Configures the maze and places the player, the goal and the enemy.
    pub(crate) fn new(layout: MazeLayout, config: &SessionConfig, seed: u64) -> Result<Self> {
        let mut session = Self {
            world: World::new(),
            pursuit: Pursuit::new(config.pursuit()),
            encroachment: Encroachment::new(config.encroachment(seed)),
            survival: Survival::new(config.survival()),
            scheduler: Scheduler::new(),
            elapsed: Duration::ZERO,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        log::info!("{WELCOME_BANNER}");

        session.pump(vec![Command::ConfigureMaze { layout }]);
        let extent = query::extent(&session.world);

        let player_cell = config.player_cell();
        match query::layout(&session.world).kind(player_cell) {
            Some(CellKind::Empty) => {}
            Some(kind) => anyhow::bail!("player start {player_cell:?} holds {kind:?}"),
            None => anyhow::bail!("player start {player_cell:?} lies outside the maze"),
        }
        let player = extent.cell_center(player_cell);
        session.pump(vec![Command::PlacePlayer { position: player }]);

        match query::select_goal_cell(
            &session.world,
            &mut rng,
            player,
            config.session.goal_min_distance,
        ) {
            Some(cell) => session.pump(vec![Command::PlaceGoal { cell }]),
            None => log::warn!("session runs without a goal"),
        }

        let fish = query::scatter_fish(
            &session.world,
            &mut rng,
            config.health.fish_density,
            player_cell,
        );
        log::debug!("scattering {} fish", fish.len());
        session.pump(fish.into_iter().map(|cell| Command::PlaceFish { cell }).collect());

        let spawn = choose_spawn_point(&mut rng, &session.world, player, &SpawnRules::default())
            .context("no walkable spawn point for the enemy")?;
        session.pump(vec![Command::SpawnEnemy { position: spawn }]);
        let _ = session
            .scheduler
            .after(config.cutscene(), SessionTimer::ActivateEnemy);

        if config.encroachment.enabled {
            session.encroachment.start();
        }
        if config.health.enabled {
            session.survival.start();
        }
        Ok(session)
    }

    /// Advances the simulation until the game ends or `limit` elapses.
    pub(crate) fn run(&mut self, limit: Duration, step: Duration) -> Summary {
        let step = step.max(Duration::from_millis(1));
        while self.elapsed < limit && query::game_over(&self.world).is_none() {
            self.advance(step);
        }
        self.summary()
    }

    fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
        let mut commands = vec![Command::Tick { dt }];

        let mut fired = Vec::new();
        self.scheduler.advance(dt, &mut fired);
        for timer in fired {
            match timer {
                SessionTimer::ActivateEnemy => commands.push(Command::ActivateEnemy),
            }
        }

        self.pump(commands);
    }

    fn pump(&mut self, commands: Vec<Command>) {
        let mut pending = commands;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            for event in &events {
                log_event(event);
            }

            self.pursuit.handle(
                &events,
                query::enemy(&self.world),
                query::player(&self.world),
                &self.world,
                &mut pending,
            );
            self.encroachment.handle(&events, &self.world, &mut pending);
            self.survival.handle(&events, &self.world, &mut pending);
        }
    }

    pub(crate) fn enemy_position(&self) -> Option<Vec2> {
        query::enemy(&self.world).map(|enemy| enemy.position)
    }

    fn summary(&self) -> Summary {
        Summary {
            elapsed: self.elapsed,
            outcome: query::game_over(&self.world),
            obstacles: query::obstacles(&self.world).len(),
            encroachment_complete: query::encroachment_complete(&self.world),
            health: query::health(&self.world),
        }
    }
}

fn log_event(event: &Event) {
    match event {
        Event::TimeAdvanced { .. } | Event::HealthChanged { .. } => log::trace!("{event:?}"),
        Event::GameOver { .. } | Event::EncroachmentCompleted | Event::EnemyActivated => {
            log::info!("{event:?}")
        }
        _ => log::debug!("{event:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_layout(size: u32) -> MazeLayout {
        MazeLayout::filled(size, size, CellKind::Empty)
    }

    fn quiet_config() -> SessionConfig {
        let mut config = SessionConfig::default();
        config.encroachment.enabled = false;
        config.health.enabled = false;
        config
    }

    #[test]
    fn enemy_waits_for_the_cutscene() {
        let mut session = Session::new(open_layout(21), &quiet_config(), 5).expect("session");
        let spawn = session.enemy_position().expect("enemy spawned");

        let summary = session.run(Duration::from_secs(5), Duration::from_millis(100));

        assert_eq!(summary.outcome, None);
        assert_eq!(session.enemy_position(), Some(spawn));
        assert!(!query::enemy_active(&session.world));
    }

    #[test]
    fn enemy_eventually_catches_an_idle_player() {
        let mut session = Session::new(open_layout(21), &quiet_config(), 5).expect("session");

        let summary = session.run(Duration::from_secs(120), Duration::from_millis(50));

        assert_eq!(summary.outcome, Some(GameOverReason::EnemyCaughtPlayer));
        assert!(summary.elapsed < Duration::from_secs(120));
    }

    #[test]
    fn idle_player_starves_when_health_drains_fast() {
        let mut config = quiet_config();
        config.health.enabled = true;
        config.health.fish_density = 0.0;
        config.health.drain_amount = 50;

        let mut session = Session::new(open_layout(21), &config, 5).expect("session");
        let summary = session.run(Duration::from_secs(10), Duration::from_millis(100));

        assert_eq!(summary.outcome, Some(GameOverReason::HealthDepleted));
        assert_eq!(summary.health, 0);
        assert_eq!(summary.elapsed, Duration::from_secs(2));
    }

    #[test]
    fn default_start_survives_the_first_ring() {
        let mut config = SessionConfig::default();
        config.health.enabled = false;
        config.session.cutscene_ms = 60_000;
        let mut session = Session::new(open_layout(21), &config, 0).expect("session");

        let summary = session.run(Duration::from_millis(16_500), Duration::from_millis(100));

        assert_eq!(summary.outcome, None);
        assert_eq!(summary.obstacles, 4 * 21 - 4);
    }

    #[test]
    fn blocked_player_start_is_rejected() {
        let config = SessionConfig::default();
        let mut layout = open_layout(21);
        let _ = layout.set(config.player_cell(), CellKind::Wall);

        let result = Session::new(layout, &config, 1);
        assert!(result.is_err());
    }
}
