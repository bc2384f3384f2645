#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Survival rules: the player's health drains over time, fish restore it,
//! and reaching the goal wins the session.
//!
//! Health itself lives in the world. This system only requests changes with
//! [`Command::AdjustHealth`] and ends the session once the world reports an
//! empty health bar or the player's footprint overlaps the goal.

use std::time::Duration;

use maze_whiskers_core::{Command, EntityKind, Event, GameOverReason, WorldQuery};
use maze_whiskers_system_scheduler::{Scheduler, TimerId};

/// Configuration parameters required to construct the survival system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    drain_interval: Duration,
    drain_amount: i32,
    fish_restore: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(1),
            drain_amount: 1,
            fish_restore: 20,
        }
    }
}

impl Config {
    /// Sets how much health is lost and how often.
    #[must_use]
    pub const fn with_drain(mut self, interval: Duration, amount: i32) -> Self {
        self.drain_interval = interval;
        self.drain_amount = amount;
        self
    }

    /// Sets how much health one fish restores.
    #[must_use]
    pub const fn with_fish_restore(mut self, amount: i32) -> Self {
        self.fish_restore = amount;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SurvivalTimer {
    Drain,
}

/// Tracks the health drain and the terminal survival conditions.
#[derive(Debug)]
pub struct Survival {
    config: Config,
    scheduler: Scheduler<SurvivalTimer>,
    drain_timer: Option<TimerId>,
    terminal_raised: bool,
    halted: bool,
}

impl Default for Survival {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Survival {
    /// Creates a system whose drain has not started yet.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            scheduler: Scheduler::new(),
            drain_timer: None,
            terminal_raised: false,
            halted: false,
        }
    }

    /// Starts draining health. Calling it again has no effect.
    pub fn start(&mut self) {
        if self.halted || self.drain_timer.is_some() {
            return;
        }
        self.drain_timer = Some(
            self.scheduler
                .every(self.config.drain_interval, SurvivalTimer::Drain),
        );
        log::info!(
            "health drains by {} every {:?}",
            self.config.drain_amount,
            self.config.drain_interval
        );
    }

    /// Reports whether the health drain is running.
    #[must_use]
    pub const fn is_draining(&self) -> bool {
        self.drain_timer.is_some()
    }

    /// Consumes events and immutable views to emit health and terminal commands.
    pub fn handle<W: WorldQuery + ?Sized>(
        &mut self,
        events: &[Event],
        world: &W,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        let mut moved = false;
        for event in events {
            match event {
                Event::GameOver { .. } => self.halt(),
                Event::FishEaten { cell } if !self.halted => {
                    log::debug!("fish eaten at {cell:?}");
                    out.push(Command::AdjustHealth {
                        delta: self.config.fish_restore,
                    });
                }
                Event::HealthChanged { health: 0 } if !self.halted => {
                    let _ = self.raise(GameOverReason::HealthDepleted, out);
                }
                Event::HealthChanged { health } => log::trace!("health now {health}"),
                Event::PlayerPlaced { .. } | Event::GoalPlaced { .. } => moved = true,
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                _ => {}
            }
        }

        if self.halted {
            return;
        }

        if !elapsed.is_zero() {
            let mut fired = Vec::new();
            self.scheduler.advance(elapsed, &mut fired);
            for timer in fired {
                match timer {
                    SurvivalTimer::Drain => out.push(Command::AdjustHealth {
                        delta: -self.config.drain_amount,
                    }),
                }
            }
        }

        if moved || !elapsed.is_zero() {
            let _ = self.check_goal(world, out);
        }
    }

    /// Ends the session in victory when the player overlaps the goal.
    ///
    /// Returns whether this call raised the terminal event.
    pub fn check_goal<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        out: &mut Vec<Command>,
    ) -> bool {
        let (Some(player), Some(goal)) = (
            world.bounds(EntityKind::Player),
            world.bounds(EntityKind::Goal),
        ) else {
            return false;
        };
        if !player.overlaps(&goal) {
            return false;
        }
        self.raise(GameOverReason::PlayerReachedGoal, out)
    }

    fn raise(&mut self, reason: GameOverReason, out: &mut Vec<Command>) -> bool {
        if self.terminal_raised {
            return false;
        }
        self.terminal_raised = true;
        log::info!("survival ended the session: {reason:?}");
        out.push(Command::EndGame { reason });
        self.halt();
        true
    }

    fn halt(&mut self) {
        if self.halted {
            return;
        }
        if let Some(id) = self.drain_timer.take() {
            let _ = self.scheduler.cancel(id);
        }
        self.scheduler.clear();
        self.halted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_idempotent() {
        let mut survival = Survival::default();
        assert!(!survival.is_draining());

        survival.start();
        survival.start();

        assert!(survival.is_draining());
        assert_eq!(survival.scheduler.pending(), 1);
    }

    #[test]
    fn halted_system_never_restarts() {
        let mut survival = Survival::default();
        survival.halt();
        survival.start();

        assert!(!survival.is_draining());
        assert_eq!(survival.scheduler.pending(), 0);
    }
}
