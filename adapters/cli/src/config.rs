//! Optional TOML tuning file for a session.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use maze_whiskers_core::CellCoord;
use maze_whiskers_system_encroachment as encroachment;
use maze_whiskers_system_pursuit as pursuit;
use maze_whiskers_system_survival as survival;
use serde::Deserialize;

/// Every tunable of a headless session. Missing keys keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionConfig {
    pub(crate) session: SessionSection,
    pub(crate) pursuit: PursuitSection,
    pub(crate) encroachment: EncroachmentSection,
    pub(crate) health: HealthSection,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionSection {
    /// Cell the player starts in, as `[column, row]`.
    pub(crate) player_cell: [u32; 2],
    /// Minimum distance between the player's start and the goal.
    pub(crate) goal_min_distance: f32,
    /// Length of the introduction before the enemy starts moving.
    pub(crate) cutscene_ms: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            player_cell: [2, 2],
            goal_min_distance: 800.0,
            cutscene_ms: 5_500,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PursuitSection {
    pub(crate) planning: bool,
    pub(crate) path_speed: f32,
    pub(crate) chase_speed: f32,
    pub(crate) replan_interval_ms: u64,
    pub(crate) lookahead: f32,
    pub(crate) grid_cell_size: f32,
    pub(crate) jump_distance: f32,
    pub(crate) jump_height: f32,
    pub(crate) jump_ms: u64,
    /// Jumps only trigger while the player is farther away than this.
    pub(crate) jump_min_player_distance: f32,
}

impl Default for PursuitSection {
    fn default() -> Self {
        Self {
            planning: true,
            path_speed: 80.0,
            chase_speed: 120.0,
            replan_interval_ms: 200,
            lookahead: 80.0,
            grid_cell_size: 32.0,
            jump_distance: 200.0,
            jump_height: 150.0,
            jump_ms: 600,
            jump_min_player_distance: 200.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EncroachmentSection {
    pub(crate) enabled: bool,
    pub(crate) grace_ms: u64,
    pub(crate) interval_ms: u64,
    pub(crate) dust_delay_ms: u64,
    /// Fraction of a cell around committed obstacles that counts as taken.
    pub(crate) occupancy_radius: f32,
    /// Obstacle footprint side as a fraction of a cell.
    pub(crate) obstacle_extent: f32,
}

impl Default for EncroachmentSection {
    fn default() -> Self {
        Self {
            enabled: true,
            grace_ms: 15_000,
            interval_ms: 10_000,
            dust_delay_ms: 1_300,
            occupancy_radius: 0.5,
            obstacle_extent: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HealthSection {
    pub(crate) enabled: bool,
    pub(crate) drain_interval_ms: u64,
    pub(crate) drain_amount: i32,
    pub(crate) fish_restore: i32,
    /// Chance that an open cell receives a fish.
    pub(crate) fish_density: f64,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            enabled: true,
            drain_interval_ms: 1_000,
            drain_amount: 1,
            fish_restore: 20,
            fish_density: 0.1,
        }
    }
}

impl SessionConfig {
    /// Reads and parses the tuning file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config at {}", path.display()))?;
        Self::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse session config toml contents")
    }

    pub(crate) fn player_cell(&self) -> CellCoord {
        let [column, row] = self.session.player_cell;
        CellCoord::new(column, row)
    }

    pub(crate) fn cutscene(&self) -> Duration {
        Duration::from_millis(self.session.cutscene_ms)
    }

    pub(crate) fn pursuit(&self) -> pursuit::Config {
        let section = &self.pursuit;
        pursuit::Config::default()
            .with_planning(section.planning)
            .with_speeds(section.path_speed, section.chase_speed)
            .with_replan_interval(Duration::from_millis(section.replan_interval_ms))
            .with_lookahead(section.lookahead)
            .with_grid_cell_size(section.grid_cell_size)
            .with_jump(pursuit::JumpConfig {
                distance: section.jump_distance,
                height: section.jump_height,
                duration: Duration::from_millis(section.jump_ms),
                min_player_distance: section.jump_min_player_distance,
            })
    }

    pub(crate) fn encroachment(&self, seed: u64) -> encroachment::Config {
        let section = &self.encroachment;
        encroachment::Config::new(seed)
            .with_grace(Duration::from_millis(section.grace_ms))
            .with_interval(Duration::from_millis(section.interval_ms))
            .with_dust_delay(Duration::from_millis(section.dust_delay_ms))
            .with_footprint(section.occupancy_radius, section.obstacle_extent)
    }

    pub(crate) fn survival(&self) -> survival::Config {
        let section = &self.health;
        survival::Config::default()
            .with_drain(
                Duration::from_millis(section.drain_interval_ms),
                section.drain_amount,
            )
            .with_fish_restore(section.fish_restore)
    }
}
