//! Time-parameterised jump arc used when a wall blocks the enemy.

use std::{f32::consts::PI, time::Duration};

use glam::Vec2;
use maze_whiskers_core::MazeExtent;

const SHADOW_ALPHA: f32 = 0.3;

/// Tuning for the wall jump.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpConfig {
    /// Horizontal distance covered by one jump in world units.
    pub distance: f32,
    /// Peak height of the arc in world units.
    pub height: f32,
    /// Time from take-off to landing.
    pub duration: Duration,
    /// Jumps only trigger while the player is farther away than this.
    pub min_player_distance: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            distance: 200.0,
            height: 150.0,
            duration: Duration::from_millis(600),
            min_player_distance: 200.0,
        }
    }
}

/// Arc from a take-off point to a landing point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpArc {
    start: Vec2,
    end: Vec2,
    height: f32,
    duration: Duration,
    elapsed: Duration,
}

/// State of the arc at one instant, exposed for the render layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcSample {
    /// Ground projection of the enemy, where its shadow sits.
    pub ground: Vec2,
    /// Height above the ground.
    pub height: f32,
    /// Drawn sprite position: the ground point raised by the height.
    pub position: Vec2,
    /// Opacity of the shadow; it fades while the enemy is airborne.
    pub shadow_alpha: f32,
}

impl JumpArc {
    /// Creates an arc between two points.
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2, height: f32, duration: Duration) -> Self {
        Self {
            start,
            end,
            height,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Launches along `direction`, landing inside the maze.
    #[must_use]
    pub fn launch(start: Vec2, direction: Vec2, config: &JumpConfig, extent: &MazeExtent) -> Self {
        let bounds = extent.bounds();
        let landing = (start + direction.normalize_or_zero() * config.distance)
            .clamp(bounds.min(), bounds.max());
        Self::new(start, landing, config.height, config.duration)
    }

    /// Take-off point.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        self.start
    }

    /// Landing point.
    #[must_use]
    pub const fn end(&self) -> Vec2 {
        self.end
    }

    /// Fraction of the arc completed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Moves the arc forward in time.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
    }

    /// Reports whether the enemy has landed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Samples the arc at its current progress.
    #[must_use]
    pub fn sample(&self) -> ArcSample {
        let progress = self.progress();
        let lift = (progress * PI).sin();
        let ground = self.start.lerp(self.end, quad_in_out(progress));
        let height = lift * self.height;
        ArcSample {
            ground,
            height,
            position: ground - Vec2::new(0.0, height),
            shadow_alpha: SHADOW_ALPHA * (1.0 - lift * 0.5),
        }
    }
}

fn quad_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}
