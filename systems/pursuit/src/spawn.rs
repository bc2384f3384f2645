//! Placement of a freshly created enemy.

use glam::Vec2;
use maze_whiskers_core::WorldQuery;
use rand::Rng;

/// Constraints on where a new enemy may appear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRules {
    /// Minimum straight-line distance from the player.
    pub min_distance: f32,
    /// Distance kept clear from every maze edge.
    pub margin: f32,
    /// Random points tried before giving up.
    pub attempts: usize,
}

impl Default for SpawnRules {
    fn default() -> Self {
        Self {
            min_distance: 800.0,
            margin: 100.0,
            attempts: 4_096,
        }
    }
}

/// Draws a walkable point far enough from the player.
///
/// Returns `None` when the maze is too small for the margin or no sampled
/// point satisfied the rules.
pub fn choose_spawn_point<R, W>(
    rng: &mut R,
    world: &W,
    player: Vec2,
    rules: &SpawnRules,
) -> Option<Vec2>
where
    R: Rng + ?Sized,
    W: WorldQuery + ?Sized,
{
    let extent = world.extent();
    let low = Vec2::splat(rules.margin);
    let high = Vec2::new(extent.width(), extent.height()) - rules.margin;
    if high.x <= low.x || high.y <= low.y {
        log::warn!("maze is too small to keep a {} unit spawn margin", rules.margin);
        return None;
    }

    for _ in 0..rules.attempts {
        let candidate = Vec2::new(rng.gen_range(low.x..high.x), rng.gen_range(low.y..high.y));
        if candidate.distance(player) >= rules.min_distance && world.is_walkable(candidate) {
            return Some(candidate);
        }
    }

    log::warn!("no spawn point found after {} attempts", rules.attempts);
    None
}
