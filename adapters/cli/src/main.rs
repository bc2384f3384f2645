#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Maze Whiskers session.

mod config;
mod session;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use maze_whiskers_core::{CellCoord, CellKind, MazeLayout};
use maze_whiskers_world::parse_layout;

use crate::{config::SessionConfig, session::Session};

const DEFAULT_MAZE_SIZE: u32 = 21;

/// Headless Maze Whiskers simulation.
#[derive(Debug, Parser)]
#[command(name = "maze-whiskers", version, about)]
struct Args {
    /// Text maze layout: `#` wall, `X` obstacle, `.` floor.
    #[arg(long)]
    layout: Option<PathBuf>,
    /// TOML file overriding session tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated seconds to run before giving up.
    #[arg(long, default_value_t = 180)]
    seconds: u64,
    /// Length of one simulation step in milliseconds.
    #[arg(long = "step-ms", default_value_t = 16)]
    step_ms: u64,
    /// Seed for goal, fish, spawn and obstacle selection.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Entry point for the Maze Whiskers command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_default_env().try_init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let layout = match &args.layout {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read maze layout at {}", path.display()))?;
            parse_layout(&text)
                .with_context(|| format!("invalid maze layout in {}", path.display()))?
        }
        None => pillar_maze(DEFAULT_MAZE_SIZE),
    };

    let mut session = Session::new(layout, &config, args.seed)?;
    let summary = session.run(
        Duration::from_secs(args.seconds),
        Duration::from_millis(args.step_ms),
    );

    match summary.outcome {
        Some(reason) if reason.is_victory() => println!("victory after {:?}", summary.elapsed),
        Some(reason) => println!("game over after {:?}: {reason:?}", summary.elapsed),
        None => println!("survived {:?}", summary.elapsed),
    }
    println!(
        "health: {}, obstacles placed: {}, encroachment complete: {}",
        summary.health, summary.obstacles, summary.encroachment_complete
    );
    if let Some(position) = session.enemy_position() {
        println!("enemy resting at ({:.1}, {:.1})", position.x, position.y);
    }
    Ok(())
}

/// Open maze with a wall on every odd column of every odd row.
fn pillar_maze(size: u32) -> MazeLayout {
    let mut layout = MazeLayout::filled(size, size, CellKind::Empty);
    for row in (1..size).step_by(2) {
        for column in (1..size).step_by(2) {
            let _ = layout.set(CellCoord::new(column, row), CellKind::Wall);
        }
    }
    layout
}
