use std::{collections::HashSet, time::Duration};

use glam::Vec2;
use maze_whiskers_core::{CellCoord, Command, Direction, Event, GameOverReason, PlacementId, Rect};
use maze_whiskers_system_encroachment::{Config, Encroachment, Phase};
use maze_whiskers_world::{self as world, parse_layout, query, World};

const TICK: Duration = Duration::from_millis(100);
const DUST: Duration = Duration::from_millis(1_300);

struct Session {
    world: World,
    encroachment: Encroachment,
    log: Vec<Event>,
}

impl Session {
    fn new(text: &str, config: Config) -> Self {
        let mut session = Self {
            world: World::new(),
            encroachment: Encroachment::new(config),
            log: Vec::new(),
        };
        let layout = parse_layout(text).expect("valid layout");
        session.pump(vec![Command::ConfigureMaze { layout }]);
        session
    }

    fn open(size: usize) -> Self {
        let row = ".".repeat(size);
        Self::new(&vec![row; size].join("\n"), Config::default())
    }

    fn pump(&mut self, commands: Vec<Command>) {
        let mut pending = commands;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.log.extend(events.iter().cloned());
            self.encroachment.handle(&events, &self.world, &mut pending);
        }
    }

    fn advance(&mut self, total: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            self.pump(vec![Command::Tick { dt: TICK }]);
            elapsed += TICK;
        }
    }

    fn tick(&mut self, direction: Direction) {
        let mut out = Vec::new();
        self.encroachment.tick(direction, &self.world, &mut out);
        self.pump(out);
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.log.iter().filter(|event| predicate(event)).count()
    }

    fn placed_cells(&self) -> Vec<CellCoord> {
        self.log
            .iter()
            .filter_map(|event| match event {
                Event::ObstaclePlaced { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect()
    }
}

fn pillar_layout(size: u32) -> String {
    (0..size)
        .map(|row| {
            (0..size)
                .map(|column| if row % 2 == 1 && column % 2 == 1 { '#' } else { '.' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn grace_delay_holds_back_the_first_ring() {
    let mut session = Session::open(21);
    session.encroachment.start();

    session.advance(Duration::from_millis(14_900));
    assert_eq!(session.count(|e| matches!(e, Event::DustSpawned { .. })), 0);
    assert_eq!(session.encroachment.phase(), Phase::Grace);

    session.advance(TICK);
    assert_eq!(session.encroachment.phase(), Phase::Advancing);
    assert_eq!(session.count(|e| matches!(e, Event::DustSpawned { .. })), 84);
    for direction in Direction::ALL {
        assert_eq!(session.encroachment.progress(direction), 1);
    }

    session.advance(DUST);
    assert_eq!(session.placed_cells().len(), 80);
    assert_eq!(session.count(|e| matches!(e, Event::ObstacleRejected { .. })), 0);
    assert!(query::dust(&session.world).is_empty());
}

#[test]
fn fronts_fill_the_maze_without_duplicate_obstacles() {
    let mut session = Session::new(&pillar_layout(21), Config::new(9));
    session.encroachment.start();

    session.advance(Duration::from_secs(120));

    let placed = session.placed_cells();
    let unique: HashSet<_> = placed.iter().copied().collect();
    assert_eq!(unique.len(), placed.len(), "a cell received two obstacles");
    assert_eq!(session.count(|e| matches!(e, Event::ObstacleRejected { .. })), 0);
    assert_eq!(query::obstacles(&session.world).len(), 21 * 21);
    assert_eq!(
        session.count(|e| matches!(e, Event::EncroachmentCompleted)),
        1
    );
    assert!(session.encroachment.is_complete());
    assert_eq!(session.encroachment.phase(), Phase::Completed);
    assert_eq!(session.encroachment.pending_placements(), 0);
    assert!(query::encroachment_complete(&session.world));
}

#[test]
fn walls_are_removed_before_dust_appears() {
    let mut session = Session::new("#.#\n...\n...", Config::default());

    session.tick(Direction::North);

    let wall_removals = session.count(|e| matches!(e, Event::WallRemoved { .. }));
    assert_eq!(wall_removals, 2);
    assert!(matches!(session.log[1], Event::WallRemoved { .. }));
    assert_eq!(query::dust(&session.world).len(), 3);
}

#[test]
fn racing_fronts_commit_a_shared_corner_once() {
    let mut session = Session::open(21);

    session.tick(Direction::North);
    session.tick(Direction::West);
    assert_eq!(session.count(|e| matches!(e, Event::DustSpawned { .. })), 42);

    session.advance(DUST);

    let corner = CellCoord::new(0, 0);
    let placed = session.placed_cells();
    assert_eq!(placed.iter().filter(|cell| **cell == corner).count(), 1);
    assert_eq!(placed.len(), 41);
    assert_eq!(session.count(|e| matches!(e, Event::DustCleared { .. })), 42);
    assert!(session.encroachment.is_occupied(corner));
}

#[test]
fn skipped_cells_still_advance_the_front() {
    let mut session = Session::new("XXX\n...\n...", Config::default());

    session.tick(Direction::North);

    assert_eq!(session.encroachment.progress(Direction::North), 1);
    assert_eq!(session.count(|e| matches!(e, Event::DustSpawned { .. })), 0);
}

#[test]
fn obstacle_landing_on_player_ends_the_game() {
    let mut session = Session::open(21);
    session.pump(vec![Command::PlacePlayer {
        position: Vec2::new(528.0, 48.0),
    }]);

    session.tick(Direction::North);
    session.advance(DUST);

    assert_eq!(
        query::game_over(&session.world),
        Some(GameOverReason::ObstacleHitPlayer)
    );
    assert_eq!(session.count(|e| matches!(e, Event::GameOver { .. })), 1);
    assert_eq!(query::obstacles(&session.world).len(), 6);
    assert!(query::dust(&session.world).is_empty());
    assert_eq!(session.encroachment.phase(), Phase::Halted);

    let before = session.log.len();
    session.tick(Direction::North);
    session.advance(Duration::from_secs(20));
    assert!(!session.log[before..]
        .iter()
        .any(|e| matches!(e, Event::DustSpawned { .. } | Event::ObstaclePlaced { .. })));
}

#[test]
fn obstacle_landing_on_goal_ends_the_game() {
    let mut session = Session::open(21);
    session.pump(vec![Command::PlaceGoal {
        cell: CellCoord::new(3, 20),
    }]);

    session.tick(Direction::South);
    session.advance(DUST);

    assert_eq!(
        query::game_over(&session.world),
        Some(GameOverReason::ObstacleHitGoal)
    );
    assert_eq!(query::obstacles(&session.world).len(), 4);
}

#[test]
fn repeated_collision_check_raises_once() {
    let mut session = Session::open(5);
    session.pump(vec![Command::PlacePlayer {
        position: Vec2::new(100.0, 100.0),
    }]);
    let footprint = Rect::square(Vec2::new(110.0, 110.0), 96.0);

    let mut out = Vec::new();
    assert!(session
        .encroachment
        .check_collision(&footprint, &session.world, &mut out));
    assert!(!session
        .encroachment
        .check_collision(&footprint, &session.world, &mut out));

    assert_eq!(
        out,
        vec![Command::EndGame {
            reason: GameOverReason::ObstacleHitPlayer,
        }]
    );
}

#[test]
fn eleven_rings_complete_a_21_cell_maze() {
    let mut session = Session::open(21);

    for _ in 0..11 {
        for direction in Direction::ALL {
            session.tick(direction);
        }
    }

    assert!(session.encroachment.is_complete());
    assert_eq!(session.encroachment.phase(), Phase::Completed);
    assert_eq!(
        session.count(|e| matches!(e, Event::EncroachmentCompleted)),
        1
    );

    session.encroachment.stop();
    session.encroachment.stop();
    let before = session.log.len();
    session.tick(Direction::North);
    session.advance(Duration::from_secs(2));

    assert!(!session.log[before..]
        .iter()
        .any(|e| matches!(e, Event::DustSpawned { .. } | Event::ObstaclePlaced { .. })));
    assert_eq!(session.encroachment.pending_placements(), 0);
    assert!(query::dust(&session.world).is_empty());
}

#[test]
fn stopping_during_grace_prevents_every_ring() {
    let mut session = Session::open(9);
    session.encroachment.start();
    session.pump(vec![Command::EndGame {
        reason: GameOverReason::EnemyCaughtPlayer,
    }]);
    session.encroachment.stop();

    session.advance(Duration::from_secs(30));

    assert_eq!(session.encroachment.phase(), Phase::Halted);
    assert_eq!(session.count(|e| matches!(e, Event::DustSpawned { .. })), 0);
}

#[test]
fn seeded_runs_replay_identically() {
    let run = || {
        let mut session = Session::new(&pillar_layout(11), Config::new(42));
        session.encroachment.start();
        session.advance(Duration::from_secs(40));
        session.log
    };

    let first = run();
    assert_eq!(first, run());
    assert!(first.iter().any(|e| matches!(
        e,
        Event::ObstaclePlaced {
            placement,
            ..
        } if *placement == PlacementId::new(0)
    )));
}
