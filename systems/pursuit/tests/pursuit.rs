use std::time::Duration;

use glam::Vec2;
use maze_whiskers_core::{
    AgentSnapshot, CellCoord, Command, EntityKind, Event, Facing, GameOverReason, Rect,
    WorldQuery,
};
use maze_whiskers_system_pathfinding::PathPlan;
use maze_whiskers_system_pursuit::{choose_spawn_point, Config, Pursuit, PursuitState, SpawnRules};
use maze_whiskers_world::{self as world, parse_layout, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const STEP: Duration = Duration::from_millis(100);

fn snapshot(position: Vec2) -> AgentSnapshot {
    AgentSnapshot {
        position,
        velocity: Vec2::ZERO,
        facing: Facing::default(),
        bounds: Rect::square(position, 40.0),
    }
}

fn world_from(text: &str) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    let layout = parse_layout(text).expect("valid layout");
    world::apply(&mut world, Command::ConfigureMaze { layout }, &mut events);
    world
}

fn open_world(size: usize) -> World {
    let row = ".".repeat(size);
    let text = vec![row; size].join("\n");
    world_from(&text)
}

#[test]
fn following_a_fixed_plan_consumes_waypoints_in_order() {
    let world = open_world(5);
    let mut pursuit = Pursuit::new(Config::default().with_planning(false));
    pursuit.activate();
    pursuit.follow(PathPlan::new(vec![
        CellCoord::new(1, 1),
        CellCoord::new(2, 1),
        CellCoord::new(3, 1),
        CellCoord::new(3, 2),
        CellCoord::new(3, 3),
    ]));

    let player = snapshot(Vec2::new(400.0, 400.0));
    let mut enemy = Vec2::new(48.0, 48.0);
    let mut remaining = pursuit.plan().map(PathPlan::remaining).unwrap_or_default();
    let mut observed = vec![remaining];

    for _ in 0..100 {
        let step = pursuit
            .step(STEP, Some(snapshot(enemy)), Some(player), &world)
            .expect("active controller steers");
        assert_ne!(step.velocity, Vec2::ZERO);
        enemy += step.velocity * STEP.as_secs_f32();

        let plan = pursuit.plan().expect("plan retained while planning is off");
        assert!(plan.cursor() <= plan.len());
        let now = plan.remaining();
        assert!(now <= remaining, "remaining waypoints grew from {remaining} to {now}");
        if now < remaining {
            observed.push(now);
        }
        remaining = now;
        if plan.is_exhausted() {
            break;
        }
    }

    assert_eq!(observed, vec![5, 4, 3, 2, 1, 0]);
}

#[test]
fn exhausted_plan_falls_back_to_direct_chase() {
    let world = open_world(5);
    let mut pursuit = Pursuit::new(Config::default().with_planning(false));
    pursuit.activate();

    let enemy = snapshot(Vec2::new(100.0, 100.0));
    let player = snapshot(Vec2::new(250.0, 100.0));
    let step = pursuit
        .step(STEP, Some(enemy), Some(player), &world)
        .expect("active controller steers");

    assert_eq!(step.velocity, Vec2::new(120.0, 0.0));
    assert_eq!(step.facing, Some(Facing::Right));
}

#[test]
fn jumping_ignores_steering_until_landing() {
    let world = world_from("..#....\n..#....\n..#....");
    let mut pursuit = Pursuit::new(Config::default().with_planning(false));
    pursuit.activate();

    let enemy = snapshot(Vec2::new(144.0, 144.0));
    let take_off = pursuit
        .step(STEP, Some(enemy), Some(snapshot(Vec2::new(624.0, 144.0))), &world)
        .expect("active controller steers");
    assert!(pursuit.is_jumping());
    assert_eq!(take_off.velocity, Vec2::ZERO);

    let players = [
        Vec2::new(624.0, 144.0),
        Vec2::new(48.0, 48.0),
        Vec2::new(600.0, 250.0),
        Vec2::new(10.0, 280.0),
        Vec2::new(500.0, 10.0),
        Vec2::new(620.0, 20.0),
    ];
    let mut landing = None;
    for player in players {
        assert!(pursuit.is_jumping());
        let sample = pursuit.jump_sample().expect("airborne");
        assert!(sample.shadow_alpha <= 0.3);

        let step = pursuit
            .step(STEP, Some(enemy), Some(snapshot(player)), &world)
            .expect("jump progresses");
        assert_eq!(step.velocity, Vec2::ZERO);
        landing = step.reposition;
    }

    assert_eq!(pursuit.state(), &PursuitState::Chasing);
    assert_eq!(landing, Some(Vec2::new(344.0, 144.0)));
}

#[test]
fn nearby_player_suppresses_the_jump() {
    let world = world_from("..#....\n..#....\n..#....");
    let mut pursuit = Pursuit::new(Config::default().with_planning(false));
    pursuit.activate();

    let step = pursuit
        .step(
            STEP,
            Some(snapshot(Vec2::new(144.0, 144.0))),
            Some(snapshot(Vec2::new(300.0, 144.0))),
            &world,
        )
        .expect("active controller steers");

    assert!(!pursuit.is_jumping());
    assert_eq!(step.velocity, Vec2::new(120.0, 0.0));
}

#[test]
fn missing_agents_skip_the_step() {
    let world = open_world(3);
    let mut pursuit = Pursuit::default();
    pursuit.activate();

    let step = pursuit.step(STEP, None, Some(snapshot(Vec2::new(48.0, 48.0))), &world);
    assert!(step.is_none());
    assert_eq!(pursuit.state(), &PursuitState::Chasing);
}

#[test]
fn idle_controller_emits_nothing() {
    let world = open_world(3);
    let mut pursuit = Pursuit::default();
    let mut commands = Vec::new();

    pursuit.handle(
        &[Event::TimeAdvanced { dt: STEP }],
        Some(snapshot(Vec2::new(48.0, 48.0))),
        Some(snapshot(Vec2::new(240.0, 240.0))),
        &world,
        &mut commands,
    );

    assert!(commands.is_empty());
}

#[test]
fn planned_chase_catches_the_player_exactly_once() {
    let mut world = open_world(7);
    let mut pursuit = Pursuit::default();
    let mut log = Vec::new();

    for command in [
        Command::PlacePlayer {
            position: Vec2::new(432.0, 432.0),
        },
        Command::SpawnEnemy {
            position: Vec2::new(48.0, 48.0),
        },
        Command::ActivateEnemy,
    ] {
        pump(&mut world, &mut pursuit, command, &mut log);
    }

    for _ in 0..400 {
        pump(
            &mut world,
            &mut pursuit,
            Command::Tick {
                dt: Duration::from_millis(50),
            },
            &mut log,
        );
        if query::game_over(&world).is_some() {
            break;
        }
    }

    assert_eq!(
        query::game_over(&world),
        Some(GameOverReason::EnemyCaughtPlayer)
    );
    let enemy = query::enemy(&world).expect("enemy exists");
    let player = world.bounds(EntityKind::Player).expect("player exists");
    assert!(enemy.bounds.overlaps(&player));

    let mut after = Vec::new();
    pursuit.handle(
        &[Event::TimeAdvanced { dt: STEP }],
        query::enemy(&world),
        query::player(&world),
        &world,
        &mut after,
    );
    assert!(after.is_empty());

    let catches = log
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::GameOver {
                    reason: GameOverReason::EnemyCaughtPlayer
                }
            )
        })
        .count();
    assert_eq!(catches, 1);
}

#[test]
fn despawned_enemy_returns_the_controller_to_idle() {
    let mut world = open_world(7);
    let mut pursuit = Pursuit::default();
    let mut log = Vec::new();

    for command in [
        Command::PlacePlayer {
            position: Vec2::new(432.0, 432.0),
        },
        Command::SpawnEnemy {
            position: Vec2::new(48.0, 48.0),
        },
        Command::ActivateEnemy,
        Command::Tick { dt: STEP },
    ] {
        pump(&mut world, &mut pursuit, command, &mut log);
    }
    assert_eq!(pursuit.state(), &PursuitState::Chasing);
    assert!(pursuit.plan().is_some());

    pump(&mut world, &mut pursuit, Command::DespawnEnemy, &mut log);

    assert_eq!(pursuit.state(), &PursuitState::Idle);
    assert!(pursuit.plan().is_none());
    assert!(query::enemy(&world).is_none());
}

#[test]
fn spawn_point_keeps_distance_and_margin() {
    let world = open_world(21);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let player = Vec2::new(144.0, 144.0);
    let rules = SpawnRules::default();

    for _ in 0..16 {
        let point = choose_spawn_point(&mut rng, &world, player, &rules).expect("spawn point");
        assert!(point.distance(player) >= rules.min_distance);
        assert!(point.x >= rules.margin && point.y >= rules.margin);
        assert!(world.is_walkable(point));
    }
}

#[test]
fn spawn_point_is_absent_in_cramped_mazes() {
    let world = open_world(2);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let point = choose_spawn_point(&mut rng, &world, Vec2::ZERO, &SpawnRules::default());
    assert!(point.is_none());
}

#[test]
fn replanning_replaces_the_plan_only_on_the_interval() {
    let world = world_from(".....XXX.\n.....X.X.\n.....XXX.");
    let mut pursuit = Pursuit::default();
    pursuit.activate();

    let enemy = snapshot(Vec2::new(48.0, 144.0));
    let player = snapshot(Vec2::new(624.0, 144.0));
    let detour = || PathPlan::new(vec![CellCoord::new(1, 7)]);
    let chase = Vec2::new(120.0, 0.0);
    let follow = Vec2::new(0.0, 80.0);

    let first = pursuit
        .step(STEP, Some(enemy), Some(player), &world)
        .expect("active controller steers");
    assert!(pursuit.plan().is_none(), "the walled-off player has no route");
    assert_eq!(first.velocity, chase);

    let mut observed = Vec::new();
    for _ in 0..4 {
        pursuit.follow(detour());
        let step = pursuit
            .step(STEP, Some(enemy), Some(player), &world)
            .expect("active controller steers");
        observed.push((pursuit.plan().is_some(), step.velocity));
    }

    assert_eq!(
        observed,
        vec![(false, chase), (true, follow), (false, chase), (true, follow)]
    );
}

#[test]
fn obstacle_ahead_triggers_a_jump() {
    let world = world_from("..X....\n..X....\n..X....");
    let mut pursuit = Pursuit::new(Config::default().with_planning(false));
    pursuit.activate();

    let take_off = pursuit
        .step(
            STEP,
            Some(snapshot(Vec2::new(144.0, 144.0))),
            Some(snapshot(Vec2::new(624.0, 144.0))),
            &world,
        )
        .expect("active controller steers");

    assert_eq!(take_off.velocity, Vec2::ZERO);
    match pursuit.state() {
        PursuitState::Jumping(arc) => assert_eq!(arc.end(), Vec2::new(344.0, 144.0)),
        state => panic!("expected a jump, found {state:?}"),
    }
}

#[test]
fn waypoint_past_the_edge_triggers_a_clamped_jump() {
    let world = open_world(5);
    let mut pursuit = Pursuit::new(Config::default().with_planning(false));
    pursuit.activate();
    pursuit.follow(PathPlan::new(vec![CellCoord::new(40, 1)]));

    let take_off = pursuit
        .step(
            STEP,
            Some(snapshot(Vec2::new(440.0, 48.0))),
            Some(snapshot(Vec2::new(48.0, 400.0))),
            &world,
        )
        .expect("active controller steers");

    assert_eq!(take_off.velocity, Vec2::ZERO);
    assert_eq!(take_off.facing, Some(Facing::Right));
    assert!(pursuit.plan().is_none());
    match pursuit.state() {
        PursuitState::Jumping(arc) => assert_eq!(arc.end(), Vec2::new(480.0, 48.0)),
        state => panic!("expected a jump, found {state:?}"),
    }
}

fn pump(world: &mut World, pursuit: &mut Pursuit, command: Command, log: &mut Vec<Event>) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);

    while !events.is_empty() {
        log.extend(events.iter().cloned());
        let mut commands = Vec::new();
        pursuit.handle(
            &events,
            query::enemy(world),
            query::player(world),
            &*world,
            &mut commands,
        );

        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}
