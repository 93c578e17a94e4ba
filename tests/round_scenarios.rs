//! Headless rounds driven through the full `MazeChasePlugin`.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use mazechase::MazeChasePlugin;
use mazechase::app_state::AppState;
use mazechase::components::*;
use mazechase::plugins::maze::MazeGrid;
use mazechase::plugins::movement::overlaps_wall;
use mazechase::plugins::round::RoundSummary;
use mazechase::resources::{HeldDirections, RoundConfig, RoundOutcome, RoundState};

fn setup_app(config: RoundConfig) -> App {
    let tick_ms = config.tick_ms;
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.insert_resource(config);
    app.add_plugins(MazeChasePlugin);
    app.finish();
    app.cleanup();
    mazechase::step_ticks_manually(&mut app, tick_ms);
    app
}

fn config_with_maze(maze: &str) -> RoundConfig {
    RoundConfig {
        maze: maze.to_string(),
        round_end_delay_ms: 160,
        ..RoundConfig::default()
    }
}

fn hold(app: &mut App, dir: Direction) {
    *app.world_mut().resource_mut::<HeldDirections>() = HeldDirections::only(dir);
}

fn state(app: &App) -> AppState {
    *app.world().resource::<State<AppState>>().get()
}

fn round(app: &App) -> &RoundState {
    app.world().resource::<RoundState>()
}

fn player(app: &mut App) -> (Entity, Player, Vec2, Direction) {
    let (entity, player, pos, heading) = app
        .world_mut()
        .query::<(Entity, &Player, &Position, &Heading)>()
        .single(app.world())
        .unwrap();
    (entity, *player, pos.0, heading.0)
}

fn ghost_entity(app: &mut App) -> Entity {
    app.world_mut()
        .query_filtered::<Entity, With<Ghost>>()
        .iter(app.world())
        .next()
        .unwrap()
}

/// Update until `done` holds, failing after `limit` ticks.
fn run_until(app: &mut App, limit: usize, mut done: impl FnMut(&mut App) -> bool) {
    for _ in 0..limit {
        if done(app) {
            return;
        }
        app.update();
    }
    assert!(done(app), "condition not reached within {limit} ticks");
}

#[test]
fn bodies_never_enter_walls() {
    let mut app = setup_app(RoundConfig::default());
    let grid = app.world().resource::<MazeGrid>().clone();
    let plan = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
        Direction::Down,
        Direction::Right,
    ];

    for tick in 0..3_000 {
        if !round(&app).in_progress() {
            break;
        }
        hold(&mut app, plan[(tick / 45) % plan.len()]);
        app.update();

        let mut bodies = app
            .world_mut()
            .query_filtered::<(&Position, &Body), With<Velocity>>();
        for (pos, body) in bodies.iter(app.world()) {
            assert!(
                grid.is_walkable(grid.world_to_grid(pos.0)),
                "center in a wall at {:?} on tick {tick}",
                pos.0
            );
            assert!(
                !overlaps_wall(&grid, pos.0, body.half_extent),
                "body overlaps a wall at {:?} on tick {tick}",
                pos.0
            );
        }
    }
}

#[test]
fn player_stops_idle_at_start() {
    let mut app = setup_app(RoundConfig::default());
    let (_, _, start, _) = player(&mut app);
    for _ in 0..30 {
        app.update();
    }
    let (_, _, pos, heading) = player(&mut app);
    assert_eq!(pos, start);
    assert_eq!(heading, Direction::None);
    assert_eq!(round(&app).score, 0);
}

#[test]
fn smaller_tiles_shrink_the_bodies() {
    let config = RoundConfig {
        tile_size: 30.0,
        ..config_with_maze("######\n#P...#\n######")
    };
    config.validate().unwrap();
    let mut app = setup_app(config);
    let (_, _, start, _) = player(&mut app);
    hold(&mut app, Direction::Right);

    app.update();
    let (_, _, pos, heading) = player(&mut app);
    assert_eq!(heading, Direction::Right);
    assert!(pos.x > start.x && pos.x - start.x < 2.5, "moved {}", pos.x - start.x);

    run_until(&mut app, 200, |app| round(app).outcome == RoundOutcome::Won);
    assert_eq!(round(&app).score, 30);
}

#[test]
fn clearing_pellets_wins_and_restarts() {
    let mut app = setup_app(config_with_maze("#####\n#P..#\n#####"));
    hold(&mut app, Direction::Right);

    run_until(&mut app, 200, |app| round(app).outcome == RoundOutcome::Won);
    assert_eq!(round(&app).score, 20);
    assert_eq!(round(&app).pellets_remaining, 0);

    // The board freezes while the result is shown.
    let (_, _, frozen, _) = player(&mut app);
    app.update();
    assert_eq!(player(&mut app).2, frozen);

    run_until(&mut app, 100, |app| state(app) == AppState::GameOver);
    assert_eq!(
        *app.world().resource::<RoundSummary>(),
        RoundSummary {
            outcome: RoundOutcome::Won,
            final_score: 20,
        }
    );
    assert!(!app.world().contains_resource::<RoundState>());

    let mut input = ButtonInput::<KeyCode>::default();
    input.press(KeyCode::Enter);
    app.insert_resource(input);
    run_until(&mut app, 10, |app| state(app) == AppState::InGame);
    app.world_mut().remove_resource::<ButtonInput<KeyCode>>();
    app.update();

    let fresh = round(&app);
    assert_eq!(fresh.score, 0);
    assert_eq!(fresh.lives, 3);
    assert_eq!(fresh.pellets_remaining, 2);
    assert!(fresh.in_progress());
}

#[test]
fn caught_player_respawns_at_spawn() {
    let mut app = setup_app(config_with_maze("#####\n#P.G#\n#####"));
    let grid = app.world().resource::<MazeGrid>().clone();

    run_until(&mut app, 200, |app| round(app).lives < 3);
    assert_eq!(round(&app).lives, 2);
    let (entity, caught, _, _) = player(&mut app);
    assert!(caught.is_respawning());

    // Keep the ghost off the spawn cell so the respawn is observable.
    let ghost = ghost_entity(&mut app);
    app.world_mut().entity_mut(ghost).get_mut::<Ghost>().unwrap().active = false;

    run_until(&mut app, 100, |app| !player(app).1.is_respawning());
    let e = app.world().entity(entity);
    assert_eq!(
        e.get::<Position>().unwrap().0,
        grid.grid_center(grid.player_spawn)
    );
    assert_eq!(e.get::<Heading>().unwrap().0, Direction::None);
    assert_eq!(round(&app).lives, 2);
}

#[test]
fn last_life_ends_in_game_over() {
    let config = RoundConfig {
        starting_lives: 1,
        ..config_with_maze("#####\n#P.G#\n#####")
    };
    let mut app = setup_app(config);

    run_until(&mut app, 200, |app| round(app).outcome == RoundOutcome::Lost);
    assert_eq!(round(&app).lives, 0);

    run_until(&mut app, 100, |app| state(app) == AppState::GameOver);
    let summary = *app.world().resource::<RoundSummary>();
    assert_eq!(summary.outcome, RoundOutcome::Lost);
}

#[test]
fn power_up_lets_player_eat_ghost() {
    let mut app = setup_app(config_with_maze("#######\n#P.o.G#\n#######"));
    let ghost = ghost_entity(&mut app);
    hold(&mut app, Direction::Right);

    run_until(&mut app, 300, |app| {
        !app.world().entity(ghost).get::<Ghost>().unwrap().active
    });

    let (_, p, _, _) = player(&mut app);
    assert!(!p.is_respawning());
    let r = round(&app);
    assert_eq!(r.lives, 3);
    // The power-up cell carries a pellet of its own.
    let eaten = 3 - r.pellets_remaining as u64;
    assert!(eaten >= 2);
    assert_eq!(r.score, eaten * 10 + 100);
}
