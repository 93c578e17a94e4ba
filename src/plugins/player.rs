//! Player spawning, keyboard input, buffered turning, and respawn.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use crate::components::*;
use crate::plugins::maze::{MazeGrid, RoundEntity};
use crate::plugins::movement::{stop_if_blocked, try_turn};
use crate::plugins::telemetry::GameSet;
use crate::resources::{HeldDirections, RoundConfig, SimClock};

const PLAYER_COLOR: Color = Color::srgb(1.0, 0.9, 0.0);
/// Half edge of the player's box, as a fraction of the tile.
pub const PLAYER_BODY_SCALE: f32 = 0.4;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HeldDirections>();
        app.add_systems(FixedUpdate, player_respawn.in_set(GameSet::Timers));
        app.add_systems(FixedUpdate, read_keyboard.in_set(GameSet::Input));
        app.add_systems(FixedUpdate, player_control.in_set(GameSet::Player));
    }
}

/// Spawn the player at the maze's spawn cell, idle.
pub fn spawn_player(commands: &mut Commands, grid: &MazeGrid) -> Entity {
    let spawn = grid.player_spawn;
    let center = grid.grid_center(spawn);
    let world = grid.sim_to_world(center);
    let body = Body::scaled(grid.tile_size, PLAYER_BODY_SCALE);
    commands
        .spawn((
            Player::default(),
            Position(center),
            Velocity::default(),
            Heading::default(),
            BufferedDirection::default(),
            body,
            SpawnPosition(spawn),
            RoundEntity,
            Sprite::from_color(PLAYER_COLOR, body.size()),
            Transform::from_xyz(world.x, world.y, 10.0),
        ))
        .id()
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// One controller tick. Returns the new velocity.
///
/// The first held direction overwrites the buffer; with nothing held the
/// buffer is left alone, so a turn requested early fires at the next cell
/// center where it is legal.
pub fn player_step(
    grid: &MazeGrid,
    pos: &mut Vec2,
    heading: &mut Direction,
    buffer: &mut Direction,
    held: Option<Direction>,
    tolerance: f32,
    speed: f32,
) -> Vec2 {
    if let Some(dir) = held {
        *buffer = dir;
    }
    if try_turn(grid, pos, *buffer, tolerance) {
        *heading = *buffer;
        *buffer = Direction::None;
    }
    stop_if_blocked(grid, pos, heading, tolerance);
    heading.vector() * speed
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Sample arrows and WASD into `HeldDirections`. Without a keyboard resource
/// (headless) the held state is left as set by the caller.
#[span_fn]
fn read_keyboard(keyboard: Option<Res<ButtonInput<KeyCode>>>, mut held: ResMut<HeldDirections>) {
    let Some(keyboard) = keyboard else {
        return;
    };
    *held = HeldDirections {
        left: keyboard.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]),
        right: keyboard.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]),
        up: keyboard.any_pressed([KeyCode::ArrowUp, KeyCode::KeyW]),
        down: keyboard.any_pressed([KeyCode::ArrowDown, KeyCode::KeyS]),
    };
}

#[allow(clippy::type_complexity)]
#[span_fn]
fn player_control(
    grid: Res<MazeGrid>,
    config: Res<RoundConfig>,
    held: Res<HeldDirections>,
    mut query: Query<(
        &Player,
        &mut Position,
        &mut Velocity,
        &mut Heading,
        &mut BufferedDirection,
    )>,
) {
    let Ok((player, mut pos, mut vel, mut heading, mut buffer)) = query.single_mut() else {
        return;
    };
    if player.is_respawning() {
        return;
    }
    vel.0 = player_step(
        &grid,
        &mut pos.0,
        &mut heading.0,
        &mut buffer.0,
        held.first_pressed(),
        config.align_tolerance,
        config.player_speed,
    );
}

/// Bring a caught player back at its spawn cell once the delay elapses.
#[span_fn]
fn player_respawn(
    grid: Res<MazeGrid>,
    clock: Res<SimClock>,
    mut query: Query<(
        &mut Player,
        &SpawnPosition,
        &mut Position,
        &mut Velocity,
        &mut Heading,
        &mut BufferedDirection,
    )>,
) {
    for (mut player, spawn, mut pos, mut vel, mut heading, mut buffer) in &mut query {
        let Some(deadline) = player.respawn_at_ms else {
            continue;
        };
        if !clock.reached(deadline) {
            continue;
        }
        player.respawn_at_ms = None;
        pos.0 = grid.grid_center(spawn.0);
        vel.0 = Vec2::ZERO;
        heading.0 = Direction::None;
        buffer.0 = Direction::None;
        info!("player respawned at ({}, {})", spawn.0.x, spawn.0.y);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
