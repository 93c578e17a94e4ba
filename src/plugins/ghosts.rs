//! Ghost spawning, pursuit steering, and re-activation after defeat.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use crate::ai::pursuit::choose_direction;
use crate::components::*;
use crate::plugins::maze::{MazeGrid, RoundEntity};
use crate::plugins::movement::{lerp_velocity, snap_perpendicular, Alignment};
use crate::plugins::telemetry::GameSet;
use crate::resources::{RoundConfig, SimClock};

/// Half edge of a ghost's box, as a fraction of the tile.
pub const GHOST_BODY_SCALE: f32 = 0.4;

pub struct GhostPlugin;

impl Plugin for GhostPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, ghost_reactivation.in_set(GameSet::Timers));
        app.add_systems(FixedUpdate, ghost_pursuit.in_set(GameSet::Ghosts));
    }
}

/// Spawn one ghost per spawn cell, colors cycling. Ghosts start idle and
/// pick their first direction on the first tick.
pub fn spawn_ghosts(commands: &mut Commands, grid: &MazeGrid) -> Vec<Entity> {
    grid.ghost_spawns
        .iter()
        .enumerate()
        .map(|(i, &cell)| {
            let color = GhostColor::for_index(i);
            let center = grid.grid_center(cell);
            let world = grid.sim_to_world(center);
            let body = Body::scaled(grid.tile_size, GHOST_BODY_SCALE);
            commands
                .spawn((
                    Ghost::new(color),
                    Position(center),
                    Velocity::default(),
                    Heading::default(),
                    DecisionCell::default(),
                    body,
                    SpawnPosition(cell),
                    RoundEntity,
                    Sprite::from_color(color.color(), body.size()),
                    Transform::from_xyz(world.x, world.y, 9.0),
                ))
                .id()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Steering
// ---------------------------------------------------------------------------

/// Steering parameters shared by every ghost.
#[derive(Debug, Clone, Copy)]
pub struct GhostTuning {
    pub tolerance: f32,
    pub speed: f32,
    pub lerp: f32,
}

impl From<&RoundConfig> for GhostTuning {
    fn from(config: &RoundConfig) -> Self {
        Self {
            tolerance: config.align_tolerance,
            speed: config.ghost_speed,
            lerp: config.ghost_velocity_lerp,
        }
    }
}

/// One steering tick for a ghost.
///
/// At a decision point in a cell not yet decided, run the pursuit policy and
/// lock the ghost onto the chosen corridor: the perpendicular coordinate snaps
/// and the perpendicular velocity component is dropped. Velocity then eases
/// toward the heading at `tuning.speed`.
pub fn ghost_step(
    grid: &MazeGrid,
    pos: &mut Vec2,
    vel: &mut Vec2,
    heading: &mut Direction,
    decided: &mut Option<GridPosition>,
    target: GridPosition,
    tuning: GhostTuning,
) {
    let align = Alignment::of(grid, *pos, tuning.tolerance);
    if align.at_center() && *decided != Some(align.cell) {
        let choice = choose_direction(grid, align.cell, *heading, target);
        *decided = Some(align.cell);
        *heading = choice;
        snap_perpendicular(pos, align.center, choice);
        if choice.is_horizontal() {
            vel.y = 0.0;
        } else if choice.is_vertical() {
            vel.x = 0.0;
        } else {
            *vel = Vec2::ZERO;
        }
    }
    *vel = lerp_velocity(*vel, heading.vector() * tuning.speed, tuning.lerp);
}

/// The cell ghosts chase: the player's cell, or its spawn cell while the
/// player is out waiting to respawn.
pub fn pursuit_target(
    grid: &MazeGrid,
    player: &Player,
    pos: Vec2,
    spawn: Option<&SpawnPosition>,
) -> GridPosition {
    match spawn {
        Some(spawn) if player.is_respawning() => spawn.0,
        _ => grid.world_to_grid(pos),
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

#[allow(clippy::type_complexity)]
#[span_fn]
fn ghost_pursuit(
    grid: Res<MazeGrid>,
    config: Res<RoundConfig>,
    player_query: Query<(&Player, &Position, Option<&SpawnPosition>), Without<Ghost>>,
    mut ghost_query: Query<
        (
            &Ghost,
            &mut Position,
            &mut Velocity,
            &mut Heading,
            &mut DecisionCell,
        ),
        Without<Player>,
    >,
) {
    let Ok((player, player_pos, spawn)) = player_query.single() else {
        return;
    };
    // Sampled once so every ghost chases the same cell this tick.
    let target = pursuit_target(&grid, player, player_pos.0, spawn);
    let tuning = GhostTuning::from(config.as_ref());

    for (ghost, mut pos, mut vel, mut heading, mut decided) in &mut ghost_query {
        if !ghost.active {
            continue;
        }
        ghost_step(
            &grid,
            &mut pos.0,
            &mut vel.0,
            &mut heading.0,
            &mut decided.0,
            target,
            tuning,
        );
    }
}

/// Return defeated ghosts to play at their spawn cell once their delay
/// elapses. Ghosts defeated with no delay configured stay out.
#[span_fn]
fn ghost_reactivation(
    grid: Res<MazeGrid>,
    clock: Res<SimClock>,
    mut query: Query<(
        &mut Ghost,
        &SpawnPosition,
        &mut Position,
        &mut Velocity,
        &mut Heading,
        &mut DecisionCell,
    )>,
) {
    for (mut ghost, spawn, mut pos, mut vel, mut heading, mut decided) in &mut query {
        if ghost.active {
            continue;
        }
        let Some(deadline) = ghost.respawn_at_ms else {
            continue;
        };
        if !clock.reached(deadline) {
            continue;
        }
        ghost.active = true;
        ghost.respawn_at_ms = None;
        pos.0 = grid.grid_center(spawn.0);
        vel.0 = Vec2::ZERO;
        heading.0 = Direction::None;
        decided.0 = None;
        info!("{:?} ghost back in play", ghost.color);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
