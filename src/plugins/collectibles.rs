//! Pellets and power-ups: spawning, consumption, and the win condition.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use crate::components::*;
use crate::events::{PelletEaten, PelletOverlap, PowerUpEaten, PowerUpOverlap, RoundEnded};
use crate::plugins::maze::{MazeGrid, RoundEntity};
use crate::plugins::telemetry::GameSet;
use crate::resources::{RoundConfig, RoundOutcome, RoundState, SimClock};

const PELLET_COLOR: Color = Color::srgb(1.0, 0.85, 0.7);
const POWER_UP_COLOR: Color = Color::srgb(1.0, 1.0, 1.0);
/// Half edges of the pickup boxes, as fractions of the tile.
pub const PELLET_BODY_SCALE: f32 = 0.1;
pub const POWER_UP_BODY_SCALE: f32 = 0.2;

pub struct CollectiblePlugin;

impl Plugin for CollectiblePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (eat_pellets, eat_power_ups)
                .chain()
                .in_set(GameSet::Rules),
        );
    }
}

/// Spawn a pellet on every pellet cell and a power-up on every power-up cell.
/// Power-ups sit above the pellet sharing their cell.
pub fn spawn_collectibles(commands: &mut Commands, grid: &MazeGrid) {
    let items = grid
        .pellets
        .iter()
        .map(|c| (*c, false))
        .chain(grid.power_ups.iter().map(|c| (*c, true)));

    for (cell, is_power_up) in items {
        let center = grid.grid_center(cell);
        let world = grid.sim_to_world(center);
        let (scale, color) = if is_power_up {
            (POWER_UP_BODY_SCALE, POWER_UP_COLOR)
        } else {
            (PELLET_BODY_SCALE, PELLET_COLOR)
        };
        let body = Body::scaled(grid.tile_size, scale);
        let mut entity = commands.spawn((
            Collectible::default(),
            cell,
            Position(center),
            body,
            RoundEntity,
            Sprite::from_color(color, body.size()),
            Transform::from_xyz(world.x, world.y, if is_power_up { 2.0 } else { 1.0 }),
        ));
        if is_power_up {
            entity.insert(PowerUp);
        } else {
            entity.insert(Pellet);
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Consume overlapped pellets. Clearing the last one wins the round.
#[span_fn]
pub fn eat_pellets(
    mut overlaps: MessageReader<PelletOverlap>,
    mut pellets: Query<&mut Collectible, With<Pellet>>,
    mut round: ResMut<RoundState>,
    config: Res<RoundConfig>,
    mut commands: Commands,
) {
    for overlap in overlaps.read() {
        if !round.in_progress() {
            break;
        }
        let Ok(mut pellet) = pellets.get_mut(overlap.pellet) else {
            continue;
        };
        if pellet.consumed {
            continue;
        }
        pellet.consumed = true;
        round.score += config.pellet_score;
        round.pellets_remaining = round.pellets_remaining.saturating_sub(1);
        commands.trigger(PelletEaten { score: round.score });

        if round.pellets_remaining == 0 {
            round.outcome = RoundOutcome::Won;
            info!("all pellets eaten, final score {}", round.score);
            commands.trigger(RoundEnded {
                outcome: RoundOutcome::Won,
                final_score: round.score,
            });
        }
    }
}

/// Consume overlapped power-ups and start or extend invincibility.
#[span_fn]
pub fn eat_power_ups(
    mut overlaps: MessageReader<PowerUpOverlap>,
    mut power_ups: Query<&mut Collectible, With<PowerUp>>,
    mut player_query: Query<&mut Player>,
    round: Res<RoundState>,
    clock: Res<SimClock>,
    config: Res<RoundConfig>,
    mut commands: Commands,
) {
    for overlap in overlaps.read() {
        if !round.in_progress() {
            break;
        }
        let Ok(mut power_up) = power_ups.get_mut(overlap.power_up) else {
            continue;
        };
        if power_up.consumed {
            continue;
        }
        let Ok(mut player) = player_query.single_mut() else {
            return;
        };
        power_up.consumed = true;
        player.grant_invincibility(clock.now_ms, config.invincibility_ms);
        info!("invincible until {} ms", player.invincible_until_ms);
        commands.trigger(PowerUpEaten {
            invincible_until_ms: player.invincible_until_ms,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
