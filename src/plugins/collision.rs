//! Overlap detection between the player and the round's other bodies.
//!
//! Raises `PelletOverlap`, `PowerUpOverlap` and `GhostOverlap` messages for
//! the rules to consume. Only enabled participants collide: a respawning
//! player, consumed collectibles and defeated ghosts are skipped.

use bevy::prelude::*;
use micromegas_tracing::prelude::{span_fn, span_scope};

use crate::components::*;
use crate::events::{GhostOverlap, PelletOverlap, PowerUpOverlap};
use crate::plugins::telemetry::GameSet;

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PelletOverlap>();
        app.add_message::<PowerUpOverlap>();
        app.add_message::<GhostOverlap>();
        app.add_systems(FixedUpdate, detect_overlaps.in_set(GameSet::Overlap));
    }
}

/// Strict AABB overlap of two square bodies. Touching edges do not overlap.
pub fn bodies_overlap(a: Vec2, a_body: &Body, b: Vec2, b_body: &Body) -> bool {
    let reach = a_body.half_extent + b_body.half_extent;
    let d = (a - b).abs();
    d.x < reach && d.y < reach
}

#[allow(clippy::type_complexity)]
#[span_fn]
fn detect_overlaps(
    player_query: Query<(&Player, &Position, &Body)>,
    pellet_query: Query<(Entity, &Position, &Body, &Collectible), With<Pellet>>,
    power_up_query: Query<(Entity, &Position, &Body, &Collectible), With<PowerUp>>,
    ghost_query: Query<(Entity, &Ghost, &Position, &Body)>,
    mut pellets: MessageWriter<PelletOverlap>,
    mut power_ups: MessageWriter<PowerUpOverlap>,
    mut ghosts: MessageWriter<GhostOverlap>,
) {
    let Ok((player, player_pos, player_body)) = player_query.single() else {
        return;
    };
    if player.is_respawning() {
        return;
    }

    for (pellet, pos, body, item) in &pellet_query {
        if !item.consumed && bodies_overlap(player_pos.0, player_body, pos.0, body) {
            pellets.write(PelletOverlap { pellet });
        }
    }
    for (power_up, pos, body, item) in &power_up_query {
        if !item.consumed && bodies_overlap(player_pos.0, player_body, pos.0, body) {
            power_ups.write(PowerUpOverlap { power_up });
        }
    }
    for (ghost, state, pos, body) in &ghost_query {
        if state.active && bodies_overlap(player_pos.0, player_body, pos.0, body) {
            ghosts.write(GhostOverlap { ghost });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
