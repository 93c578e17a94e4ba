//! Overlap notifications raised by the collision host, and gameplay events
//! triggered by the round rules for presentation and telemetry observers.

use bevy::prelude::*;

use crate::resources::RoundOutcome;

// ---------------------------------------------------------------------------
// Overlap messages (host -> rules)
// ---------------------------------------------------------------------------

/// The player's body overlaps a pellet.
#[derive(Message, Debug, Clone, Copy)]
pub struct PelletOverlap {
    pub pellet: Entity,
}

/// The player's body overlaps a power-up.
#[derive(Message, Debug, Clone, Copy)]
pub struct PowerUpOverlap {
    pub power_up: Entity,
}

/// The player's body overlaps an active ghost.
#[derive(Message, Debug, Clone, Copy)]
pub struct GhostOverlap {
    pub ghost: Entity,
}

// ---------------------------------------------------------------------------
// Gameplay events (rules -> observers)
// ---------------------------------------------------------------------------

#[derive(Event, Debug, Clone, Copy)]
pub struct PelletEaten {
    pub score: u64,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PowerUpEaten {
    pub invincible_until_ms: u64,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct GhostDefeated {
    pub ghost: Entity,
    pub score: u64,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerCaught {
    pub lives: u32,
}

/// Fired exactly once per round, when the outcome leaves `InProgress`.
#[derive(Event, Debug, Clone, Copy)]
pub struct RoundEnded {
    pub outcome: RoundOutcome,
    pub final_score: u64,
}
