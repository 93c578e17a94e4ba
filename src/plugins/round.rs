//! Round lifecycle: building a round on entering `InGame`, the simulation
//! clock, the end-of-round delay, and teardown.

use std::time::Duration;

use bevy::prelude::*;
use micromegas_tracing::prelude::{error, info, span_fn, span_scope};

use crate::app_state::AppState;
use crate::events::RoundEnded;
use crate::plugins::collectibles::spawn_collectibles;
use crate::plugins::ghosts::spawn_ghosts;
use crate::plugins::maze::{spawn_walls, MazeGrid, RoundEntity};
use crate::plugins::player::spawn_player;
use crate::plugins::telemetry::GameSet;
use crate::resources::{RoundConfig, RoundOutcome, RoundState, SimClock};

pub struct RoundPlugin;

impl Plugin for RoundPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), start_round);
        app.add_systems(OnExit(AppState::InGame), teardown_round);
        app.add_systems(
            FixedUpdate,
            (advance_clock, round_over_countdown)
                .chain()
                .in_set(GameSet::Clock)
                .run_if(in_state(AppState::InGame)),
        );
        app.add_observer(on_round_ended);
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Deadline after which a decided round hands over to the game-over screen.
#[derive(Resource, Debug, Clone, Copy)]
pub struct RoundOverAt(pub u64);

/// Result of the last finished round, kept for the game-over screen.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub outcome: RoundOutcome,
    pub final_score: u64,
}

/// Run condition: a round exists and has not been decided.
pub fn round_in_progress(round: Option<Res<RoundState>>) -> bool {
    round.is_some_and(|r| r.in_progress())
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Parse the configured maze and spawn everything the round owns, and set the
/// fixed timestep to one tick. A maze that fails to parse is logged and no
/// round starts.
fn start_round(
    mut commands: Commands,
    config: Res<RoundConfig>,
    mut fixed_time: ResMut<Time<Fixed>>,
) {
    span_scope!("start_round");
    let grid = match MazeGrid::parse(&config.maze, config.tile_size) {
        Ok(grid) => grid,
        Err(e) => {
            error!("cannot start round: {e}");
            return;
        }
    };

    spawn_walls(&mut commands, &grid);
    spawn_collectibles(&mut commands, &grid);
    spawn_player(&mut commands, &grid);
    spawn_ghosts(&mut commands, &grid);

    commands.insert_resource(RoundState::new(config.starting_lives, grid.pellets.len()));
    fixed_time.set_timestep(Duration::from_millis(config.tick_ms.max(1)));
    commands.insert_resource(SimClock::new(config.tick_ms));
    commands.remove_resource::<RoundSummary>();
    info!(
        "round started: {} lives, {} pellets",
        config.starting_lives,
        grid.pellets.len()
    );
    commands.insert_resource(grid);
}

#[span_fn]
fn teardown_round(mut commands: Commands, query: Query<Entity, With<RoundEntity>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<MazeGrid>();
    commands.remove_resource::<RoundState>();
    commands.remove_resource::<SimClock>();
    commands.remove_resource::<RoundOverAt>();
}

/// One tick per fixed step, so the clock tracks virtual time.
fn advance_clock(clock: Option<ResMut<SimClock>>) {
    if let Some(mut clock) = clock {
        clock.advance();
    }
}

fn round_over_countdown(
    clock: Option<Res<SimClock>>,
    deadline: Option<Res<RoundOverAt>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let (Some(clock), Some(deadline)) = (clock, deadline) else {
        return;
    };
    if clock.reached(deadline.0) {
        next_state.set(AppState::GameOver);
    }
}

fn on_round_ended(
    event: On<RoundEnded>,
    mut commands: Commands,
    clock: Option<Res<SimClock>>,
    config: Res<RoundConfig>,
) {
    let now = clock.map(|c| c.now_ms).unwrap_or_default();
    info!(
        "round ended: {:?} with score {}",
        event.outcome, event.final_score
    );
    commands.insert_resource(RoundSummary {
        outcome: event.outcome,
        final_score: event.final_score,
    });
    commands.insert_resource(RoundOverAt(now + config.round_end_delay_ms));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
