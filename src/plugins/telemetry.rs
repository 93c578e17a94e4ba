//! Frame-level telemetry and the system sets that order one simulation tick.

use bevy::prelude::*;
use micromegas_tracing::prelude::{fmetric, imetric, span_scope};

use crate::resources::{RoundState, SimClock};

/// Ordered phases of a tick. Chained in `MazeChasePlugin`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    Clock,
    Timers,
    Input,
    Player,
    Ghosts,
    Physics,
    Overlap,
    Rules,
    Presentation,
}

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Last, (frame_telemetry, round_telemetry));
    }
}

fn frame_telemetry(time: Res<Time>) {
    span_scope!("frame");
    let dt_ms = time.delta_secs_f64() * 1000.0;
    fmetric!("frame_time_ms", "ms", dt_ms);
}

/// Score and lives gauges, emitted only on change.
fn round_telemetry(round: Option<Res<RoundState>>, clock: Option<Res<SimClock>>) {
    let (Some(round), Some(clock)) = (round, clock) else {
        return;
    };
    if !round.is_changed() {
        return;
    }
    imetric!("score", "points", round.score);
    imetric!("lives", "count", round.lives as u64);
    imetric!("pellets_remaining", "count", round.pellets_remaining as u64);
    imetric!("sim_time", "ms", clock.now_ms);
}
