pub mod ai;
pub mod app_state;
pub mod components;
pub mod events;
pub mod plugins;
pub mod resources;

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use app_state::AppState;
use plugins::camera::CameraPlugin;
use plugins::collectibles::CollectiblePlugin;
use plugins::collision::CollisionPlugin;
use plugins::combat::CombatPlugin;
use plugins::game_over::GameOverPlugin;
use plugins::ghosts::GhostPlugin;
use plugins::hud::HudPlugin;
use plugins::movement::MovementPlugin;
use plugins::player::PlayerPlugin;
use plugins::presentation::PresentationPlugin;
use plugins::round::{round_in_progress, RoundPlugin};
use plugins::telemetry::{GameSet, TelemetryPlugin};
use resources::RoundConfig;

/// The whole game. Insert a validated `RoundConfig` first to override the
/// defaults.
pub struct MazeChasePlugin;

impl Plugin for MazeChasePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>();
        app.init_resource::<RoundConfig>();

        order_game_sets(app);
        // Simulation phases stop as soon as the round is decided; the clock
        // keeps running so the round-over delay can elapse.
        app.configure_sets(
            FixedUpdate,
            (
                GameSet::Timers,
                GameSet::Input,
                GameSet::Player,
                GameSet::Ghosts,
                GameSet::Physics,
                GameSet::Overlap,
                GameSet::Rules,
            )
                .run_if(in_state(AppState::InGame).and(round_in_progress)),
        );
        app.configure_sets(FixedUpdate, GameSet::Clock.run_if(in_state(AppState::InGame)));
        app.configure_sets(
            Update,
            GameSet::Presentation.run_if(in_state(AppState::InGame)),
        );

        app.add_plugins(RoundPlugin);
        app.add_plugins(CameraPlugin);
        app.add_plugins(MovementPlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(GhostPlugin);
        app.add_plugins(CollisionPlugin);
        app.add_plugins(CollectiblePlugin);
        app.add_plugins(CombatPlugin);
        app.add_plugins(PresentationPlugin);
        app.add_plugins(HudPlugin);
        app.add_plugins(GameOverPlugin);
        app.add_plugins(TelemetryPlugin);
    }
}

/// Run the tick phases in `GameSet` order. The simulation phases run on the
/// fixed timestep, presentation once per frame.
pub fn order_game_sets(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (
            GameSet::Clock,
            GameSet::Timers,
            GameSet::Input,
            GameSet::Player,
            GameSet::Ghosts,
            GameSet::Physics,
            GameSet::Overlap,
            GameSet::Rules,
        )
            .chain(),
    );
}

/// Drive time by hand for headless runs: after the priming update made here,
/// every `App::update` advances virtual time by exactly one tick and runs one
/// fixed step.
pub fn step_ticks_manually(app: &mut App, tick_ms: u64) {
    let tick = Duration::from_millis(tick_ms);
    app.insert_resource(Time::<Fixed>::from_duration(tick));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(tick));
    // The first update only records the start instant.
    app.update();
}
