use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::tasks::{ComputeTaskPool, TaskPoolBuilder};
use mazechase::resources::{RoundConfig, CONFIG_ENV_VAR};
use micromegas_telemetry_sink::TelemetryGuardBuilder;
use micromegas_telemetry_sink::tracing_interop::TracingCaptureLayer;
use micromegas_tracing::dispatch::{flush_thread_buffer, init_thread_stream, unregister_thread_stream};
use micromegas_tracing::levels::LevelFilter;
use micromegas_tracing::prelude::{error, info};
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

fn main() {
    // Spans need MICROMEGAS_ENABLE_CPU_TRACING=true; logs and metrics
    // always go through.
    let _telemetry_guard = TelemetryGuardBuilder::default()
        .with_install_tracing_capture(false)
        .build()
        .expect("failed to initialize telemetry");

    // Route Bevy's `tracing` logs into Micromegas. Must be installed before
    // the app starts.
    let subscriber = Registry::default().with(TracingCaptureLayer {
        max_level: LevelFilter::Info,
    });
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let config = match RoundConfig::load().and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            eprintln!("mazechase: invalid configuration ({CONFIG_ENV_VAR}): {e}");
            std::process::exit(1);
        }
    };
    info!(
        "mazechase starting: tile {} px, tick {} ms",
        config.tile_size, config.tick_ms
    );

    // Pre-init so TaskPoolPlugin keeps our thread callbacks.
    ComputeTaskPool::get_or_init(|| {
        TaskPoolBuilder::new()
            .on_thread_spawn(|| {
                init_thread_stream();
            })
            .on_thread_destroy(|| {
                flush_thread_buffer();
                unregister_thread_stream();
            })
            .build()
    });

    App::new()
        .insert_resource(config)
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Maze Chase".into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(mazechase::MazeChasePlugin)
        .run();
}
