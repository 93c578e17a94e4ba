use bevy::prelude::*;
use micromegas_tracing::prelude::{span_fn, span_scope};

use super::maze::MazeGrid;
use super::telemetry::GameSet;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera);
        app.add_systems(Update, fit_camera_to_maze.in_set(GameSet::Presentation));
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Orthographic scale that fits the maze plus one tile of margin per side.
pub fn fit_scale(grid: &MazeGrid, viewport: Vec2) -> f32 {
    let padded = grid.pixel_size() + Vec2::splat(grid.tile_size * 2.0);
    let scale = padded / viewport;
    scale.x.max(scale.y)
}

#[span_fn]
fn fit_camera_to_maze(
    grid: Option<Res<MazeGrid>>,
    windows: Query<&Window>,
    mut cameras: Query<&mut Projection, With<Camera2d>>,
) {
    let Some(grid) = grid else { return };
    let Ok(window) = windows.single() else {
        return;
    };
    let Ok(mut projection) = cameras.single_mut() else {
        return;
    };
    if let Projection::Orthographic(ref mut ortho) = *projection {
        ortho.scale = fit_scale(&grid, window.size());
    }
}
