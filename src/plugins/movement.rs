//! Continuous motion on a discrete grid.
//!
//! Entities carry a pixel `Position` and `Velocity`. Direction changes are
//! decided against the cell grid: a turn commits only when the entity sits
//! within `align_tolerance` of the cell center on the perpendicular axis, and
//! snaps that coordinate onto the center. The physics step then integrates
//! velocity and resolves each axis against wall cells using the entity's
//! square `Body`.

use bevy::prelude::*;
use micromegas_tracing::prelude::{span_fn, span_scope};

use crate::components::*;
use crate::plugins::maze::MazeGrid;
use crate::plugins::telemetry::GameSet;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, integrate_motion.in_set(GameSet::Physics));
    }
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// Where a point sits relative to the center of the cell containing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub cell: GridPosition,
    pub center: Vec2,
    pub centered_x: bool,
    pub centered_y: bool,
}

impl Alignment {
    pub fn of(grid: &MazeGrid, pos: Vec2, tolerance: f32) -> Self {
        let cell = grid.world_to_grid(pos);
        let center = grid.grid_center(cell);
        let offset = pos - center;
        Self {
            cell,
            center,
            centered_x: offset.x.abs() < tolerance,
            centered_y: offset.y.abs() < tolerance,
        }
    }

    /// Decision point: centered on both axes.
    pub fn at_center(&self) -> bool {
        self.centered_x && self.centered_y
    }

    /// Centered on the axis perpendicular to `dir`, which is what a turn
    /// onto `dir` requires.
    pub fn can_turn_onto(&self, dir: Direction) -> bool {
        if dir.is_horizontal() {
            self.centered_y
        } else if dir.is_vertical() {
            self.centered_x
        } else {
            false
        }
    }
}

/// Snap the coordinate perpendicular to `dir` onto the cell center.
pub fn snap_perpendicular(pos: &mut Vec2, center: Vec2, dir: Direction) {
    if dir.is_horizontal() {
        pos.y = center.y;
    } else if dir.is_vertical() {
        pos.x = center.x;
    }
}

// ---------------------------------------------------------------------------
// Turning and continuation rules
// ---------------------------------------------------------------------------

/// Try to commit `desired` as the new heading. Succeeds when the entity is
/// centered on the perpendicular axis and the neighbour cell in `desired` is
/// walkable; on success the perpendicular coordinate is snapped.
pub fn try_turn(grid: &MazeGrid, pos: &mut Vec2, desired: Direction, tolerance: f32) -> bool {
    if desired.is_none() {
        return false;
    }
    let align = Alignment::of(grid, *pos, tolerance);
    if !align.can_turn_onto(desired) || !grid.is_walkable(align.cell.step(desired)) {
        return false;
    }
    snap_perpendicular(pos, align.center, desired);
    true
}

/// At a decision point facing a wall: stop on the cell center.
///
/// Returns true when the entity was stopped.
pub fn stop_if_blocked(
    grid: &MazeGrid,
    pos: &mut Vec2,
    heading: &mut Direction,
    tolerance: f32,
) -> bool {
    if heading.is_none() {
        return false;
    }
    let align = Alignment::of(grid, *pos, tolerance);
    if align.at_center() && !grid.is_walkable(align.cell.step(*heading)) {
        *pos = align.center;
        *heading = Direction::None;
        return true;
    }
    false
}

/// Move `current` a fraction `factor` of the way toward `target`.
pub fn lerp_velocity(current: Vec2, target: Vec2, factor: f32) -> Vec2 {
    current + (target - current) * factor
}

// ---------------------------------------------------------------------------
// Wall resolution
// ---------------------------------------------------------------------------

/// Inclusive range of cell indices covered by the interval `[min, max]`.
/// An edge lying exactly on a cell boundary does not count as overlap.
fn cell_span(min: f32, max: f32, tile: f32) -> (i32, i32) {
    let first = (min / tile).floor() as i32;
    let last = (max / tile).ceil() as i32 - 1;
    (first, last.max(first))
}

/// Whether a square body of `half` extent centered at `pos` overlaps a wall.
pub fn overlaps_wall(grid: &MazeGrid, pos: Vec2, half: f32) -> bool {
    let (x0, x1) = cell_span(pos.x - half, pos.x + half, grid.tile_size);
    let (y0, y1) = cell_span(pos.y - half, pos.y + half, grid.tile_size);
    (y0..=y1).any(|y| (x0..=x1).any(|x| !grid.is_walkable(GridPosition::new(x, y))))
}

/// Move along one axis by `delta`, stopping flush against a wall. Returns the
/// new coordinate and whether the move was cut short. The result never lies
/// beyond `coord + delta`, nor behind `coord`.
fn resolve_axis(grid: &MazeGrid, pos: Vec2, half: f32, delta: f32, horizontal: bool) -> (f32, bool) {
    let tile = grid.tile_size;
    let coord = if horizontal { pos.x } else { pos.y };
    let moved = coord + delta;
    let candidate = if horizontal {
        Vec2::new(moved, pos.y)
    } else {
        Vec2::new(pos.x, moved)
    };
    if delta == 0.0 || !overlaps_wall(grid, candidate, half) {
        return (moved, false);
    }
    let flush = if delta > 0.0 {
        ((coord + half) / tile).ceil() * tile - half
    } else {
        ((coord - half) / tile).floor() * tile + half
    };
    let flush = flush.clamp(coord.min(moved), coord.max(moved));
    (flush, flush != moved)
}

/// Advance `pos` by `vel * dt`, x first then y. A blocked axis has its
/// velocity component zeroed.
pub fn integrate(grid: &MazeGrid, pos: &mut Vec2, vel: &mut Vec2, half: f32, dt: f32) {
    let (x, blocked_x) = resolve_axis(grid, *pos, half, vel.x * dt, true);
    pos.x = x;
    if blocked_x {
        vel.x = 0.0;
    }
    let (y, blocked_y) = resolve_axis(grid, *pos, half, vel.y * dt, false);
    pos.y = y;
    if blocked_y {
        vel.y = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Physics step for every moving body.
#[span_fn]
fn integrate_motion(
    time: Res<Time>,
    grid: Res<MazeGrid>,
    mut query: Query<(&mut Position, &mut Velocity, &Body)>,
) {
    let dt = time.delta_secs();
    for (mut pos, mut vel, body) in &mut query {
        if vel.0 == Vec2::ZERO {
            continue;
        }
        integrate(&grid, &mut pos.0, &mut vel.0, body.half_extent, dt);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
