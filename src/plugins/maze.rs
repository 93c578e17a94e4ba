//! Maze layout parsing, validation, and grid queries.
//!
//! The layout is ASCII text, one character per cell:
//! `#` wall, `.` pellet, ` ` open floor, `o` power-up, `P` player spawn,
//! `G` ghost spawn. Simulation coordinates are pixels with the origin at the
//! top-left corner of the grid and y growing downward.

use std::collections::HashSet;

use bevy::prelude::*;
use micromegas_tracing::prelude::info;
use pathfinding::prelude::bfs_reach;
use thiserror::Error;

use crate::components::{Direction, GridPosition, Wall};

/// Built-in 20x15 layout.
pub const CLASSIC_MAZE: &str = include_str!("../../assets/maps/classic.txt");

const WALL_COLOR: Color = Color::srgb(0.1, 0.1, 0.55);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze layout is empty")]
    Empty,
    #[error("unknown tile character {ch:?} at ({x}, {y})")]
    UnknownTile { ch: char, x: usize, y: usize },
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("no player spawn ('P') in maze")]
    MissingPlayerSpawn,
    #[error("second player spawn at ({x}, {y})")]
    MultiplePlayerSpawns { x: i32, y: i32 },
    #[error("border cell ({x}, {y}) is not a wall")]
    OpenBorder { x: i32, y: i32 },
    #[error("open cell ({x}, {y}) has no walkable neighbour")]
    IsolatedCell { x: i32, y: i32 },
    #[error("open cell ({x}, {y}) is unreachable from the player spawn")]
    Unreachable { x: i32, y: i32 },
    #[error("maze has no pellets")]
    NoPellets,
}

// ---------------------------------------------------------------------------
// Maze grid resource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Open,
}

/// Immutable walkability grid for one round, plus the spawn and collectible
/// cells read from the layout.
#[derive(Resource, Debug, Clone)]
pub struct MazeGrid {
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    cells: Vec<Cell>,
    pub player_spawn: GridPosition,
    pub ghost_spawns: Vec<GridPosition>,
    pub pellets: Vec<GridPosition>,
    pub power_ups: Vec<GridPosition>,
}

impl MazeGrid {
    /// Parse and validate a layout.
    pub fn parse(text: &str, tile_size: f32) -> Result<Self, MazeError> {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let Some(first) = lines.first() else {
            return Err(MazeError::Empty);
        };

        let width = first.chars().count();
        let height = lines.len();
        let mut cells = Vec::with_capacity(width * height);
        let mut player_spawn = None;
        let mut ghost_spawns = Vec::new();
        let mut pellets = Vec::new();
        let mut power_ups = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(MazeError::RaggedRows {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, ch) in line.chars().enumerate() {
                let pos = GridPosition::new(x as i32, y as i32);
                let cell = match ch {
                    '#' => Cell::Wall,
                    ' ' => Cell::Open,
                    '.' => {
                        pellets.push(pos);
                        Cell::Open
                    }
                    // A power-up cell also carries a pellet.
                    'o' => {
                        pellets.push(pos);
                        power_ups.push(pos);
                        Cell::Open
                    }
                    'P' => {
                        if player_spawn.replace(pos).is_some() {
                            return Err(MazeError::MultiplePlayerSpawns { x: pos.x, y: pos.y });
                        }
                        Cell::Open
                    }
                    'G' => {
                        ghost_spawns.push(pos);
                        Cell::Open
                    }
                    _ => return Err(MazeError::UnknownTile { ch, x, y }),
                };
                cells.push(cell);
            }
        }

        let player_spawn = player_spawn.ok_or(MazeError::MissingPlayerSpawn)?;
        let grid = MazeGrid {
            width,
            height,
            tile_size,
            cells,
            player_spawn,
            ghost_spawns,
            pellets,
            power_ups,
        };
        grid.validate()?;
        Ok(grid)
    }

    fn validate(&self) -> Result<(), MazeError> {
        for pos in self.positions() {
            let on_border = pos.x == 0
                || pos.y == 0
                || pos.x == self.width as i32 - 1
                || pos.y == self.height as i32 - 1;
            if on_border && self.is_walkable(pos) {
                return Err(MazeError::OpenBorder { x: pos.x, y: pos.y });
            }
        }

        for pos in self.open_cells() {
            if self.neighbours(pos).next().is_none() {
                return Err(MazeError::IsolatedCell { x: pos.x, y: pos.y });
            }
        }

        let reachable: HashSet<GridPosition> =
            bfs_reach(self.player_spawn, |&p| self.neighbours(p).collect::<Vec<_>>()).collect();
        if let Some(pos) = self.open_cells().find(|p| !reachable.contains(p)) {
            return Err(MazeError::Unreachable { x: pos.x, y: pos.y });
        }

        if self.pellets.is_empty() {
            return Err(MazeError::NoPellets);
        }
        Ok(())
    }

    pub fn cell(&self, pos: GridPosition) -> Option<Cell> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width as i32 || pos.y >= self.height as i32 {
            return None;
        }
        self.cells
            .get(pos.y as usize * self.width + pos.x as usize)
            .copied()
    }

    /// Out-of-bounds cells are never walkable.
    pub fn is_walkable(&self, pos: GridPosition) -> bool {
        self.cell(pos) == Some(Cell::Open)
    }

    /// Cell containing a simulation-space point.
    pub fn world_to_grid(&self, point: Vec2) -> GridPosition {
        GridPosition::new(
            (point.x / self.tile_size).floor() as i32,
            (point.y / self.tile_size).floor() as i32,
        )
    }

    /// Simulation-space center of a cell.
    pub fn grid_center(&self, pos: GridPosition) -> Vec2 {
        Vec2::new(
            (pos.x as f32 + 0.5) * self.tile_size,
            (pos.y as f32 + 0.5) * self.tile_size,
        )
    }

    /// Grid extent in pixels.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    /// Map a simulation point to Bevy world space: maze centered on the
    /// origin, y up.
    pub fn sim_to_world(&self, point: Vec2) -> Vec2 {
        let half = self.pixel_size() / 2.0;
        Vec2::new(point.x - half.x, half.y - point.y)
    }

    /// Walkable neighbours in `Direction::CARDINALS` order.
    pub fn neighbours(&self, pos: GridPosition) -> impl Iterator<Item = GridPosition> + '_ {
        Direction::CARDINALS
            .into_iter()
            .map(move |dir| pos.step(dir))
            .filter(move |p| self.is_walkable(*p))
    }

    fn positions(&self) -> impl Iterator<Item = GridPosition> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| GridPosition::new(x, y)))
    }

    pub fn open_cells(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.positions().filter(move |p| self.is_walkable(*p))
    }

    pub fn wall_cells(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.positions().filter(move |p| !self.is_walkable(*p))
    }
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Marker for every entity owned by the current round. Despawned when the
/// round is torn down.
#[derive(Component, Debug)]
pub struct RoundEntity;

/// Spawn a static sprite for every wall cell.
pub fn spawn_walls(commands: &mut Commands, grid: &MazeGrid) {
    let mut count = 0;
    for pos in grid.wall_cells() {
        let world = grid.sim_to_world(grid.grid_center(pos));
        commands.spawn((
            Wall,
            pos,
            RoundEntity,
            Sprite::from_color(WALL_COLOR, Vec2::splat(grid.tile_size)),
            Transform::from_xyz(world.x, world.y, 0.0),
        ));
        count += 1;
    }
    info!(
        "maze spawned: {}x{} with {} walls, {} pellets, {} power-ups, {} ghosts",
        grid.width,
        grid.height,
        count,
        grid.pellets.len(),
        grid.power_ups.len(),
        grid.ghost_spawns.len()
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
