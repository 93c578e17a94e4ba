use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::Direction;
use crate::plugins::maze::{CLASSIC_MAZE, MazeError, MazeGrid};

/// Environment variable naming an optional JSON round configuration file.
pub const CONFIG_ENV_VAR: &str = "MAZECHASE_CONFIG";

// ---------------------------------------------------------------------------
// Round config
// ---------------------------------------------------------------------------

/// Tunables for a round. Every field has a default, so a config file only
/// needs the values it overrides.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// ASCII layout, see `MazeGrid::parse`.
    pub maze: String,
    /// Edge length of a cell in pixels.
    pub tile_size: f32,
    /// Max distance from a cell center (px) that still counts as centered.
    pub align_tolerance: f32,
    /// Simulated milliseconds per tick.
    pub tick_ms: u64,
    /// Pixels per second.
    pub player_speed: f32,
    /// Pixels per second.
    pub ghost_speed: f32,
    /// Fraction of the remaining velocity gap closed each tick.
    pub ghost_velocity_lerp: f32,
    pub starting_lives: u32,
    pub pellet_score: u64,
    pub ghost_score: u64,
    pub invincibility_ms: u64,
    pub respawn_delay_ms: u64,
    /// Delay before a defeated ghost comes back. `None` keeps it out for the round.
    pub ghost_respawn_ms: Option<u64>,
    /// Defeating a ghost while invincible extends invincibility by `invincibility_ms`.
    pub ghost_defeat_extends_invincibility: bool,
    /// Delay between the end of a round and the game-over screen.
    pub round_end_delay_ms: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            maze: CLASSIC_MAZE.to_string(),
            tile_size: 40.0,
            align_tolerance: 4.0,
            tick_ms: 16,
            player_speed: 150.0,
            ghost_speed: 100.0,
            ghost_velocity_lerp: 0.1,
            starting_lives: 3,
            pellet_score: 10,
            ghost_score: 100,
            invincibility_ms: 7_000,
            respawn_delay_ms: 1_000,
            ghost_respawn_ms: None,
            ghost_defeat_extends_invincibility: true,
            round_end_delay_ms: 3_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("ghost_velocity_lerp must be in (0, 1], got {0}")]
    LerpOutOfRange(f32),
    #[error(
        "{entity} moves {step:.2} px per tick; tile_size / step must exceed 2 * align_tolerance ({window:.2})"
    )]
    GridDesync {
        entity: &'static str,
        step: f32,
        window: f32,
    },
    #[error(
        "{entity} moves {step:.2} px per tick, which can skip the {window:.2} px centering window"
    )]
    SkipsCenter {
        entity: &'static str,
        step: f32,
        window: f32,
    },
    #[error("invalid maze: {0}")]
    Maze(#[from] MazeError),
}

impl RoundConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Config from the file named by `MAZECHASE_CONFIG`, or the defaults when unset.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Seconds simulated per tick.
    pub fn tick_secs(&self) -> f32 {
        self.tick_ms as f32 / 1000.0
    }

    /// Distance covered in one tick at `speed` px/s.
    pub fn step_per_tick(&self, speed: f32) -> f32 {
        speed * self.tick_secs()
    }

    /// Check the numeric invariants the grid alignment depends on, and that the
    /// maze parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tile_size", self.tile_size as f64),
            ("align_tolerance", self.align_tolerance as f64),
            ("tick_ms", self.tick_ms as f64),
            ("player_speed", self.player_speed as f64),
            ("ghost_speed", self.ghost_speed as f64),
            ("starting_lives", self.starting_lives as f64),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if !(self.ghost_velocity_lerp > 0.0 && self.ghost_velocity_lerp <= 1.0) {
            return Err(ConfigError::LerpOutOfRange(self.ghost_velocity_lerp));
        }

        let window = 2.0 * self.align_tolerance;
        for (entity, speed) in [("player", self.player_speed), ("ghost", self.ghost_speed)] {
            let step = self.step_per_tick(speed);
            if self.tile_size / step <= window {
                return Err(ConfigError::GridDesync {
                    entity,
                    step,
                    window,
                });
            }
            if step >= window {
                return Err(ConfigError::SkipsCenter {
                    entity,
                    step,
                    window,
                });
            }
        }

        MazeGrid::parse(&self.maze, self.tile_size)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Round state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundOutcome {
    #[default]
    InProgress,
    Won,
    Lost,
}

/// Score, lives and outcome of the current round. Only the gameplay event
/// handlers mutate it.
#[derive(Resource, Debug, Default)]
pub struct RoundState {
    pub score: u64,
    pub lives: u32,
    pub pellets_remaining: usize,
    pub outcome: RoundOutcome,
}

impl RoundState {
    pub fn new(lives: u32, pellets: usize) -> Self {
        Self {
            score: 0,
            lives,
            pellets_remaining: pellets,
            outcome: RoundOutcome::InProgress,
        }
    }

    pub fn in_progress(&self) -> bool {
        self.outcome == RoundOutcome::InProgress
    }
}

/// Monotonic simulation clock, advanced by a fixed step once per tick.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock {
    pub now_ms: u64,
    pub tick_ms: u64,
    pub ticks: u64,
}

impl SimClock {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            now_ms: 0,
            tick_ms,
            ticks: 0,
        }
    }

    pub fn advance(&mut self) {
        self.now_ms += self.tick_ms;
        self.ticks += 1;
    }

    /// Whether `deadline_ms` has been reached.
    pub fn reached(&self, deadline_ms: u64) -> bool {
        self.now_ms >= deadline_ms
    }
}

/// Which directions are held this tick. Filled by the input system, read by
/// the player controller.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldDirections {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl HeldDirections {
    pub fn only(dir: Direction) -> Self {
        let mut held = Self::default();
        match dir {
            Direction::Left => held.left = true,
            Direction::Right => held.right = true,
            Direction::Up => held.up = true,
            Direction::Down => held.down = true,
            Direction::None => {}
        }
        held
    }

    /// First held direction in priority order Left, Right, Up, Down.
    pub fn first_pressed(&self) -> Option<Direction> {
        let flags = [self.left, self.right, self.up, self.down];
        Direction::CARDINALS
            .into_iter()
            .zip(flags)
            .find_map(|(dir, held)| held.then_some(dir))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
