use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Grid and spatial
// ---------------------------------------------------------------------------

/// A cell coordinate in the maze grid. (0,0) is the top-left cell.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `dir`. `Direction::None` is the cell itself.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Cardinal direction for movement, or `None` when standing still.
///
/// World coordinates grow downward, so `Up` is `(0, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    #[default]
    None,
}

impl Direction {
    /// Enumeration order used for input priority and tie-breaking.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Grid offset for this direction.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::None => (0, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::None => Direction::None,
        }
    }

    /// Unit vector in world space.
    pub fn vector(&self) -> Vec2 {
        let (dx, dy) = self.delta();
        Vec2::new(dx as f32, dy as f32)
    }

    /// Facing angle in degrees for presentation.
    pub fn angle(&self) -> f32 {
        match self {
            Direction::Right | Direction::None => 0.0,
            Direction::Down => 90.0,
            Direction::Left => 180.0,
            Direction::Up => -90.0,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn is_none(&self) -> bool {
        *self == Direction::None
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Continuous world position in pixels, origin at the maze's top-left corner.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Deref, DerefMut)]
pub struct Position(pub Vec2);

/// Pixels per second.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Deref, DerefMut)]
pub struct Velocity(pub Vec2);

/// Direction the entity is currently committed to.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heading(pub Direction);

/// Buffered input direction (player only). Applied at the next valid turn point.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferedDirection(pub Direction);

/// Axis-aligned collision box, as a half edge length in pixels.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub half_extent: f32,
}

impl Body {
    /// A box whose half edge is `fraction` of the tile. Fractions below one
    /// half leave the body room to pass through a one-tile corridor.
    pub fn scaled(tile_size: f32, fraction: f32) -> Self {
        Self {
            half_extent: tile_size * fraction,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::splat(self.half_extent * 2.0)
    }
}

/// Spawn cell for respawning.
#[derive(Component, Debug, Clone, Copy)]
pub struct SpawnPosition(pub GridPosition);

// ---------------------------------------------------------------------------
// Entity markers and state
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player {
    /// Simulation time (ms) at which invincibility ends. Inactive when `<= now`.
    pub invincible_until_ms: u64,
    /// Set while the player is out of play after being caught.
    pub respawn_at_ms: Option<u64>,
}

impl Player {
    pub fn is_invincible(&self, now_ms: u64) -> bool {
        self.invincible_until_ms > now_ms
    }

    pub fn is_respawning(&self) -> bool {
        self.respawn_at_ms.is_some()
    }

    /// Start or extend the invincibility window. Consecutive grants stack.
    pub fn grant_invincibility(&mut self, now_ms: u64, duration_ms: u64) {
        if self.is_invincible(now_ms) {
            self.invincible_until_ms += duration_ms;
        } else {
            self.invincible_until_ms = now_ms + duration_ms;
        }
    }
}

/// Presentation tint of a ghost. Has no effect on behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GhostColor {
    Red,
    Pink,
    Orange,
    Cyan,
}

impl GhostColor {
    const CYCLE: [GhostColor; 4] = [
        GhostColor::Red,
        GhostColor::Pink,
        GhostColor::Orange,
        GhostColor::Cyan,
    ];

    pub fn for_index(i: usize) -> Self {
        Self::CYCLE[i % Self::CYCLE.len()]
    }

    pub fn color(&self) -> Color {
        match self {
            GhostColor::Red => Color::srgb(1.0, 0.0, 0.0),
            GhostColor::Pink => Color::srgb(1.0, 0.41, 0.71),
            GhostColor::Orange => Color::srgb(1.0, 0.65, 0.0),
            GhostColor::Cyan => Color::srgb(0.0, 1.0, 1.0),
        }
    }
}

#[derive(Component, Debug)]
pub struct Ghost {
    pub color: GhostColor,
    /// False once defeated, until re-activated.
    pub active: bool,
    /// Re-activation deadline. `None` while defeated means out for the round.
    pub respawn_at_ms: Option<u64>,
}

impl Ghost {
    pub fn new(color: GhostColor) -> Self {
        Self {
            color,
            active: true,
            respawn_at_ms: None,
        }
    }
}

/// Cell where the ghost last chose a direction. A ghost decides once per cell.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct DecisionCell(pub Option<GridPosition>);

#[derive(Component, Debug)]
pub struct Wall;

#[derive(Component, Debug)]
pub struct Pellet;

#[derive(Component, Debug)]
pub struct PowerUp;

/// Consumable state shared by pellets and power-ups.
#[derive(Component, Debug, Default)]
pub struct Collectible {
    pub consumed: bool,
}
