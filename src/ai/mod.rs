//! Ghost decision making. Every ghost uses the same greedy pursuit policy;
//! colors differ only in presentation.

pub mod pursuit;

use crate::components::GridPosition;

/// Manhattan distance between two cells.
pub fn manhattan(a: &GridPosition, b: &GridPosition) -> u32 {
    (a.x - b.x).unsigned_abs() + (a.y - b.y).unsigned_abs()
}
