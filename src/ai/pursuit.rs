//! Greedy pursuit: at a decision point, step into the legal neighbour cell
//! closest to the target by Manhattan distance. No lookahead.

use micromegas_tracing::prelude::{span_fn, span_scope};

use crate::components::{Direction, GridPosition};
use crate::plugins::maze::MazeGrid;

use super::manhattan;

/// Pick a ghost's next direction from `cell`.
///
/// Candidates are the walkable neighbours in `Direction::CARDINALS` order.
/// The reverse of `current` is dropped unless it is the only way out. Ties on
/// distance keep the earliest candidate. Returns `Direction::None` when no
/// neighbour is walkable.
#[span_fn]
pub fn choose_direction(
    grid: &MazeGrid,
    cell: GridPosition,
    current: Direction,
    target: GridPosition,
) -> Direction {
    let legal: Vec<Direction> = Direction::CARDINALS
        .into_iter()
        .filter(|dir| grid.is_walkable(cell.step(*dir)))
        .collect();

    let reverse = current.opposite();
    let forward: Vec<Direction> = legal
        .iter()
        .copied()
        .filter(|dir| *dir != reverse)
        .collect();
    let candidates = if forward.is_empty() { legal } else { forward };

    // min_by_key returns the first minimum, which gives the CARDINALS tie order.
    candidates
        .into_iter()
        .min_by_key(|dir| manhattan(&cell.step(*dir), &target))
        .unwrap_or(Direction::None)
}
