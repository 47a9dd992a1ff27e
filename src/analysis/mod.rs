//! One-time per-board pre-analysis.
//!
//! Everything in this module is a pure function of the [`Board`] geometry:
//! it is computed once at load time and shared immutably by the search.

use crate::board::Board;
use crate::core::coord::{Cell, DIRS};

pub mod distances;
pub mod packing;
pub mod rooms;

pub use distances::DistanceTable;
pub use packing::PackingPlan;
pub use rooms::Rooms;

/// Aggregated pre-analysis results for one board.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Per cell: true when no box on that cell can ever reach any target.
    pub dead: Vec<bool>,
    pub distances: DistanceTable,
    pub rooms: Rooms,
    pub packing: PackingPlan,
}

pub fn analyze(board: &Board) -> Analysis {
    let dead = dead_squares(board);
    let distances = DistanceTable::build(board);
    let rooms = Rooms::build(board);
    let packing = PackingPlan::build(board, &dead);
    Analysis {
        dead,
        distances,
        rooms,
        packing,
    }
}

/// Cells from which a single box (other boxes ignored) can be pushed to some
/// seed cell, with `blocked` cells acting as extra walls for both the box and
/// the player.
///
/// Computed as a retrograde flood: seed cells are alive; a cell `p` is alive
/// when pushing the box one step from `p` lands on an alive cell, which needs
/// the landing cell and the player cell behind `p` to be free.
pub(crate) fn alive_cells(board: &Board, seeds: &[Cell], blocked: &[bool]) -> Vec<bool> {
    let n = board.cell_count();
    let mut alive = vec![false; n];
    let mut queue: Vec<Cell> = Vec::new();

    let free = |cell: Cell| board.is_floor(cell) && !blocked[cell.index()];

    for &t in seeds {
        if free(t) && !alive[t.index()] {
            alive[t.index()] = true;
            queue.push(t);
        }
    }

    while let Some(c) = queue.pop() {
        for dir in DIRS {
            // Box at p pushed toward c; the player stands behind the box.
            let Some(p) = board.neighbor(c, dir.opposite()) else {
                continue;
            };
            let Some(behind) = board.neighbor(p, dir.opposite()) else {
                continue;
            };
            if free(p) && free(behind) && !alive[p.index()] {
                alive[p.index()] = true;
                queue.push(p);
            }
        }
    }

    alive
}

/// The static dead-square table: floor cells from which no box can ever
/// reach any target. Pushing a box onto one of these immediately loses.
pub fn dead_squares(board: &Board) -> Vec<bool> {
    let blocked = vec![false; board.cell_count()];
    let alive = alive_cells(board, board.targets(), &blocked);
    (0..board.cell_count())
        .map(|i| board.is_floor(Cell::new(i)) && !alive[i])
        .collect()
}
