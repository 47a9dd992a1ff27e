//! Packing-order pre-analysis.
//!
//! The packing order is found by unpacking the fully-solved position: start
//! with a box on every target, repeatedly pick a target whose box can still
//! be pulled off (free cell in front of it and a free player cell behind
//! that), and remove it. Targets that become removable *late* are hard to
//! reach once their neighbors are filled, so they must be packed *early*:
//! the packing order is the removal order reversed.
//!
//! The same machinery yields the out-of-plan tables: at packing stage `k`
//! the first `k` targets of the order are sealed (their boxes will never
//! move again), which can cut off cells that were perfectly fine at stage 0.
//! A box sitting on such a cell is out of plan.

use crate::analysis::alive_cells;
use crate::board::Board;
use crate::core::coord::{Cell, DIRS};
use crate::core::state::State;

#[derive(Debug, Clone)]
pub struct PackingPlan {
    /// Targets in preferred packing order.
    pub order: Vec<Cell>,
    /// `stage_oop[k][cell]`: with the first `k` targets of `order` sealed,
    /// a box on `cell` can no longer reach any remaining target although it
    /// could at stage 0.
    stage_oop: Vec<Vec<bool>>,
}

impl PackingPlan {
    pub fn build(board: &Board, dead: &[bool]) -> PackingPlan {
        let order = packing_order(board);
        let n = board.cell_count();
        let target_count = order.len();

        let mut stage_oop: Vec<Vec<bool>> = Vec::with_capacity(target_count.max(1));
        // Stage 0: nothing is sealed, nothing is out of plan.
        stage_oop.push(vec![false; n]);

        let mut blocked = vec![false; n];
        for k in 1..target_count {
            blocked[order[k - 1].index()] = true;
            let remaining = &order[k..];
            let alive_k = alive_cells(board, remaining, &blocked);
            let mask = (0..n)
                .map(|i| {
                    board.is_floor(Cell::new(i)) && !dead[i] && !blocked[i] && !alive_k[i]
                })
                .collect();
            stage_oop.push(mask);
        }

        PackingPlan { order, stage_oop }
    }

    /// The packing feature: the largest `k` such that the first `k` targets
    /// of the order each hold a box.
    pub fn packed_prefix(&self, state: &State) -> usize {
        let mut k = 0;
        while k < self.order.len() && state.has_box(self.order[k]) {
            k += 1;
        }
        k
    }

    /// The out-of-plan feature: boxes stranded by the sealing implied by the
    /// current packing stage.
    pub fn out_of_plan(&self, state: &State) -> usize {
        let k = self.packed_prefix(state);
        if k >= self.stage_oop.len() {
            return 0;
        }
        let mask = &self.stage_oop[k];
        state
            .boxes()
            .iter()
            .filter(|b| mask[b.index()])
            .count()
    }

    /// The next target the packer advisor should aim for, if any.
    pub fn next_target(&self, state: &State) -> Option<Cell> {
        let k = self.packed_prefix(state);
        self.order.get(k).copied()
    }
}

fn packing_order(board: &Board) -> Vec<Cell> {
    let mut remaining: Vec<Cell> = board.targets().to_vec();
    let mut removal: Vec<Cell> = Vec::with_capacity(remaining.len());

    let occupied =
        |remaining: &[Cell], cell: Cell| remaining.binary_search(&cell).is_ok();

    while !remaining.is_empty() {
        // A box on `t` is pullable off when some direction has a free cell
        // in front and a free player cell behind that.
        let mut pick: Option<usize> = None;
        'scan: for (i, &t) in remaining.iter().enumerate() {
            for dir in DIRS {
                let Some(front) = board.floor_neighbor(t, dir) else {
                    continue;
                };
                let Some(beyond) = board.floor_neighbor(front, dir) else {
                    continue;
                };
                if !occupied(&remaining, front) && !occupied(&remaining, beyond) {
                    pick = Some(i);
                    break 'scan;
                }
            }
        }

        // Fully interlocked goal room: fall back to the target with the most
        // free floor neighbors, ties by cell order.
        let i = pick.unwrap_or_else(|| {
            let mut best = 0usize;
            let mut best_free = usize::MAX;
            for (i, &t) in remaining.iter().enumerate() {
                let free = DIRS
                    .iter()
                    .filter(|&&d| {
                        board
                            .floor_neighbor(t, d)
                            .is_some_and(|c| !occupied(&remaining, c))
                    })
                    .count();
                // Most free neighbors first; `remaining` is sorted, so the
                // first maximum is the smallest cell.
                if best_free == usize::MAX || free > best_free {
                    best = i;
                    best_free = free;
                }
            }
            best
        });

        removal.push(remaining.remove(i));
    }

    removal.reverse();
    removal
}
