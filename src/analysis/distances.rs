//! Single-box push-distance tables.
//!
//! `dist[target][cell]` is the minimum number of pushes needed to move a
//! lone box from `cell` to `target`, ignoring every other box but honoring
//! player reachability around the moving box. Computed by a retrograde pull
//! BFS from each target over `(box cell, player side)` states; a pull
//! sequence from the target read backwards is a push sequence to it.

use std::collections::VecDeque;

use crate::board::Board;
use crate::core::coord::{Cell, DIRS};

pub const INFINITE: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct DistanceTable {
    per_target: Vec<Vec<u32>>,
}

impl DistanceTable {
    pub fn build(board: &Board) -> DistanceTable {
        let blocked = vec![false; board.cell_count()];
        let per_target = board
            .targets()
            .iter()
            .map(|&t| pull_distance_map(board, t, &blocked))
            .collect();
        DistanceTable { per_target }
    }

    /// Push distance from `cell` to the target with index `target_index`
    /// (into [`Board::targets`]); `INFINITE` when unreachable.
    #[inline]
    pub fn dist(&self, target_index: usize, cell: Cell) -> u32 {
        self.per_target[target_index][cell.index()]
    }

    #[inline]
    pub fn reachable(&self, target_index: usize, cell: Cell) -> bool {
        self.dist(target_index, cell) != INFINITE
    }
}

/// Minimum pushes from every cell to `target` for a lone box, with `blocked`
/// cells acting as extra walls. This is the workhorse behind both the
/// distance table and the hotspot tests (which seal one box cell).
pub fn pull_distance_map(board: &Board, target: Cell, blocked: &[bool]) -> Vec<u32> {
    let n = board.cell_count();
    let mut dist = vec![INFINITE; n * 4];
    let mut queue: VecDeque<(Cell, usize)> = VecDeque::new();

    let free = |cell: Cell| board.is_floor(cell) && !blocked[cell.index()];

    if !free(target) {
        return vec![INFINITE; n];
    }

    // Side-group cache: for each box cell, which floor neighbors are mutually
    // reachable by the player when only that box (plus `blocked`) is in the way.
    let mut groups: Vec<Option<[u8; 4]>> = vec![None; n];
    let mut scratch = vec![false; n];
    let mut group_of = |b: Cell, groups: &mut Vec<Option<[u8; 4]>>| -> [u8; 4] {
        if let Some(g) = groups[b.index()] {
            return g;
        }
        let mut labels = [u8::MAX; 4];
        let mut next_label = 0u8;
        scratch.iter_mut().for_each(|v| *v = false);
        for (k, dir) in DIRS.iter().enumerate() {
            let Some(start) = board.neighbor(b, *dir) else {
                continue;
            };
            if !free(start) || labels[k] != u8::MAX {
                continue;
            }
            // Flood from this side, avoiding the box cell.
            let label = next_label;
            next_label += 1;
            labels[k] = label;
            let mut stack = vec![start];
            scratch[start.index()] = true;
            while let Some(c) = stack.pop() {
                for d in DIRS {
                    let Some(nc) = board.neighbor(c, d) else {
                        continue;
                    };
                    if nc == b || !free(nc) || scratch[nc.index()] {
                        continue;
                    }
                    scratch[nc.index()] = true;
                    stack.push(nc);
                }
            }
            // Any later side already inside this flood gets the same label.
            for (k2, dir2) in DIRS.iter().enumerate().skip(k + 1) {
                if let Some(other) = board.neighbor(b, *dir2) {
                    if free(other) && scratch[other.index()] && labels[k2] == u8::MAX {
                        labels[k2] = label;
                    }
                }
            }
        }
        groups[b.index()] = Some(labels);
        labels
    };

    // Seed: box on the target, the player on any floor side.
    for (k, dir) in DIRS.iter().enumerate() {
        if let Some(side) = board.neighbor(target, *dir) {
            if free(side) {
                dist[target.index() * 4 + k] = 0;
                queue.push_back((target, k));
            }
        }
    }

    while let Some((b, side)) = queue.pop_front() {
        let d_here = dist[b.index() * 4 + side];
        let labels = group_of(b, &mut groups);
        for (k, dir) in DIRS.iter().enumerate() {
            // Pull the box one step in `dir`: the player stands at b+dir and
            // retreats to b+2*dir.
            let Some(box_to) = board.neighbor(b, *dir) else {
                continue;
            };
            let Some(player_to) = board.neighbor(box_to, *dir) else {
                continue;
            };
            if !free(box_to) || !free(player_to) {
                continue;
            }
            // The player must be able to walk from its current side to b+dir.
            if labels[k] == u8::MAX || labels[side] == u8::MAX || labels[k] != labels[side] {
                continue;
            }
            // After the pull the player sits one step beyond the box, i.e. on
            // the same `dir` side of the box's new cell.
            let slot = box_to.index() * 4 + k;
            if dist[slot] == INFINITE {
                dist[slot] = d_here + 1;
                queue.push_back((box_to, k));
            }
        }
    }

    (0..n)
        .map(|i| {
            (0..4)
                .map(|k| dist[i * 4 + k])
                .min()
                .unwrap_or(INFINITE)
        })
        .collect()
}
