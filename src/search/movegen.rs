//! Macro-move generation.
//!
//! A macro move pushes one box from its cell to a destination through any
//! number of straight pushes and direction changes, with the player walking
//! freely between pushes but touching no other box. For each box we run a
//! BFS over `(box cell, player zone)` pairs; the zone is identified by its
//! canonical cell, so revisiting the same box cell from an equivalent player
//! region is suppressed.
//!
//! Output is ordered by destination Manhattan distance to the nearest
//! unfilled target (stable among ties), which lets the advisors short-circuit
//! after the top candidates.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::board::{Board, Zone};
use crate::core::coord::{Cell, Dir, DIRS};
use crate::core::state::State;

/// A box displacement `from → to`. `player_after` is the box's penultimate
/// cell, i.e. where the player ends up after the final push; it
/// disambiguates otherwise-equal displacements that strand the player in
/// different zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacroMove {
    pub from: Cell,
    pub to: Cell,
    pub player_after: Cell,
}

/// A single primitive push: the box stands on `from` and moves one step in
/// `dir`, with the player taking its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushStep {
    pub from: Cell,
    pub dir: Dir,
}

/// Enumerate every legal macro move of `state`. `zone` must be the player's
/// reachability zone in `state`.
pub fn macro_moves(board: &Board, state: &State, zone: &Zone) -> Vec<MacroMove> {
    let mut out: Vec<MacroMove> = Vec::new();

    for &start in state.boxes() {
        push_bfs(board, state, zone, start, &mut |mv, _| {
            out.push(mv);
            true
        });
    }

    // Unfilled targets for the ordering heuristic.
    let unfilled: Vec<Cell> = board
        .targets()
        .iter()
        .copied()
        .filter(|&t| !state.has_box(t))
        .collect();
    if !unfilled.is_empty() {
        let rank = |mv: &MacroMove| {
            let to = board.coord_of(mv.to);
            unfilled
                .iter()
                .map(|&t| board.coord_of(t).manhattan(to))
                .min()
                .unwrap_or(i32::MAX)
        };
        out.sort_by_key(rank);
    }
    out
}

/// Recompute the primitive pushes realizing `mv` from `state`. Runs the same
/// BFS as [`macro_moves`], so the reconstructed path is exactly the one the
/// generator found first. Returns `None` only if `mv` is not actually legal
/// in `state`.
pub fn push_path(board: &Board, state: &State, mv: &MacroMove) -> Option<Vec<PushStep>> {
    // Identify the goal key: box on `to` with the player zone of the final
    // position.
    let final_state = state.with_box_moved(mv.from, mv.to, mv.player_after);
    let goal_zone = board.player_zone(final_state.boxes(), mv.player_after);
    let goal_key = (mv.to, goal_zone.canonical);

    let zone = board.player_zone(state.boxes(), state.player());
    let mut parents: FxHashMap<(Cell, Cell), (Option<(Cell, Cell)>, PushStep)> =
        FxHashMap::default();
    let mut found = false;

    push_bfs(board, state, &zone, mv.from, &mut |cand, edge| {
        let key = (cand.to, edge.zone_canonical);
        parents.entry(key).or_insert((edge.parent, edge.step));
        if key == goal_key {
            found = true;
            return false;
        }
        true
    });

    if !found {
        return None;
    }

    // Walk the parent chain back to the first push (which has no parent).
    let mut steps: Vec<PushStep> = Vec::new();
    let mut key = Some(goal_key);
    while let Some(k) = key {
        let &(parent, step) = parents.get(&k).expect("backtracked key was visited");
        steps.push(step);
        key = parent;
    }
    steps.reverse();
    Some(steps)
}

struct Edge {
    parent: Option<(Cell, Cell)>,
    step: PushStep,
    zone_canonical: Cell,
}

/// Shared BFS behind [`macro_moves`] and [`push_path`]. Calls `emit` for
/// every newly visited `(box cell, zone)` pair; returning `false` stops the
/// search early.
fn push_bfs(
    board: &Board,
    state: &State,
    zone: &Zone,
    start: Cell,
    emit: &mut dyn FnMut(MacroMove, &Edge) -> bool,
) {
    // Box set with the moving box removed; re-inserted per node at its
    // current cell via the `blocked` closure.
    let rest: Vec<Cell> = state
        .boxes()
        .iter()
        .copied()
        .filter(|&b| b != start)
        .collect();
    let blocked =
        |boxes: &[Cell], c: Cell, box_cell: Cell| c == box_cell || boxes.binary_search(&c).is_ok();

    let mut visited: FxHashSet<(Cell, Cell)> = FxHashSet::default();
    let mut queue: VecDeque<(Cell, Cell, Option<(Cell, Cell)>, PushStep)> = VecDeque::new();

    // Seed with the first pushes, taken from the player's current zone.
    for dir in DIRS {
        let Some(dest) = board.floor_neighbor(start, dir) else {
            continue;
        };
        let Some(push_from) = board.floor_neighbor(start, dir.opposite()) else {
            continue;
        };
        if blocked(&rest, dest, start) || !zone.contains(push_from) {
            continue;
        }
        queue.push_back((dest, start, None, PushStep { from: start, dir }));
    }

    while let Some((box_cell, player, parent, step)) = queue.pop_front() {
        // Zone of the player standing where the box just was.
        let mut with_box: Vec<Cell> = rest.clone();
        let pos = with_box
            .binary_search(&box_cell)
            .unwrap_or_else(|insert_at| insert_at);
        with_box.insert(pos, box_cell);
        let here = board.player_zone(&with_box, player);

        let key = (box_cell, here.canonical);
        if !visited.insert(key) {
            continue;
        }

        let edge = Edge {
            parent,
            step,
            zone_canonical: here.canonical,
        };
        let mv = MacroMove {
            from: start,
            to: box_cell,
            player_after: player,
        };
        if !emit(mv, &edge) {
            return;
        }

        for dir in DIRS {
            let Some(dest) = board.floor_neighbor(box_cell, dir) else {
                continue;
            };
            let Some(push_from) = board.floor_neighbor(box_cell, dir.opposite()) else {
                continue;
            };
            if blocked(&rest, dest, box_cell) || !here.contains(push_from) {
                continue;
            }
            queue.push_back((
                dest,
                box_cell,
                Some(key),
                PushStep {
                    from: box_cell,
                    dir,
                },
            ));
        }
    }
}
