//! Dynamic deadlock classification.
//!
//! Four checks, cheapest first:
//!
//! 1. **Dead square**: the push destination is statically dead.
//! 2. **Freeze**: the pushed box (possibly through a chain of neighbors)
//!    becomes immobile on both axes with some chained box off-target.
//! 3. **Corral**: the push walls off a player-unreachable region whose boxes
//!    cannot escape it, proven by a budgeted side-search. Results are cached
//!    by the corral's box signature, since many states share one corral.
//! 4. **Bipartite**: no perfect matching between boxes and targets remains.
//!
//! Checks 1–2 are mandatory; 3–4 are configurable and also skipped once the
//! per-expansion pruning budget runs out. Deadlocks found here are normal
//! pruning, not errors: the search counts them and moves on.

use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::analysis::distances::INFINITE;
use crate::analysis::Analysis;
use crate::board::Board;
use crate::core::coord::{Cell, Dir, DIRS};
use crate::core::state::State;
use crate::search::movegen::MacroMove;

/// Node budget for one corral side-search.
const CORRAL_NODE_BUDGET: usize = 1_000;
/// Wall-clock budget for one corral side-search.
const CORRAL_TIME_BUDGET: Duration = Duration::from_millis(10);

/// Why a candidate move was vetoed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    DeadSquare,
    Freeze,
    Corral,
    Bipartite,
}

/// Per-solve deadlock checker; owns the corral result cache.
pub struct DeadlockDetector<'a> {
    board: &'a Board,
    analysis: &'a Analysis,
    enable_corral: bool,
    enable_bipartite: bool,
    corral_cache: FxHashMap<Box<[Cell]>, bool>,
}

impl<'a> DeadlockDetector<'a> {
    pub fn new(
        board: &'a Board,
        analysis: &'a Analysis,
        enable_corral: bool,
        enable_bipartite: bool,
    ) -> Self {
        Self {
            board,
            analysis,
            enable_corral,
            enable_bipartite,
            corral_cache: FxHashMap::default(),
        }
    }

    /// Classify applying `mv` to `state`. `None` means no check fired.
    /// `prune_deadline` bounds the optional checks for this expansion.
    pub fn classify_move(
        &mut self,
        state: &State,
        mv: &MacroMove,
        prune_deadline: Option<Instant>,
    ) -> Option<MoveRejection> {
        if self.analysis.dead[mv.to.index()] {
            return Some(MoveRejection::DeadSquare);
        }

        let child = state.with_box_moved(mv.from, mv.to, mv.player_after);

        if self.freeze_deadlock(child.boxes(), mv.to) {
            return Some(MoveRejection::Freeze);
        }

        let in_budget =
            |deadline: Option<Instant>| deadline.map_or(true, |d| Instant::now() < d);

        if self.enable_corral
            && in_budget(prune_deadline)
            && self.corral_deadlock(&child, mv.to)
        {
            return Some(MoveRejection::Corral);
        }

        if self.enable_bipartite
            && in_budget(prune_deadline)
            && !self.has_perfect_matching(child.boxes())
        {
            return Some(MoveRejection::Bipartite);
        }

        None
    }

    /// True when the box pushed to `pushed` is frozen and the frozen cluster
    /// contains an off-target box.
    fn freeze_deadlock(&self, boxes: &[Cell], pushed: Cell) -> bool {
        let mut chain: Vec<Cell> = Vec::new();
        if !self.box_frozen(boxes, pushed, &mut chain) {
            return false;
        }
        // The pushed box is frozen: every box that participated in the
        // freezing chain is immobile too. Any of them off-target loses.
        chain.iter().any(|&c| !self.board.is_target(c))
    }

    /// All frozen boxes of a position, by running the freeze test per box.
    pub fn frozen_boxes(&self, boxes: &[Cell]) -> Vec<bool> {
        boxes
            .iter()
            .map(|&b| self.box_frozen(boxes, b, &mut Vec::new()))
            .collect()
    }

    /// Freeze test: immobile on both axes. The axis checks run with
    /// independent treat-as-wall sets; on a `true` result `chain` holds the
    /// boxes that participated in either blocking proof.
    fn box_frozen(&self, boxes: &[Cell], cell: Cell, chain: &mut Vec<Cell>) -> bool {
        let mut wall_h = vec![cell];
        if !self.blocked_on_axis(boxes, cell, Dir::Left, Dir::Right, &mut wall_h) {
            return false;
        }
        let mut wall_v = vec![cell];
        if !self.blocked_on_axis(boxes, cell, Dir::Up, Dir::Down, &mut wall_v) {
            return false;
        }
        for c in wall_h.into_iter().chain(wall_v) {
            if !chain.contains(&c) {
                chain.push(c);
            }
        }
        true
    }

    fn blocked_on_axis(
        &self,
        boxes: &[Cell],
        cell: Cell,
        side_a: Dir,
        side_b: Dir,
        as_wall: &mut Vec<Cell>,
    ) -> bool {
        let wall_like = |c: Option<Cell>, as_wall: &[Cell]| match c {
            None => true,
            Some(c) => !self.board.is_floor(c) || as_wall.contains(&c),
        };

        let a = self.board.neighbor(cell, side_a);
        let b = self.board.neighbor(cell, side_b);

        if wall_like(a, as_wall) || wall_like(b, as_wall) {
            return true;
        }
        let (a, b) = (a.expect("floor cell has grid neighbor"), b.expect("floor cell has grid neighbor"));
        if self.analysis.dead[a.index()] && self.analysis.dead[b.index()] {
            return true;
        }
        // A neighboring box blocks this axis when it is itself immobile on
        // the other axis, with the current box treated as a wall.
        let (other_a, other_b) = if side_a == Dir::Left {
            (Dir::Up, Dir::Down)
        } else {
            (Dir::Left, Dir::Right)
        };
        for n in [a, b] {
            if boxes.binary_search(&n).is_ok() && !as_wall.contains(&n) {
                as_wall.push(n);
                let blocked = self.blocked_on_axis(boxes, n, other_a, other_b, as_wall);
                if blocked {
                    return true;
                }
                as_wall.pop();
            }
        }
        false
    }

    /// Corral check on the child position: did the push wall off a region the
    /// player cannot reach whose boxes cannot get out?
    fn corral_deadlock(&mut self, child: &State, pushed: Cell) -> bool {
        let zone = self.board.player_zone(child.boxes(), child.player());

        // Only regions adjacent to the pushed box can have been created or
        // modified by this push.
        let mut region: Vec<bool> = vec![false; self.board.cell_count()];
        let mut found = false;
        for dir in DIRS {
            let Some(start) = self.board.floor_neighbor(pushed, dir) else {
                continue;
            };
            if zone.contains(start)
                || region[start.index()]
                || child.has_box(start)
            {
                continue;
            }
            // Flood this player-unreachable region.
            found = true;
            region[start.index()] = true;
            let mut stack = vec![start];
            while let Some(c) = stack.pop() {
                for d in DIRS {
                    let Some(nc) = self.board.floor_neighbor(c, d) else {
                        continue;
                    };
                    if region[nc.index()] || child.has_box(nc) || zone.contains(nc) {
                        continue;
                    }
                    region[nc.index()] = true;
                    stack.push(nc);
                }
            }
        }
        if !found {
            return false;
        }

        // Corral boxes: boxes inside the region plus the boundary boxes.
        let mut corral_boxes: Vec<Cell> = child
            .boxes()
            .iter()
            .copied()
            .filter(|&b| {
                region[b.index()]
                    || DIRS
                        .iter()
                        .any(|&d| {
                            self.board
                                .neighbor(b, d)
                                .is_some_and(|c| region[c.index()])
                        })
            })
            .collect();
        corral_boxes.sort_unstable();

        let signature: Box<[Cell]> = corral_boxes.clone().into_boxed_slice();
        if let Some(&dead) = self.corral_cache.get(&signature) {
            return dead;
        }

        let dead = self.corral_side_search(child, &region, &corral_boxes);
        self.corral_cache.insert(signature, dead);
        dead
    }

    /// Budgeted side-search: other boxes become walls, and we try to push
    /// any corral box onto a target or clear of the corral area. Exhaustion
    /// without success (including budget exhaustion) declares a deadlock.
    fn corral_side_search(
        &self,
        child: &State,
        region: &[bool],
        corral_boxes: &[Cell],
    ) -> bool {
        let started = Instant::now();

        // Corral area: the region plus the corral boxes' own cells.
        let mut area = region.to_vec();
        for &b in corral_boxes {
            area[b.index()] = true;
        }

        let fixed: Vec<Cell> = child
            .boxes()
            .iter()
            .copied()
            .filter(|b| corral_boxes.binary_search(b).is_err())
            .collect();
        let is_wall = |c: Cell| !self.board.is_floor(c) || fixed.binary_search(&c).is_ok();

        let mut visited: FxHashSet<(Box<[Cell]>, Cell)> = FxHashSet::default();
        let mut queue: Vec<(Vec<Cell>, Cell)> = Vec::new();

        let start_zone = self
            .board
            .player_zone(child.boxes(), child.player());
        visited.insert((
            corral_boxes.to_vec().into_boxed_slice(),
            start_zone.canonical,
        ));
        queue.push((corral_boxes.to_vec(), child.player()));

        let mut expanded = 0usize;
        while let Some((boxes, player)) = queue.pop() {
            expanded += 1;
            if expanded > CORRAL_NODE_BUDGET || started.elapsed() > CORRAL_TIME_BUDGET {
                return true;
            }

            // Player zone with the fixed boxes as walls.
            let mut all: Vec<Cell> = boxes.iter().copied().chain(fixed.iter().copied()).collect();
            all.sort_unstable();
            let zone = self.board.player_zone(&all, player);

            for (i, &b) in boxes.iter().enumerate() {
                for dir in DIRS {
                    let Some(dest) = self.board.neighbor(b, dir) else {
                        continue;
                    };
                    let Some(push_from) = self.board.neighbor(b, dir.opposite()) else {
                        continue;
                    };
                    if is_wall(dest)
                        || boxes.binary_search(&dest).is_ok()
                        || !zone.contains(push_from)
                        || self.analysis.dead[dest.index()]
                    {
                        continue;
                    }
                    if self.board.is_target(dest) || !area[dest.index()] {
                        // A corral box escaped or packed: not a deadlock.
                        return false;
                    }
                    let mut next = boxes.clone();
                    next[i] = dest;
                    next.sort_unstable();
                    let mut next_all: Vec<Cell> =
                        next.iter().copied().chain(fixed.iter().copied()).collect();
                    next_all.sort_unstable();
                    let next_zone = self.board.player_zone(&next_all, b);
                    let key = (next.clone().into_boxed_slice(), next_zone.canonical);
                    if visited.insert(key) {
                        queue.push((next, b));
                    }
                }
            }
        }

        true
    }

    /// Bipartite feasibility: each box must be matchable to a distinct
    /// target. Frozen boxes can only claim the target they sit on; mobile
    /// boxes reach every target with a finite push distance.
    fn has_perfect_matching(&self, boxes: &[Cell]) -> bool {
        let targets = self.board.targets();
        if boxes.is_empty() {
            return true;
        }
        let frozen = self.frozen_boxes(boxes);

        let mut adjacency: Vec<Vec<usize>> = Vec::with_capacity(boxes.len());
        for (i, &b) in boxes.iter().enumerate() {
            let mut edges = Vec::new();
            if frozen[i] {
                if let Some(ti) = self.board.target_index(b) {
                    edges.push(ti);
                }
            } else {
                for ti in 0..targets.len() {
                    if self.analysis.distances.dist(ti, b) != INFINITE {
                        edges.push(ti);
                    }
                }
            }
            if edges.is_empty() {
                return false;
            }
            adjacency.push(edges);
        }

        // Kuhn's augmenting-path matching.
        let mut match_of_target: Vec<Option<usize>> = vec![None; targets.len()];
        let mut matched = 0usize;
        for b in 0..boxes.len() {
            let mut seen = vec![false; targets.len()];
            if augment(b, &adjacency, &mut match_of_target, &mut seen) {
                matched += 1;
            } else {
                return false;
            }
        }
        matched == boxes.len()
    }
}

fn augment(
    b: usize,
    adjacency: &[Vec<usize>],
    match_of_target: &mut [Option<usize>],
    seen: &mut [bool],
) -> bool {
    for &t in &adjacency[b] {
        if seen[t] {
            continue;
        }
        seen[t] = true;
        match match_of_target[t] {
            None => {
                match_of_target[t] = Some(b);
                return true;
            }
            Some(other) => {
                if augment(other, adjacency, match_of_target, seen) {
                    match_of_target[t] = Some(b);
                    return true;
                }
            }
        }
    }
    false
}
