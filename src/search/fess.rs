//! The FESS main loop.
//!
//! The search tree is an arena of nodes indexed by `u32`; the feature-space
//! cell map stores node indices only, and the transposition table maps state
//! fingerprints to node indices (verifying real equality on every hit, since
//! Zobrist hashes can collide). Cell selection cycles over the cells in
//! insertion order; within the chosen cell the single cheapest unexpanded
//! move is applied, ties broken by node insertion order and then by the
//! move ordering of the generator.

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::analysis::{analyze, Analysis};
use crate::board::zobrist::{Zobrist, DEFAULT_SEED};
use crate::board::{Board, ParseError};
use crate::core::coord::Cell;
use crate::core::state::State;
use crate::deadlock::{DeadlockDetector, MoveRejection};
use crate::search::advisors::{weight_moves, HotspotCache, WeightedMove};
use crate::search::features::{evaluate, FeaturePoint};
use crate::search::limits::{Interrupt, LimitReason, NoProgress, ProgressLike, SearchStats, Tracker};
use crate::search::movegen::{macro_moves, push_path, MacroMove};
use crate::solution::{Push, Solution};

/// Engine configuration. Plain data; the cancellation flag and progress sink
/// are passed separately to [`solve_with`].
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Hard cap on generated search-tree nodes.
    pub max_nodes: u64,
    /// Wall-clock deadline in milliseconds.
    pub max_millis: u64,
    pub enable_corral_check: bool,
    pub enable_bipartite_check: bool,
    /// Seed for the per-board Zobrist tables; the only randomness source.
    pub zobrist_seed: u64,
    /// Hard cap on transposition-table entries (the memory cap; no eviction).
    pub max_tt_entries: usize,
    /// Expansions between progress callbacks and flag polls.
    pub progress_interval: u64,
    /// Per-expansion budget for the optional deadlock checks, milliseconds.
    pub prune_budget_millis: u64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_nodes: 2_000_000,
            max_millis: 600_000,
            enable_corral_check: true,
            enable_bipartite_check: true,
            zobrist_seed: DEFAULT_SEED,
            max_tt_entries: 2_000_000,
            progress_interval: 1_000,
            prune_budget_millis: 20,
        }
    }
}

/// Terminal outcome of a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(Solution),
    Unsolvable,
    LimitExceeded(LimitReason),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub stats: SearchStats,
}

/// Parse and solve a level with default control (no cancellation flag, no
/// progress sink).
pub fn solve(level: &str, options: &SolveOptions) -> Result<SolveReport, ParseError> {
    solve_with(level, options, None, &mut NoProgress)
}

/// Parse and solve a level with full control.
pub fn solve_with<P: ProgressLike>(
    level: &str,
    options: &SolveOptions,
    cancel: Option<&AtomicBool>,
    progress: &mut P,
) -> Result<SolveReport, ParseError> {
    let board = Board::load(level)?;
    Ok(solve_board(&board, options, cancel, progress))
}

/// Solve an already-parsed board.
pub fn solve_board<P: ProgressLike>(
    board: &Board,
    options: &SolveOptions,
    cancel: Option<&AtomicBool>,
    progress: &mut P,
) -> SolveReport {
    let analysis = analyze(board);
    let mut engine = Engine::new(board, &analysis, options, cancel);
    engine.run(progress)
}

struct Node {
    state: State,
    canonical: Cell,
    parent: Option<u32>,
    via: Option<MacroMove>,
    weight: u32,
    moves: Vec<WeightedMove>,
    spent: Vec<bool>,
    remaining: u32,
    remaining_zero: u32,
}

impl Node {
    /// Cheapest weight this node can still offer, if any move is unexpanded.
    #[inline]
    fn offer(&self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        Some(self.weight + if self.remaining_zero > 0 { 0 } else { 1 })
    }

    /// Index of the first unexpanded move matching the offered weight.
    fn first_offer_index(&self) -> usize {
        let want_zero = self.remaining_zero > 0;
        for (i, wm) in self.moves.iter().enumerate() {
            if self.spent[i] {
                continue;
            }
            if !want_zero || wm.weight == 0 {
                return i;
            }
        }
        unreachable!("offer() promised an unexpanded move")
    }
}

struct CellBucket {
    nodes: Vec<u32>,
}

struct Engine<'a> {
    board: &'a Board,
    analysis: &'a Analysis,
    options: &'a SolveOptions,
    zobrist: Zobrist,
    detector: DeadlockDetector<'a>,
    hotspots: HotspotCache,
    nodes: Vec<Node>,
    cells: Vec<CellBucket>,
    cell_index: FxHashMap<FeaturePoint, usize>,
    tt: FxHashMap<u64, Vec<u32>>,
    cursor: usize,
    tracker: Tracker<'a>,
}

impl<'a> Engine<'a> {
    fn new(
        board: &'a Board,
        analysis: &'a Analysis,
        options: &'a SolveOptions,
        cancel: Option<&'a AtomicBool>,
    ) -> Self {
        Engine {
            board,
            analysis,
            options,
            zobrist: Zobrist::new(board.cell_count(), options.zobrist_seed),
            detector: DeadlockDetector::new(
                board,
                analysis,
                options.enable_corral_check,
                options.enable_bipartite_check,
            ),
            hotspots: HotspotCache::new(),
            nodes: Vec::new(),
            cells: Vec::new(),
            cell_index: FxHashMap::default(),
            tt: FxHashMap::default(),
            cursor: 0,
            tracker: Tracker::new(
                options.max_nodes,
                options.max_millis,
                options.max_tt_entries,
                options.progress_interval,
                cancel,
            ),
        }
    }

    fn run<P: ProgressLike>(&mut self, progress: &mut P) -> SolveReport {
        let root = self.board.initial_state();

        if self.board.is_goal(&root) {
            return self.report(SolveOutcome::Solved(Solution::empty()));
        }

        // A box starting on a dead square loses before any exploration.
        if root
            .boxes()
            .iter()
            .any(|&b| self.analysis.dead[b.index()])
        {
            return self.report(SolveOutcome::Unsolvable);
        }

        self.insert_node(root, None, None, 0);

        loop {
            if let Some(interrupt) = self.tracker.poll(self.nodes.len(), progress) {
                let outcome = match interrupt {
                    Interrupt::Cancelled => SolveOutcome::Cancelled,
                    Interrupt::Limit(reason) => SolveOutcome::LimitExceeded(reason),
                };
                return self.report(outcome);
            }

            let Some((node_id, move_idx)) = self.select() else {
                return self.report(SolveOutcome::Unsolvable);
            };

            let mv = {
                let node = &mut self.nodes[node_id as usize];
                node.spent[move_idx] = true;
                node.remaining -= 1;
                if node.moves[move_idx].weight == 0 {
                    node.remaining_zero -= 1;
                }
                node.moves[move_idx].mv
            };
            self.tracker.stats.nodes_expanded += 1;

            let parent_state = self.nodes[node_id as usize].state.clone();
            let parent_weight = self.nodes[node_id as usize].weight;
            let move_weight = self.nodes[node_id as usize].moves[move_idx].weight as u32;

            let prune_deadline = Instant::now()
                .checked_add(Duration::from_millis(self.options.prune_budget_millis));
            match self
                .detector
                .classify_move(&parent_state, &mv, prune_deadline)
            {
                Some(MoveRejection::DeadSquare) => {
                    self.tracker.stats.dead_square_pruned += 1;
                    continue;
                }
                Some(MoveRejection::Freeze) => {
                    self.tracker.stats.freeze_pruned += 1;
                    continue;
                }
                Some(MoveRejection::Corral) => {
                    self.tracker.stats.corral_pruned += 1;
                    continue;
                }
                Some(MoveRejection::Bipartite) => {
                    self.tracker.stats.bipartite_pruned += 1;
                    continue;
                }
                None => {}
            }

            let child = parent_state.with_box_moved(mv.from, mv.to, mv.player_after);
            let child_weight = parent_weight + move_weight;

            // Transposition: verify true equality on hash hits, a colliding
            // fingerprint must not count as a duplicate.
            let (canonical, hash) = {
                let zone = self.board.player_zone(child.boxes(), child.player());
                (zone.canonical, self.zobrist.hash(child.boxes(), zone.canonical))
            };
            let mut duplicate = false;
            if let Some(ids) = self.tt.get(&hash) {
                for &id in ids {
                    let known = &self.nodes[id as usize];
                    if known.canonical == canonical && known.state.boxes() == child.boxes() {
                        duplicate = true;
                        if child_weight < known.weight {
                            // Re-adopt the cheaper path; the feature tuple is
                            // a pure function of the state, so the node stays
                            // in its cell and simply competes better now.
                            let known = &mut self.nodes[id as usize];
                            known.weight = child_weight;
                            known.parent = Some(node_id);
                            known.via = Some(mv);
                        } else {
                            self.tracker.stats.duplicates_pruned += 1;
                        }
                        break;
                    }
                }
            }
            if duplicate {
                continue;
            }

            if self.board.is_goal(&child) {
                let solution = self.reconstruct(node_id, mv);
                return self.report(SolveOutcome::Solved(solution));
            }

            self.insert_node(child, Some(node_id), Some(mv), child_weight);
        }
    }

    /// Create a node, weight its moves, and attach it to the feature cell
    /// map and the transposition table.
    fn insert_node(
        &mut self,
        state: State,
        parent: Option<u32>,
        via: Option<MacroMove>,
        weight: u32,
    ) {
        let eval = evaluate(self.board, self.analysis, &state);
        let moves = macro_moves(self.board, &state, &eval.zone);
        let (weighted, claims) = weight_moves(
            self.board,
            self.analysis,
            &state,
            &eval,
            &moves,
            &mut self.hotspots,
        );
        self.tracker.stats.advisor_claims += claims;

        let canonical = eval.zone.canonical;
        let hash = self.zobrist.hash(state.boxes(), canonical);
        let remaining = weighted.len() as u32;
        let remaining_zero = weighted.iter().filter(|wm| wm.weight == 0).count() as u32;

        let id = self.nodes.len() as u32;
        let spent = vec![false; weighted.len()];
        self.nodes.push(Node {
            state,
            canonical,
            parent,
            via,
            weight,
            moves: weighted,
            spent,
            remaining,
            remaining_zero,
        });
        self.tracker.stats.nodes_generated += 1;

        let cell = match self.cell_index.get(&eval.features) {
            Some(&c) => c,
            None => {
                let c = self.cells.len();
                self.cells.push(CellBucket { nodes: Vec::new() });
                self.cell_index.insert(eval.features, c);
                c
            }
        };
        self.cells[cell].nodes.push(id);
        self.tt.entry(hash).or_default().push(id);
    }

    /// Advance the cyclic cell cursor to the next cell offering a move and
    /// pick the cheapest (node, move) pair inside it.
    fn select(&mut self) -> Option<(u32, usize)> {
        let cell_count = self.cells.len();
        for step in 0..cell_count {
            let ci = (self.cursor + step) % cell_count;
            let mut best: Option<(u32, u32)> = None; // (offer, node id)
            for &id in &self.cells[ci].nodes {
                if let Some(offer) = self.nodes[id as usize].offer() {
                    // Strict less-than keeps FIFO order among equal offers.
                    if best.map_or(true, |(w, _)| offer < w) {
                        best = Some((offer, id));
                    }
                }
            }
            if let Some((_, id)) = best {
                self.cursor = (ci + 1) % cell_count;
                let move_idx = self.nodes[id as usize].first_offer_index();
                return Some((id, move_idx));
            }
        }
        None
    }

    /// Walk the parent chain and expand each macro move into its primitive
    /// pushes.
    fn reconstruct(&self, last_parent: u32, last_mv: MacroMove) -> Solution {
        let mut chain: Vec<(u32, MacroMove)> = vec![(last_parent, last_mv)];
        let mut at = last_parent;
        while let (Some(parent), Some(via)) =
            (self.nodes[at as usize].parent, self.nodes[at as usize].via)
        {
            chain.push((parent, via));
            at = parent;
        }
        chain.reverse();

        let mut macros: Vec<(crate::core::coord::Coord, crate::core::coord::Coord)> = Vec::new();
        let mut pushes: Vec<Push> = Vec::new();
        for (parent_id, mv) in chain {
            let before = &self.nodes[parent_id as usize].state;
            macros.push((self.board.coord_of(mv.from), self.board.coord_of(mv.to)));
            let steps = push_path(self.board, before, &mv)
                .expect("macro move on the solution path is legal");
            pushes.extend(steps.into_iter().map(|s| Push {
                from: self.board.coord_of(s.from),
                dir: s.dir,
            }));
        }

        Solution {
            macro_moves: macros,
            pushes,
        }
    }

    fn report(&mut self, outcome: SolveOutcome) -> SolveReport {
        let stats = self.tracker.finish(self.cells.len());
        SolveReport { outcome, stats }
    }
}
