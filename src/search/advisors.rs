//! The seven advisors.
//!
//! An advisor reads a state and the candidate macro moves and nominates at
//! most one move; nominated moves get weight 0, everything else weight 1.
//! The advisors run in a fixed order and the first to nominate a move claims
//! it (later advisors may agree, harmlessly). They are a closed set, so a
//! tagged enum with one dispatch function keeps the hot loop monomorphic and
//! exhaustively checkable.

use rustc_hash::FxHashMap;

use crate::analysis::distances::{pull_distance_map, INFINITE};
use crate::analysis::Analysis;
use crate::board::Board;
use crate::core::coord::Cell;
use crate::core::state::State;
use crate::search::features::{evaluate, FeaturePoint, StateEval};
use crate::search::movegen::MacroMove;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisor {
    /// Pack the next box in packing order.
    Packer,
    /// Reduce the number of floor components.
    ConnectivityOpener,
    /// Clear an obstructed room link.
    RoomOpener,
    /// Reduce the number of out-of-plan boxes.
    OutOfPlanReducer,
    /// Push away a box blocking another box's path to its target.
    HotspotResolver,
    /// Push a box that seals a region off from the player.
    Clearer,
    /// Last resort: any push that gains the player new cells.
    Forcer,
}

pub const ADVISOR_ORDER: [Advisor; 7] = [
    Advisor::Packer,
    Advisor::ConnectivityOpener,
    Advisor::RoomOpener,
    Advisor::OutOfPlanReducer,
    Advisor::HotspotResolver,
    Advisor::Clearer,
    Advisor::Forcer,
];

/// A macro move with its search weight (0 = advisor-nominated, 1 = plain).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedMove {
    pub mv: MacroMove,
    pub weight: u8,
}

/// Per-solve cache of sealed-cell distance maps for the hotspot tests. Box
/// constellations repeat heavily across the tree, so the maps are keyed by
/// `(sealed cell, target index)` alone.
#[derive(Default)]
pub struct HotspotCache {
    maps: FxHashMap<(Cell, usize), Vec<u32>>,
}

impl HotspotCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn dist_with_sealed(
        &mut self,
        board: &Board,
        sealed: Cell,
        target_index: usize,
        cell: Cell,
    ) -> u32 {
        let map = self.maps.entry((sealed, target_index)).or_insert_with(|| {
            let mut blocked = vec![false; board.cell_count()];
            blocked[sealed.index()] = true;
            pull_distance_map(board, board.targets()[target_index], &blocked)
        });
        map[cell.index()]
    }
}

/// Weight the candidate moves of one state. Returns the weighted list (same
/// order as `moves`) and the number of advisor nominations.
pub fn weight_moves(
    board: &Board,
    analysis: &Analysis,
    state: &State,
    eval: &StateEval,
    moves: &[MacroMove],
    hotspots: &mut HotspotCache,
) -> (Vec<WeightedMove>, u64) {
    let mut weights: Vec<WeightedMove> = moves
        .iter()
        .map(|&mv| WeightedMove { mv, weight: 1 })
        .collect();
    if moves.is_empty() {
        return (weights, 0);
    }

    let mut children = ChildFeatures::new(board, analysis, state, moves);
    let mut claims = 0u64;
    let mut any_nominated = false;

    for advisor in ADVISOR_ORDER {
        if advisor == Advisor::Forcer && any_nominated {
            // The forcer only fires when every other advisor declined.
            continue;
        }
        let pick = advise(
            advisor, board, analysis, state, eval, moves, &mut children, hotspots,
        );
        if let Some(i) = pick {
            any_nominated = true;
            if weights[i].weight != 0 {
                weights[i].weight = 0;
                claims += 1;
            }
        }
    }

    (weights, claims)
}

/// Lazily evaluated child feature tuples, shared by all advisors of one node.
struct ChildFeatures<'a> {
    board: &'a Board,
    analysis: &'a Analysis,
    state: &'a State,
    moves: &'a [MacroMove],
    cache: Vec<Option<FeaturePoint>>,
}

impl<'a> ChildFeatures<'a> {
    fn new(
        board: &'a Board,
        analysis: &'a Analysis,
        state: &'a State,
        moves: &'a [MacroMove],
    ) -> Self {
        Self {
            board,
            analysis,
            state,
            moves,
            cache: vec![None; moves.len()],
        }
    }

    fn child_state(&self, i: usize) -> State {
        let mv = self.moves[i];
        self.state.with_box_moved(mv.from, mv.to, mv.player_after)
    }

    fn get(&mut self, i: usize) -> FeaturePoint {
        if let Some(f) = self.cache[i] {
            return f;
        }
        let f = evaluate(self.board, self.analysis, &self.child_state(i)).features;
        self.cache[i] = Some(f);
        f
    }
}

#[allow(clippy::too_many_arguments)]
fn advise(
    advisor: Advisor,
    board: &Board,
    analysis: &Analysis,
    state: &State,
    eval: &StateEval,
    moves: &[MacroMove],
    children: &mut ChildFeatures<'_>,
    hotspots: &mut HotspotCache,
) -> Option<usize> {
    let here = eval.features;
    match advisor {
        Advisor::Packer => {
            let next = analysis.packing.next_target(state)?;
            // Prefer the move that fills the next target in order.
            if let Some(i) = moves.iter().position(|m| m.to == next) {
                if children.get(i).pack > here.pack {
                    return Some(i);
                }
            }
            (0..moves.len()).find(|&i| children.get(i).pack > here.pack)
        }

        Advisor::ConnectivityOpener => {
            (0..moves.len()).find(|&i| children.get(i).conn < here.conn)
        }

        Advisor::RoomOpener => {
            if here.room == 0 {
                return None;
            }
            (0..moves.len()).find(|&i| {
                analysis.rooms.is_link[moves[i].from.index()]
                    && children.get(i).room < here.room
            })
        }

        Advisor::OutOfPlanReducer => {
            if here.oop == 0 {
                return None;
            }
            (0..moves.len()).find(|&i| children.get(i).oop < here.oop)
        }

        Advisor::HotspotResolver => {
            // A hotspot blocks some other box's path to its nearest target.
            let blockers = hotspot_pairs(board, analysis, state, hotspots);
            if blockers.is_empty() {
                return None;
            }
            (0..moves.len()).find(|&i| {
                let mv = moves[i];
                blockers.iter().any(|&(h, b, ti)| {
                    h == mv.from
                        && hotspots.dist_with_sealed(board, mv.to, ti, b)
                            <= analysis.distances.dist(ti, b)
                })
            })
        }

        Advisor::Clearer => {
            // Push a box walling a region off from the player, provided the
            // opening actually lowers connectivity.
            let player_component = eval.component_of[state.player().index()];
            (0..moves.len()).find(|&i| {
                let mv = moves[i];
                if children.get(i).conn >= here.conn {
                    return false;
                }
                let child = children.child_state(i);
                let child_zone = board.player_zone(child.boxes(), mv.player_after);
                gained_component(board, eval, player_component, &child_zone, mv.from)
            })
        }

        Advisor::Forcer => (0..moves.len()).find(|&i| {
            let mv = moves[i];
            let child = children.child_state(i);
            let child_zone = board.player_zone(child.boxes(), mv.player_after);
            board.floor_cells().any(|c| {
                child_zone.contains(c) && c != mv.from && !eval.zone.contains(c)
            })
        }),
    }
}

/// True when the child zone reaches a cell that belonged to a component other
/// than the player's.
fn gained_component(
    board: &Board,
    eval: &StateEval,
    player_component: u16,
    child_zone: &crate::board::Zone,
    freed: Cell,
) -> bool {
    board.floor_cells().any(|c| {
        c != freed
            && child_zone.contains(c)
            && eval.component_of[c.index()] != player_component
            && eval.component_of[c.index()] != crate::search::features::NO_COMPONENT
    })
}

/// All `(hotspot, blocked box, target index)` triples of the current state:
/// sealing `hotspot`'s cell strictly worsens `blocked box`'s push distance to
/// its nearest reachable unfilled target.
fn hotspot_pairs(
    board: &Board,
    analysis: &Analysis,
    state: &State,
    hotspots: &mut HotspotCache,
) -> Vec<(Cell, Cell, usize)> {
    let mut pairs = Vec::new();
    for &b in state.boxes() {
        if board.is_target(b) {
            continue;
        }
        // Nearest unfilled target with a finite distance.
        let mut best: Option<(u32, usize)> = None;
        for (ti, &t) in board.targets().iter().enumerate() {
            if state.has_box(t) {
                continue;
            }
            let d = analysis.distances.dist(ti, b);
            if d == INFINITE {
                continue;
            }
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, ti));
            }
        }
        let Some((base, ti)) = best else {
            continue;
        };
        for &h in state.boxes() {
            if h == b {
                continue;
            }
            if hotspots.dist_with_sealed(board, h, ti, b) > base {
                pairs.push((h, b, ti));
            }
        }
    }
    pairs
}
