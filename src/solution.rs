//! Solutions: replay, LURD rendering, and JSON bundle export.
//!
//! A solution bundle is intended to be:
//! - **stable**: it stores the level text, seed, and limits alongside the
//!   moves, so a run can be replayed and audited later,
//! - **self-checking**: [`replay`] verifies every push against the board, and
//! - **human-friendly**: pushes render to conventional LURD text.

use std::fmt;
use std::fs;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::core::coord::{Cell, Coord, Dir, DIRS};
use crate::core::state::State;
use crate::search::fess::SolveOptions;
use crate::search::limits::SearchStats;

const FORMAT_VERSION: u32 = 1;

/// A single primitive push: the box on `from` moves one step in `dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Push {
    pub from: Coord,
    pub dir: Dir,
}

/// The solved move sequence, both compressed and primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Box displacements, one per macro move.
    pub macro_moves: Vec<(Coord, Coord)>,
    /// The full primitive push sequence.
    pub pushes: Vec<Push>,
}

impl Solution {
    pub fn empty() -> Solution {
        Solution {
            macro_moves: Vec::new(),
            pushes: Vec::new(),
        }
    }
}

/// Why a push sequence failed to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// No box on the push's source cell.
    MissingBox { index: usize },
    /// The destination is a wall, outside, or occupied.
    Blocked { index: usize },
    /// The player cannot reach the pushing side.
    PlayerCutOff { index: usize },
    /// A push coordinate is off the board.
    OffBoard { index: usize },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::MissingBox { index } => {
                write!(f, "push {index}: no box on the source cell")
            }
            ReplayError::Blocked { index } => {
                write!(f, "push {index}: destination blocked")
            }
            ReplayError::PlayerCutOff { index } => {
                write!(f, "push {index}: player cannot reach the pushing side")
            }
            ReplayError::OffBoard { index } => {
                write!(f, "push {index}: coordinate off the board")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

/// Apply `pushes` to the board's initial state, verifying legality of every
/// step. Returns the final state; callers check [`Board::is_goal`].
pub fn replay(board: &Board, pushes: &[Push]) -> Result<State, ReplayError> {
    let mut state = board.initial_state();
    for (index, push) in pushes.iter().enumerate() {
        state = apply_push(board, &state, push, index)?;
    }
    Ok(state)
}

fn apply_push(
    board: &Board,
    state: &State,
    push: &Push,
    index: usize,
) -> Result<State, ReplayError> {
    let from = board
        .cell_at(push.from)
        .ok_or(ReplayError::OffBoard { index })?;
    if !state.has_box(from) {
        return Err(ReplayError::MissingBox { index });
    }
    let dest = board
        .floor_neighbor(from, push.dir)
        .ok_or(ReplayError::Blocked { index })?;
    if state.has_box(dest) {
        return Err(ReplayError::Blocked { index });
    }
    let side = board
        .floor_neighbor(from, push.dir.opposite())
        .ok_or(ReplayError::PlayerCutOff { index })?;
    if state.has_box(side) {
        return Err(ReplayError::PlayerCutOff { index });
    }
    let zone = board.player_zone(state.boxes(), state.player());
    if !zone.contains(side) {
        return Err(ReplayError::PlayerCutOff { index });
    }
    Ok(state.with_box_moved(from, dest, from))
}

/// Render a push sequence as LURD text: lowercase player steps, uppercase
/// pushes. The player walk between pushes is reconstructed with a BFS over
/// the fixed direction order, so the text is deterministic.
pub fn to_lurd(board: &Board, pushes: &[Push]) -> Result<String, ReplayError> {
    let mut out = String::new();
    let mut state = board.initial_state();
    for (index, push) in pushes.iter().enumerate() {
        let from = board
            .cell_at(push.from)
            .ok_or(ReplayError::OffBoard { index })?;
        let side = board
            .floor_neighbor(from, push.dir.opposite())
            .ok_or(ReplayError::PlayerCutOff { index })?;
        let walk = walk_path(board, &state, state.player(), side)
            .ok_or(ReplayError::PlayerCutOff { index })?;
        for dir in walk {
            out.push(dir.walk_letter());
        }
        out.push(push.dir.push_letter());
        state = apply_push(board, &state, push, index)?;
    }
    Ok(out)
}

/// Shortest player walk from `from` to `to` in `state`, as directions.
fn walk_path(board: &Board, state: &State, from: Cell, to: Cell) -> Option<Vec<Dir>> {
    if from == to {
        return Some(Vec::new());
    }
    let mut came: Vec<Option<Dir>> = vec![None; board.cell_count()];
    let mut queue = std::collections::VecDeque::new();
    let mut seen = vec![false; board.cell_count()];
    seen[from.index()] = true;
    queue.push_back(from);
    while let Some(c) = queue.pop_front() {
        for dir in DIRS {
            let Some(nc) = board.floor_neighbor(c, dir) else {
                continue;
            };
            if seen[nc.index()] || state.has_box(nc) {
                continue;
            }
            seen[nc.index()] = true;
            came[nc.index()] = Some(dir);
            if nc == to {
                // Walk back to the start.
                let mut dirs = Vec::new();
                let mut cur = nc;
                while cur != from {
                    let dir = came[cur.index()].expect("came entry set when visited");
                    dirs.push(dir);
                    cur = board
                        .neighbor(cur, dir.opposite())
                        .expect("walked cells stay on the board");
                }
                dirs.reverse();
                return Some(dirs);
            }
            queue.push_back(nc);
        }
    }
    None
}

/// Why a bundle failed to read or write.
#[derive(Debug)]
pub enum BundleError {
    Io { path: String, error: String },
    Format { reason: String },
    Version { found: u32 },
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleError::Io { path, error } => write!(f, "io error for {path}: {error}"),
            BundleError::Format { reason } => write!(f, "malformed bundle: {reason}"),
            BundleError::Version { found } => write!(
                f,
                "unsupported bundle format_version {found} (expected {FORMAT_VERSION})"
            ),
        }
    }
}

impl std::error::Error for BundleError {}

/// The JSON manifest of one solved run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionManifest {
    pub format_version: u32,
    pub created_unix_secs: u64,
    pub level: String,
    pub seed: u64,
    pub limits: LimitsManifest,
    pub macro_moves: Vec<MacroMoveManifest>,
    pub pushes: Vec<PushManifest>,
    pub stats: StatsManifest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsManifest {
    pub max_nodes: u64,
    pub max_millis: u64,
    pub corral_check: bool,
    pub bipartite_check: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroMoveManifest {
    pub from: [i32; 2],
    pub to: [i32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushManifest {
    pub x: i32,
    pub y: i32,
    pub dir: char,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsManifest {
    pub nodes_expanded: u64,
    pub nodes_generated: u64,
    pub dead_square_pruned: u64,
    pub freeze_pruned: u64,
    pub corral_pruned: u64,
    pub bipartite_pruned: u64,
    pub duplicates_pruned: u64,
    pub advisor_claims: u64,
    pub feature_cells: u64,
    pub wall_ms: u64,
}

/// Assemble the manifest for a solved run.
pub fn manifest(
    level: &str,
    options: &SolveOptions,
    solution: &Solution,
    stats: &SearchStats,
) -> SolutionManifest {
    let created_unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    SolutionManifest {
        format_version: FORMAT_VERSION,
        created_unix_secs,
        level: level.to_string(),
        seed: options.zobrist_seed,
        limits: LimitsManifest {
            max_nodes: options.max_nodes,
            max_millis: options.max_millis,
            corral_check: options.enable_corral_check,
            bipartite_check: options.enable_bipartite_check,
        },
        macro_moves: solution
            .macro_moves
            .iter()
            .map(|&(from, to)| MacroMoveManifest {
                from: [from.x, from.y],
                to: [to.x, to.y],
            })
            .collect(),
        pushes: solution
            .pushes
            .iter()
            .map(|p| PushManifest {
                x: p.from.x,
                y: p.from.y,
                dir: p.dir.push_letter(),
            })
            .collect(),
        stats: StatsManifest {
            nodes_expanded: stats.nodes_expanded,
            nodes_generated: stats.nodes_generated,
            dead_square_pruned: stats.dead_square_pruned,
            freeze_pruned: stats.freeze_pruned,
            corral_pruned: stats.corral_pruned,
            bipartite_pruned: stats.bipartite_pruned,
            duplicates_pruned: stats.duplicates_pruned,
            advisor_claims: stats.advisor_claims,
            feature_cells: stats.feature_cells,
            wall_ms: stats.wall_ms,
        },
    }
}

/// Extract the push sequence back out of a manifest.
pub fn pushes_from_manifest(manifest: &SolutionManifest) -> Result<Vec<Push>, BundleError> {
    manifest
        .pushes
        .iter()
        .map(|p| {
            let dir = Dir::from_letter(p.dir).ok_or_else(|| BundleError::Format {
                reason: format!("unknown push direction {:?}", p.dir),
            })?;
            Ok(Push {
                from: Coord::new(p.x, p.y),
                dir,
            })
        })
        .collect()
}

pub fn write_bundle(path: &Path, manifest: &SolutionManifest) -> Result<(), BundleError> {
    let io_err = |e: &dyn fmt::Display| BundleError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    };
    let file = fs::File::create(path).map_err(|e| io_err(&e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, manifest).map_err(|e| io_err(&e))?;
    writer.flush().map_err(|e| io_err(&e))
}

pub fn read_bundle(path: &Path) -> Result<SolutionManifest, BundleError> {
    let io_err = |e: &dyn fmt::Display| BundleError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    };
    let file = fs::File::open(path).map_err(|e| io_err(&e))?;
    let reader = BufReader::new(file);
    let manifest: SolutionManifest =
        serde_json::from_reader(reader).map_err(|e| BundleError::Format {
            reason: e.to_string(),
        })?;
    if manifest.format_version != FORMAT_VERSION {
        return Err(BundleError::Version {
            found: manifest.format_version,
        });
    }
    Ok(manifest)
}
