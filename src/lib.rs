//! # sokofess
//!
//! A Sokoban solving engine built around the FESS (feature space search)
//! algorithm of Shoham & Schaeffer: the search is guided through an abstract
//! four-dimensional feature space instead of the raw state space, with
//! domain-specific advisors nominating cheap moves.
//!
//! ## Architecture
//!
//! The codebase is structured as layered components:
//!
//! - [`core`]: allocation-light primitives (`Coord`, `Dir`, `Cell`, [`core::state::State`]).
//! - [`board`]: immutable puzzle geometry, ASCII level parsing, Zobrist tables.
//! - [`analysis`]: one-time per-board pre-analysis:
//!   - **dead squares** (retrograde pull flood),
//!   - **push-distance tables** (per target, ignoring other boxes),
//!   - **room decomposition** (rooms and their 1-wide tunnel links),
//!   - **packing order** (retrograde unpacking of the goal) with per-stage
//!     out-of-plan cell tables.
//! - [`deadlock`]: dynamic move classification (freeze / corral / bipartite).
//! - [`search`]: macro-move generation, feature projection, the seven
//!   advisors, resource budgets, and the FESS engine itself.
//! - [`solution`]: solution replay, LURD rendering, and JSON bundle export.
//!
//! ## Quick start (no heavy computation)
//!
//! ```no_run
//! use sokofess::{solve, SolveOptions, SolveOutcome};
//!
//! let level = "#####\n#@$.#\n#####";
//! let report = solve(level, &SolveOptions::default()).unwrap();
//! match report.outcome {
//!     SolveOutcome::Solved(solution) => println!("{} pushes", solution.pushes.len()),
//!     other => println!("{other:?}"),
//! }
//! ```
//!
//! For extension and design notes, see `DESIGN.md`.

pub mod analysis;
pub mod board;
pub mod core;
pub mod deadlock;
pub mod search;
pub mod solution;

pub use board::{Board, ParseError};
pub use search::fess::{solve, solve_board, solve_with, SolveOptions, SolveOutcome, SolveReport};
pub use search::limits::{LimitReason, NoProgress, ProgressLike, SearchStats};
pub use solution::{Push, Solution};
