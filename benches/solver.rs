//! Benchmarks for the FESS solving engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sokofess::analysis::analyze;
use sokofess::board::Board;
use sokofess::{solve, SolveOptions};

const SMALL: &str = "\
#######
#     #
# $$. #
# .@  #
#     #
#######";

const XSOKOBAN_1: &str = "\
    #####
    #   #
    #$  #
  ###  $##
  #  $ $ #
### # ## #   ######
#   # ## #####  ..#
# $  $          ..#
##### ### #@##  ..#
    #     #########
    #######";

/// Benchmark the complete solve of a small two-box level.
fn bench_solve_small(c: &mut Criterion) {
    let options = SolveOptions::default();
    c.bench_function("solve_small", |b| {
        b.iter(|| solve(black_box(SMALL), &options))
    });
}

/// Benchmark solving the classic XSokoban #1.
fn bench_solve_xsokoban_1(c: &mut Criterion) {
    let options = SolveOptions::default();
    let mut group = c.benchmark_group("xsokoban");
    group.sample_size(10);
    group.bench_function("solve_level_1", |b| {
        b.iter(|| solve(black_box(XSOKOBAN_1), &options))
    });
    group.finish();
}

/// Benchmark the one-time board pre-analysis alone.
fn bench_analyze(c: &mut Criterion) {
    let board = Board::load(XSOKOBAN_1).unwrap();
    c.bench_function("analyze_board", |b| b.iter(|| analyze(black_box(&board))));
}

criterion_group!(
    benches,
    bench_solve_small,
    bench_solve_xsokoban_1,
    bench_analyze
);
criterion_main!(benches);
